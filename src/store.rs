//! ==============================================================================
//! store.rs - in-memory telemetry store
//! ==============================================================================
//!
//! purpose:
//!     holds the latest reading and a bounded history of past readings.
//!     the device writes through `ingest`, the dashboard and api read through
//!     `latest` / `history`. nothing is persisted; a restart starts empty.
//!
//! relationships:
//!     - used by: server.rs (every handler gets a clone via axum State)
//!     - uses: domain.rs (Reading, LatestState, UploadParams)
//!
//! locking:
//!     one tokio RwLock guards BOTH the latest slot and the history ring.
//!     - ingest takes the write guard once and updates both together
//!     - readers take the read guard and clone out a snapshot
//!     so a reader can never see a history entry without the matching
//!     latest value, and two uploads can never interleave an eviction.
//!
//! ==============================================================================

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::RwLock;

use crate::domain::{LatestState, Reading, Sample, UploadParams};
use crate::error::IngestError;

/// history length used when the config does not say otherwise
pub const DEFAULT_HISTORY_CAPACITY: usize = 15;

#[derive(Debug)]
struct Inner {
    latest: LatestState,
    history: VecDeque<Reading>,
}

/// cloneable handle to the shared store
#[derive(Clone, Debug)]
pub struct TelemetryStore {
    capacity: usize,
    inner: Arc<RwLock<Inner>>,
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl TelemetryStore {
    /// create an empty store keeping at most `capacity` readings (min 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: Arc::new(RwLock::new(Inner {
                latest: LatestState::default(),
                history: VecDeque::with_capacity(capacity),
            })),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// validate an upload and record it with the current wall-clock time
    ///
    /// all fields are parsed before the lock is taken, so a rejected upload
    /// leaves both the latest slot and the history untouched.
    pub async fn ingest(&self, params: &UploadParams) -> Result<Reading, IngestError> {
        let sample = params.parse()?;
        Ok(self.record(sample, now_seconds).await)
    }

    /// record an already validated sample under an explicit timestamp
    pub async fn ingest_at(&self, sample: Sample, timestamp: f64) -> Reading {
        self.record(sample, || timestamp).await
    }

    // the clock is read under the write guard so history stays in time order
    async fn record(&self, sample: Sample, clock: impl FnOnce() -> f64) -> Reading {
        let mut inner = self.inner.write().await;
        let reading = sample.at(clock());

        inner.latest = LatestState::from(reading);
        if inner.history.len() == self.capacity {
            inner.history.pop_front();
        }
        inner.history.push_back(reading);

        reading
    }

    /// snapshot of the latest slot (zeroed before the first upload)
    pub async fn latest(&self) -> LatestState {
        self.inner.read().await.latest
    }

    /// snapshot of the history, oldest first
    pub async fn history(&self) -> Vec<Reading> {
        self.inner.read().await.history.iter().copied().collect()
    }

    /// latest slot and history taken under one guard
    pub async fn snapshot(&self) -> (LatestState, Vec<Reading>) {
        let inner = self.inner.read().await;
        (inner.latest, inner.history.iter().copied().collect())
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.read().await.history.len()
    }
}

/// seconds since the unix epoch as a float
pub fn now_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
