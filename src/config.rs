//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `host.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - ServerConfig: where the http server listens.
//!     - HistoryConfig: how many past readings are kept in memory.
//!     - DashboardConfig: page title and browser refresh interval.
//!     - LoggingConfig: log level and whether accepted uploads are logged.
//!
//! every field has a default, so a partial file is fine.
//!
//! ==============================================================================

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::store::DEFAULT_HISTORY_CAPACITY;

/// environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "TELEMETRY_CONFIG";

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct HostConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_address: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HistoryConfig {
    pub capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub title: String,
    pub refresh_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_readings: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { listen_address: "0.0.0.0".to_string(), port: 8000 }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { capacity: DEFAULT_HISTORY_CAPACITY }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self { title: "PhytoLink Monitor".to_string(), refresh_seconds: 5 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), log_readings: true }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.listen_address, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.listen_address, self.port))
    }
}

impl HostConfig {
    /// parse one toml file; missing keys take their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Load with default fallback
    ///
    /// `$TELEMETRY_CONFIG` is tried first, then `config/host.toml` and
    /// `../config/host.toml`.
    pub fn load_or_default() -> Self {
        let mut paths: Vec<PathBuf> = Vec::new();
        if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
            paths.push(PathBuf::from(explicit));
        }
        paths.push(PathBuf::from("config").join("host.toml"));
        paths.push(PathBuf::from("..").join("config").join("host.toml"));

        Self::load_first(&paths)
    }

    fn load_first(paths: &[PathBuf]) -> Self {
        for path in paths {
            if path.exists() {
                match Self::load(path) {
                    Ok(config) => {
                        tracing::info!("[CONFIG] Loaded from {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("[CONFIG] Failed to load {}: {:#}", path.display(), e);
                    }
                }
            }
        }

        tracing::warn!("[CONFIG] No config file found - using defaults");
        Self::default()
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("┌─────────────────────────────────────────┐");
        println!("│           HOST CONFIGURATION            │");
        println!("├─────────────────────────────────────────┤");
        println!("│ Listen: {}:{}", self.server.listen_address, self.server.port);
        println!("│ History Capacity: {}", self.history.capacity);
        println!("│ Dashboard Refresh: {}s", self.dashboard.refresh_seconds);
        println!("│ Log Level: {}", self.logging.level);
        println!("└─────────────────────────────────────────┘");
    }
}
