//! ==============================================================================
//! server.rs - http surface
//! ==============================================================================
//!
//! routes:
//!     GET /             -> rendered dashboard (dashboard.rs)
//!     GET /upload       -> device ingestion, ?temp=..&humi=..&light=..
//!                          "OK" (200) or "Error: <message>" (400)
//!     GET /get_data     -> latest reading as json
//!     GET /get_history  -> bounded history as json array, oldest first
//!
//! every handler gets the same TelemetryStore handle through axum State.
//!
//! ==============================================================================

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{
    extract::{RawQuery, State},
    response::{Html, Json},
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::HostConfig;
use crate::dashboard;
use crate::domain::{LatestState, Reading, UploadParams};
use crate::error::IngestError;
use crate::store::TelemetryStore;

/// everything a handler needs; cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub store: TelemetryStore,
    pub title: String,
    pub refresh_seconds: u64,
    pub log_readings: bool,
}

impl AppState {
    pub fn new(store: TelemetryStore, config: &HostConfig) -> Self {
        Self {
            store,
            title: config.dashboard.title.clone(),
            refresh_seconds: config.dashboard.refresh_seconds,
            log_readings: config.logging.log_readings,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard_handler))
        .route("/upload", get(upload_handler))
        .route("/get_data", get(latest_handler))
        .route("/get_history", get(history_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// serve until ctrl+c
pub async fn run(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Dashboard live at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("web server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to wait for Ctrl+C signal: {}", e);
        return;
    }
    tracing::info!("Shutting down");
}

async fn upload_handler(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<&'static str, IngestError> {
    let result = match UploadParams::from_query(query.as_deref()) {
        Ok(params) => state.store.ingest(&params).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(r) => {
            if state.log_readings {
                tracing::info!(
                    "[UPLOAD] Temp: {:.1}°C | Humidity: {:.1}% | Light: {} lux",
                    r.temperature,
                    r.humidity,
                    r.light
                );
            }
            Ok("OK")
        }
        Err(e) => {
            tracing::warn!(field = e.field(), "[UPLOAD] Rejected: {}", e);
            Err(e)
        }
    }
}

async fn latest_handler(State(state): State<AppState>) -> Json<LatestState> {
    Json(state.store.latest().await)
}

async fn history_handler(State(state): State<AppState>) -> Json<Vec<Reading>> {
    Json(state.store.history().await)
}

async fn dashboard_handler(State(state): State<AppState>) -> Html<String> {
    let (latest, history) = state.store.snapshot().await;
    Html(dashboard::render_page(
        &state.title,
        state.refresh_seconds,
        &latest,
        &history,
        dashboard::daytime_now(),
    ))
}
