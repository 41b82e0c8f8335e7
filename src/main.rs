//! ==============================================================================
//! main.rs - telemetry host entry point
//! ==============================================================================
//!
//! purpose:
//!     a small hub for one sensor board. the board (temperature, humidity and
//!     light sensors) calls `GET /upload` every few seconds; a browser opens
//!     the dashboard or polls the json api.
//!
//! responsibilities:
//!     - load configuration (config.rs)
//!     - initialize logging
//!     - create the shared telemetry store (store.rs)
//!     - serve the http api and dashboard until ctrl+c (server.rs)
//!
//! architecture:
//!
//!     ┌──────────────┐  GET /upload   ┌─────────────────────────────────┐
//!     │ sensor board │ ─────────────> │          rust host              │
//!     └──────────────┘                │  ┌───────────┐   ┌───────────┐  │
//!                                     │  │ handlers  │──>│   store   │  │
//!     ┌──────────────┐  GET /, /get_* │  │ (axum)    │<──│ latest +  │  │
//!     │   browser    │ <────────────> │  └───────────┘   │ history   │  │
//!     └──────────────┘                │                  └───────────┘  │
//!                                     └─────────────────────────────────┘
//!
//! ==============================================================================

mod config;
mod dashboard;
mod domain;
mod error;
mod server;
mod store;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // startup banner
    println!("===========================================================");
    println!("  Telemetry Host");
    println!("  sensor uploads in, dashboard out");
    println!("===========================================================");

    // step 1: load configuration
    // the real subscriber depends on the config, so this phase logs
    // through a temporary one
    let bootstrap = tracing_subscriber::fmt().finish();
    let config = tracing::subscriber::with_default(bootstrap, config::HostConfig::load_or_default);
    config.print_summary();

    // step 2: logging (RUST_LOG wins over logging.level)
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // step 3: shared state
    let store = store::TelemetryStore::new(config.history.capacity);
    tracing::info!("[STARTUP] Keeping the last {} readings", store.capacity());

    // step 4: serve
    let addr = config.server.socket_addr()?;
    let state = server::AppState::new(store, &config);
    if let Err(e) = server::run(addr, state).await {
        tracing::error!("[ERROR] Fatal: {:#}", e);
        return Err(e);
    }

    Ok(())
}
