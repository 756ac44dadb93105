//! # scanvault Status API
//!
//! Read-only HTTP view of a running worker, served with axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Worker state, counters and staging backlog

mod handlers;
mod types;

pub use handlers::{health_handler, status_handler};
pub use types::{HealthResponse, StatusResponse};

use crate::config::Config;
use crate::worker::SharedStats;
use axum::{Router, routing::get};
use scanvault_core::{PipelinePaths, ScanVaultError};
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    /// Counters written by the worker.
    pub stats: SharedStats,
    pub paths: PipelinePaths,
    pub poll_interval_secs: u64,
    pub content_hash_dedup: bool,
}

impl AppState {
    /// Create state for the worker running with `config`.
    #[must_use]
    pub fn new(config: &Config, stats: SharedStats) -> Self {
        Self {
            stats,
            paths: config.paths(),
            poll_interval_secs: config.poll_interval_secs,
            content_hash_dedup: config.content_hash_dedup,
        }
    }
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Serve the status API until `shutdown` flips to true.
pub async fn run_server(
    addr: &str,
    state: AppState,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), ScanVaultError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ScanVaultError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("status endpoint listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            while !*shutdown.borrow() {
                if shutdown.changed().await.is_err() {
                    break;
                }
            }
        })
        .await
        .map_err(|e| ScanVaultError::Io(format!("Server error: {}", e)))
}
