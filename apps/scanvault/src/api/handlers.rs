//! # API Endpoint Handlers

use super::{
    AppState,
    types::{HealthResponse, StatusResponse},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use scanvault_core::files::read_lines;

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Worker counters plus the current staging backlog.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let worker = state.stats.read().await.clone();

    let staged_lines = match read_lines(&state.paths.staging_log) {
        Ok(lines) => lines.iter().filter(|l| !l.trim().is_empty()).count(),
        Err(e) => {
            tracing::warn!(error = %e, "cannot read staging log for status");
            0
        }
    };

    let response = StatusResponse {
        worker,
        staging_log: state.paths.staging_log.display().to_string(),
        table: state.paths.table.display().to_string(),
        staged_lines,
        poll_interval_secs: state.poll_interval_secs,
        content_hash_dedup: state.content_hash_dedup,
    };

    (StatusCode::OK, Json(response))
}
