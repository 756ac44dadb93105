//! # API Response Types
//!
//! JSON bodies of the status endpoint.

use crate::worker::WorkerStats;
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Worker status response.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub worker: WorkerStats,
    pub staging_log: String,
    pub table: String,
    /// Non-blank lines waiting in the staging log.
    pub staged_lines: usize,
    pub poll_interval_secs: u64,
    pub content_hash_dedup: bool,
}
