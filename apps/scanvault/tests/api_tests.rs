//! Integration tests for the scanvault status API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

#![allow(clippy::unwrap_used, clippy::panic)]

use axum_test::TestServer;
use scanvault::api::{AppState, HealthResponse, create_router};
use scanvault::{Config, SharedStats, WorkerState};
use tempfile::TempDir;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn config_in(temp: &TempDir) -> Config {
    Config {
        data_dir: temp.path().to_path_buf(),
        ..Config::default()
    }
}

fn create_test_server(config: &Config, stats: SharedStats) -> TestServer {
    let state = AppState::new(config, stats);
    TestServer::new(create_router(state)).unwrap()
}

// =============================================================================
// HEALTH ENDPOINT
// =============================================================================

#[tokio::test]
async fn health_returns_ok() {
    let temp = tempfile::tempdir().unwrap();
    let server = create_test_server(&config_in(&temp), SharedStats::default());

    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: HealthResponse = response.json();
    assert_eq!(body.status, "ok");
    assert_eq!(body.version, env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// STATUS ENDPOINT
// =============================================================================

#[tokio::test]
async fn status_reports_idle_worker() {
    let temp = tempfile::tempdir().unwrap();
    let server = create_test_server(&config_in(&temp), SharedStats::default());

    let response = server.get("/status").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["worker"]["state"], "idle");
    assert_eq!(body["worker"]["cycles"], 0);
    assert_eq!(body["worker"]["last_error"], serde_json::Value::Null);
    assert_eq!(body["staged_lines"], 0);
    assert_eq!(body["poll_interval_secs"], 5);
    assert_eq!(body["content_hash_dedup"], false);
}

#[tokio::test]
async fn status_reflects_shared_stats() {
    let temp = tempfile::tempdir().unwrap();
    let stats = SharedStats::default();
    {
        let mut s = stats.write().await;
        s.state = WorkerState::Consolidating;
        s.cycles = 3;
        s.rows_appended = 7;
        s.last_error = Some("Storage error: disk full".to_string());
    }
    let server = create_test_server(&config_in(&temp), stats);

    let body: serde_json::Value = server.get("/status").await.json();
    assert_eq!(body["worker"]["state"], "consolidating");
    assert_eq!(body["worker"]["cycles"], 3);
    assert_eq!(body["worker"]["rows_appended"], 7);
    assert_eq!(body["worker"]["last_error"], "Storage error: disk full");
}

#[tokio::test]
async fn status_counts_staged_lines() {
    let temp = tempfile::tempdir().unwrap();
    let config = config_in(&temp);
    std::fs::write(
        config.paths().staging_log,
        "'A'B'123456'C\n\n'A'B'654321'C\n",
    )
    .unwrap();
    let server = create_test_server(&config, SharedStats::default());

    let body: serde_json::Value = server.get("/status").await.json();
    assert_eq!(body["staged_lines"], 2);
    assert!(
        body["staging_log"]
            .as_str()
            .unwrap()
            .ends_with("scanned.txt")
    );
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let temp = tempfile::tempdir().unwrap();
    let server = create_test_server(&config_in(&temp), SharedStats::default());

    let response = server.get("/signal").await;
    response.assert_status_not_found();
}
