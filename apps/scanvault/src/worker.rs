//! # Worker
//!
//! The polling loop around the synchronous consolidation cycle.
//!
//! ```text
//!   Idle ──tick──▶ Consolidating ──done / failed──▶ Idle ──sleep──▶ ...
//! ```
//!
//! - One cycle at a time, run to completion on the blocking pool so file and
//!   table I/O never stalls the runtime threads the status endpoint uses
//! - Stop requests are honoured between cycles and during the sleep
//! - A failed cycle (or a failed startup) is logged and retried next tick

use crate::config::Config;
use scanvault_core::{Consolidator, CycleReport, HashPolicy, PipelinePaths, ScanVaultError};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, watch};

/// The two states of the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    #[default]
    Idle,
    Consolidating,
}

/// Counters exposed by the status endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    pub state: WorkerState,
    /// Whether the artifacts are open.
    pub initialized: bool,
    /// Ticks that completed, idle ones included.
    pub cycles: u64,
    /// Ticks that claimed a batch.
    pub batches: u64,
    pub failed_cycles: u64,
    pub rows_appended: u64,
    pub invalid_records: u64,
    pub duplicates: u64,
    pub last_error: Option<String>,
}

/// Stats shared between the worker and the status endpoint.
pub type SharedStats = Arc<RwLock<WorkerStats>>;

/// Drives the consolidator on a fixed interval.
#[derive(Debug)]
pub struct Worker {
    paths: PipelinePaths,
    policy: HashPolicy,
    interval: Duration,
    consolidator: Option<Consolidator>,
    stats: SharedStats,
}

impl Worker {
    /// Create a worker; the artifacts are opened on the first tick.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            paths: config.paths(),
            policy: config.hash_policy(),
            interval: config.poll_interval(),
            consolidator: None,
            stats: SharedStats::default(),
        }
    }

    /// Create a worker around an already opened consolidator.
    #[must_use]
    pub fn with_consolidator(config: &Config, consolidator: Consolidator) -> Self {
        Self {
            consolidator: Some(consolidator),
            ..Self::new(config)
        }
    }

    /// Handle on the shared stats.
    #[must_use]
    pub fn stats(&self) -> SharedStats {
        Arc::clone(&self.stats)
    }

    /// Delay between two cycles.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one cycle: Idle to Consolidating and back.
    pub async fn tick(&mut self) -> Result<CycleReport, ScanVaultError> {
        self.stats.write().await.state = WorkerState::Consolidating;

        let result = self.consolidate().await;
        match &result {
            Ok(report) => log_report(report),
            Err(e) => tracing::error!(error = %e, "consolidation cycle failed"),
        }

        self.record(&result).await;
        result
    }

    /// Poll until `shutdown` flips to true or its sender goes away.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            staging_log = %self.paths.staging_log.display(),
            table = %self.paths.table.display(),
            interval_secs = self.interval.as_secs(),
            policy = ?self.policy,
            "worker started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            // Errors are already logged and counted.
            let _ = self.tick().await;

            tokio::select! {
                () = tokio::time::sleep(self.interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!("worker stopped");
    }

    /// Open the pipeline if needed and run one cycle on the blocking pool.
    ///
    /// The consolidator moves into the blocking task and comes back with the
    /// result. If the task panics it is lost and reopened on the next tick.
    async fn consolidate(&mut self) -> Result<CycleReport, ScanVaultError> {
        let current = self.consolidator.take();
        let paths = self.paths.clone();
        let policy = self.policy;

        let (consolidator, result) = tokio::task::spawn_blocking(move || {
            let mut consolidator = match current {
                Some(consolidator) => consolidator,
                None => match Consolidator::open(&paths, policy) {
                    Ok(consolidator) => {
                        tracing::info!(
                            known_hashes = consolidator.dedup().hash_count(),
                            "pipeline initialised"
                        );
                        consolidator
                    }
                    Err(e) => return (None, Err(e)),
                },
            };
            let result = consolidator.run_cycle();
            (Some(consolidator), result)
        })
        .await
        .map_err(|e| ScanVaultError::Io(format!("Consolidation task failed: {}", e)))?;

        self.consolidator = consolidator;
        result
    }

    async fn record(&self, result: &Result<CycleReport, ScanVaultError>) {
        let mut stats = self.stats.write().await;
        stats.state = WorkerState::Idle;
        stats.initialized = self.consolidator.is_some();

        match result {
            Ok(report) => {
                stats.cycles += 1;
                if report.claimed {
                    stats.batches += 1;
                }
                stats.rows_appended += report.appended.len() as u64;
                stats.invalid_records += report.invalid.len() as u64;
                stats.duplicates += report.duplicates.len() as u64;
            }
            Err(e) => {
                stats.failed_cycles += 1;
                stats.last_error = Some(e.to_string());
            }
        }
    }
}

/// Log the outcome of one cycle.
pub fn log_report(report: &CycleReport) {
    if report.is_idle() {
        tracing::debug!("staging log empty");
        return;
    }

    if report.already_committed {
        tracing::warn!("released a batch that an unfinished cycle had already saved");
        return;
    }
    if report.recovered {
        tracing::warn!("replaying a batch left by an unfinished cycle");
    }
    for invalid in &report.invalid {
        tracing::warn!(line = %invalid.line, reason = %invalid.reason, "invalid record skipped");
    }
    for duplicate in &report.duplicates {
        tracing::info!(
            identity = %duplicate.identity,
            reason = %duplicate.reason,
            "duplicate record skipped"
        );
    }
    for failure in &report.log_failures {
        tracing::error!(error = %failure, "log write failed");
    }

    tracing::info!(
        lines = report.lines_read,
        appended = report.appended.len(),
        invalid = report.invalid.len(),
        duplicates = report.duplicates.len(),
        saved = report.saved,
        "batch consolidated"
    );
}
