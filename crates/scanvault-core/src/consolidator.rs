//! # Consolidator Module
//!
//! One consolidation cycle: staging log in, table rows out.
//!
//! 1. Claim the staged batch (nothing staged: nothing to do)
//! 2. Load the table; a replayed batch that is already committed is released
//!    untouched
//! 3. Rebuild the identity set, parse, admit, and collect surviving records
//! 4. Append the survivors and save the table once, stamped with the batch
//!    fingerprint
//! 5. Write the duplicate notices, then release the claimed batch
//!
//! Notices are written only after the save commits, so a failed save that is
//! retried does not log the same duplicate twice.
//!
//! The cycle is synchronous and never panics. Per-record problems end up in
//! the returned [`CycleReport`]; a failure of the table store aborts the cycle
//! with the claimed batch kept for the next one.

use crate::appender::TableAppender;
use crate::dedup::{Admission, DedupEngine, HashPolicy, RejectReason};
use crate::error_log::ErrorLog;
use crate::files::read_lines;
use crate::hash_log::HashLog;
use crate::parser::{ParseOutcome, Parser};
use crate::primitives::{ERROR_LOG_FILE, HASH_LOG_FILE, STAGING_LOG_FILE, TABLE_FILE};
use crate::staging::StagingLog;
use crate::storage::{RedbSheetStore, SheetStore, Worksheet};
use crate::{IdentityKey, ParsedRecord, ScanVaultError};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Locations of the four pipeline artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePaths {
    /// Staging log producers append to.
    pub staging_log: PathBuf,
    /// Table database.
    pub table: PathBuf,
    /// Persisted hash log.
    pub hash_log: PathBuf,
    /// Error log.
    pub error_log: PathBuf,
}

impl PipelinePaths {
    /// Default artifact names inside one data directory.
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            staging_log: dir.join(STAGING_LOG_FILE),
            table: dir.join(TABLE_FILE),
            hash_log: dir.join(HASH_LOG_FILE),
            error_log: dir.join(ERROR_LOG_FILE),
        }
    }
}

/// A record written to the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppendedRow {
    pub identity: IdentityKey,
    pub row: u32,
}

/// A staged line that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidLine {
    pub line: String,
    pub reason: String,
}

/// A parsed record that was not admitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRecord {
    pub identity: IdentityKey,
    pub reason: RejectReason,
}

/// Outcome of one consolidation cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Whether a batch was claimed at all.
    pub claimed: bool,
    /// Whether the batch was left over from an earlier, unfinished cycle.
    pub recovered: bool,
    /// Whether that leftover batch had already been saved and was only
    /// released.
    pub already_committed: bool,
    /// Number of lines in the batch, blank ones included.
    pub lines_read: usize,
    /// Rows written, in batch order.
    pub appended: Vec<AppendedRow>,
    /// Lines dropped by the parser.
    pub invalid: Vec<InvalidLine>,
    /// Records dropped by duplicate detection.
    pub duplicates: Vec<RejectedRecord>,
    /// Error-log or hash-log writes that failed; the batch went on.
    pub log_failures: Vec<String>,
    /// Whether the table was saved.
    pub saved: bool,
}

impl CycleReport {
    /// True when there was nothing staged.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        !self.claimed
    }
}

/// Read-only view of the pipeline state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineStatus {
    pub has_header: bool,
    pub data_rows: usize,
    pub known_identities: usize,
    pub known_hashes: usize,
    pub staged_lines: usize,
    pub claimed_batch_pending: bool,
    pub hash_policy: String,
}

impl PipelineStatus {
    /// Read the artifacts under `paths` without opening a consolidator.
    ///
    /// Nothing is created; missing artifacts read as empty. The table is
    /// locked by a running worker, so this fails while one is active.
    pub fn inspect(paths: &PipelinePaths, policy: HashPolicy) -> Result<Self, ScanVaultError> {
        let sheet = RedbSheetStore::read_existing(&paths.table)?;
        let mut hashes = TableAppender::row_hashes(&sheet);
        hashes.extend(HashLog::read(&paths.hash_log)?);
        let claimed = StagingLog::claimed_path_for(&paths.staging_log)?;

        Ok(Self::assemble(
            &sheet,
            hashes.len(),
            &read_lines(&paths.staging_log)?,
            claimed.is_file(),
            policy,
        ))
    }

    fn assemble(
        sheet: &Worksheet,
        known_hashes: usize,
        staged: &[String],
        claimed_batch_pending: bool,
        policy: HashPolicy,
    ) -> Self {
        Self {
            has_header: TableAppender::has_header(sheet),
            data_rows: TableAppender::data_rows(sheet).len(),
            known_identities: TableAppender::identity_keys(sheet).len(),
            known_hashes,
            staged_lines: staged.iter().filter(|l| !l.trim().is_empty()).count(),
            claimed_batch_pending,
            hash_policy: match policy {
                HashPolicy::SeedOnly => "seed_only".to_string(),
                HashPolicy::RejectKnownContent => "reject_known_content".to_string(),
            },
        }
    }
}

/// Drains the staging log into the table.
pub struct Consolidator {
    staging: StagingLog,
    store: Box<dyn SheetStore>,
    dedup: DedupEngine,
    error_log: ErrorLog,
    hash_log: HashLog,
}

impl std::fmt::Debug for Consolidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Consolidator")
            .field("staging", &self.staging)
            .field("dedup", &self.dedup)
            .field("error_log", &self.error_log)
            .field("hash_log", &self.hash_log)
            .finish_non_exhaustive()
    }
}

impl Consolidator {
    /// Open every artifact under `paths` (creating missing ones) and preload
    /// the duplicate sets.
    pub fn open(paths: &PipelinePaths, policy: HashPolicy) -> Result<Self, ScanVaultError> {
        let staging = StagingLog::open(&paths.staging_log)?;
        let store = RedbSheetStore::open(&paths.table)?;
        let error_log = ErrorLog::open(&paths.error_log)?;
        let hash_log = HashLog::open(&paths.hash_log)?;
        Self::new(staging, Box::new(store), error_log, hash_log, policy)
    }

    /// Assemble a consolidator from already opened parts.
    pub fn new(
        staging: StagingLog,
        store: Box<dyn SheetStore>,
        error_log: ErrorLog,
        hash_log: HashLog,
        policy: HashPolicy,
    ) -> Result<Self, ScanVaultError> {
        let sheet = store.load()?;
        let dedup = DedupEngine::preload(policy, &sheet, &hash_log)?;
        Ok(Self {
            staging,
            store,
            dedup,
            error_log,
            hash_log,
        })
    }

    /// The staging log this consolidator drains.
    #[must_use]
    pub fn staging(&self) -> &StagingLog {
        &self.staging
    }

    /// The duplicate detector.
    #[must_use]
    pub fn dedup(&self) -> &DedupEngine {
        &self.dedup
    }

    /// Load the current durable table.
    pub fn load_sheet(&self) -> Result<Worksheet, ScanVaultError> {
        self.store.load()
    }

    /// Run one consolidation cycle.
    pub fn run_cycle(&mut self) -> Result<CycleReport, ScanVaultError> {
        let Some(batch) = self.staging.claim()? else {
            return Ok(CycleReport::default());
        };

        let mut report = CycleReport {
            claimed: true,
            recovered: batch.recovered,
            lines_read: batch.lines.len(),
            ..CycleReport::default()
        };

        let fingerprint = batch.fingerprint();
        let mut sheet = self.store.load()?;
        if batch.recovered && sheet.committed_batch() == Some(fingerprint.as_str()) {
            self.staging.release()?;
            report.already_committed = true;
            return Ok(report);
        }
        self.dedup.begin_cycle(&sheet);

        let mut admitted: Vec<ParsedRecord> = Vec::new();
        let mut notices: Vec<IdentityKey> = Vec::new();
        for line in &batch.lines {
            match Parser::classify(line) {
                ParseOutcome::Blank => {}
                ParseOutcome::Invalid(reason) => report.invalid.push(InvalidLine {
                    line: line.clone(),
                    reason,
                }),
                ParseOutcome::Record(record) => match self.dedup.admit(&record) {
                    Admission::Accepted => admitted.push(record),
                    Admission::Rejected(reason) => {
                        if reason == RejectReason::DuplicateIdentity {
                            notices.push(record.identity.clone());
                        }
                        report.duplicates.push(RejectedRecord {
                            identity: record.identity,
                            reason,
                        });
                    }
                },
            }
        }

        let rows = TableAppender::append_batch(&mut sheet, &admitted);
        report.appended = admitted
            .into_iter()
            .zip(rows)
            .map(|(record, row)| AppendedRow {
                identity: record.identity,
                row,
            })
            .collect();

        sheet.set_committed_batch(fingerprint);
        if sheet.has_changes() {
            self.store.save(&mut sheet)?;
            report.saved = true;
        }

        for identity in &notices {
            if let Err(e) = self.error_log.record_duplicate(identity) {
                report.log_failures.push(e.to_string());
            }
        }

        for hash in self.dedup.commit_pending_hashes() {
            if let Err(e) = self.hash_log.append(&hash) {
                report.log_failures.push(e.to_string());
            }
        }

        self.staging.release()?;
        Ok(report)
    }

    /// Snapshot of the table, the duplicate sets and the staging log.
    pub fn status(&self) -> Result<PipelineStatus, ScanVaultError> {
        let sheet = self.store.load()?;
        Ok(PipelineStatus::assemble(
            &sheet,
            self.dedup.hash_count(),
            &self.staging.staged_lines()?,
            self.staging.has_claimed_batch(),
            self.dedup.policy(),
        ))
    }
}

// =============================================================================
// TESTS
// =============================================================================
