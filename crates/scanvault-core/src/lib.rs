//! # scanvault-core
//!
//! The consolidation pipeline for scanned badge and form data.
//!
//! Scans are staged as apostrophe-delimited lines in a shared text log. This
//! crate drains that log into a fixed-schema, 20-column table while keeping
//! exactly one row per student ID, across batches and across restarts.
//!
//! ## Pipeline
//!
//! - `parser`: staged line to [`ParsedRecord`]
//! - `dedup`: identity-key and content-hash duplicate sets
//! - `appender`: header, row placement, opt-out redaction
//! - `consolidator`: one claim / parse / admit / append / save cycle
//! - `capture`: the producer that writes the staging log
//!
//! ## Constraints
//!
//! - Synchronous, NO async, NO logging framework: outcomes are returned
//!   (see [`CycleReport`]) and logged by the host
//! - One save per batch; a failed save leaves the previous durable table
//! - Never panics on input; bad lines are reported and skipped

// =============================================================================
// MODULES
// =============================================================================

pub mod appender;
pub mod capture;
pub mod consolidator;
pub mod dedup;
pub mod error_log;
pub mod files;
pub mod hash_log;
pub mod parser;
pub mod primitives;
pub mod staging;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Column, IdentityKey, ParsedRecord, ProcessedHash, ScanVaultError, TableRow};

// =============================================================================
// RE-EXPORTS: Pipeline
// =============================================================================

pub use appender::TableAppender;
pub use capture::{Capture, CaptureOutcome};
pub use consolidator::{
    AppendedRow, Consolidator, CycleReport, InvalidLine, PipelinePaths, PipelineStatus,
    RejectedRecord,
};
pub use dedup::{Admission, DedupEngine, HashPolicy, RejectReason};
pub use error_log::ErrorLog;
pub use hash_log::HashLog;
pub use parser::{ParseOutcome, Parser};
pub use staging::{ClaimedBatch, StagingLog};
pub use storage::{CellRef, MemorySheetStore, RedbSheetStore, SheetStore, Worksheet};
