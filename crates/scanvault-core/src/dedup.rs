//! # Dedup Module
//!
//! Two-tier duplicate detection.
//!
//! - Identity tier: the set of identity keys present in the table, rebuilt
//!   from the live sheet at the start of every cycle and extended as records
//!   are admitted, so duplicates within one batch are caught too.
//! - Content tier: hashes of rows already in the table plus the persisted
//!   hash log, built once at startup.
//!
//! By default the content tier only carries state across restarts and is not
//! consulted on admission ([`HashPolicy::SeedOnly`]). Content-level rejection
//! is available as an explicit opt-in ([`HashPolicy::RejectKnownContent`]).

use crate::appender::TableAppender;
use crate::hash_log::HashLog;
use crate::storage::Worksheet;
use crate::{IdentityKey, ParsedRecord, ProcessedHash, ScanVaultError, TableRow};
use serde::Serialize;
use std::collections::BTreeSet;

/// How the content-hash tier takes part in admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashPolicy {
    /// Hashes are preloaded but never consulted or extended.
    #[default]
    SeedOnly,
    /// Reject records whose row content was seen before; admitted rows are
    /// hashed and appended to the hash log.
    RejectKnownContent,
}

/// Why a record was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The identity key is empty.
    MissingIdentity,
    /// The identity key is already in the table or earlier in the batch.
    DuplicateIdentity,
    /// The row content hash is already known.
    DuplicateContent,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::MissingIdentity => f.write_str("missing identity"),
            RejectReason::DuplicateIdentity => f.write_str("duplicate identity"),
            RejectReason::DuplicateContent => f.write_str("duplicate content"),
        }
    }
}

/// Admission decision for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The record may be appended.
    Accepted,
    /// The record must be dropped.
    Rejected(RejectReason),
}

/// Duplicate detector owning both duplicate sets.
#[derive(Debug, Clone, Default)]
pub struct DedupEngine {
    known_identity_keys: BTreeSet<IdentityKey>,
    known_hashes: BTreeSet<ProcessedHash>,
    policy: HashPolicy,
    /// Hashes admitted this cycle, not yet known until the save commits.
    pending_hashes: Vec<ProcessedHash>,
}

impl DedupEngine {
    /// Create an engine with empty sets.
    #[must_use]
    pub fn new(policy: HashPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Build the content tier from the existing table and the hash log.
    ///
    /// Called once at startup; the hash log is not re-read afterwards.
    pub fn preload(
        policy: HashPolicy,
        sheet: &Worksheet,
        hash_log: &HashLog,
    ) -> Result<Self, ScanVaultError> {
        let mut engine = Self::new(policy);
        engine.known_hashes = TableAppender::row_hashes(sheet);
        engine.known_hashes.extend(hash_log.load()?);
        engine.begin_cycle(sheet);
        Ok(engine)
    }

    /// Rebuild the identity tier from the live sheet.
    pub fn begin_cycle(&mut self, sheet: &Worksheet) {
        self.known_identity_keys = TableAppender::identity_keys(sheet);
        self.pending_hashes.clear();
    }

    /// Decide whether `record` may be appended.
    ///
    /// An accepted record's identity key is registered immediately, so a
    /// second record with the same key later in the batch is rejected.
    pub fn admit(&mut self, record: &ParsedRecord) -> Admission {
        if record.identity.is_empty() {
            return Admission::Rejected(RejectReason::MissingIdentity);
        }

        if self.known_identity_keys.contains(&record.identity) {
            return Admission::Rejected(RejectReason::DuplicateIdentity);
        }

        if self.policy == HashPolicy::RejectKnownContent {
            let hash = TableRow::from_record(record).content_hash();
            if self.known_hashes.contains(&hash) || self.pending_hashes.contains(&hash) {
                return Admission::Rejected(RejectReason::DuplicateContent);
            }
            self.pending_hashes.push(hash);
        }

        self.known_identity_keys.insert(record.identity.clone());
        Admission::Accepted
    }

    /// Make the hashes admitted this cycle known, once their rows are saved.
    ///
    /// Returns them in admission order so they can be appended to the hash
    /// log. Always empty under [`HashPolicy::SeedOnly`].
    pub fn commit_pending_hashes(&mut self) -> Vec<ProcessedHash> {
        let committed = std::mem::take(&mut self.pending_hashes);
        self.known_hashes.extend(committed.iter().cloned());
        committed
    }

    /// The active hash policy.
    #[must_use]
    pub fn policy(&self) -> HashPolicy {
        self.policy
    }

    /// Whether an identity key is currently known.
    #[must_use]
    pub fn knows_identity(&self, identity: &IdentityKey) -> bool {
        self.known_identity_keys.contains(identity)
    }

    /// Whether a content hash is currently known.
    #[must_use]
    pub fn knows_hash(&self, hash: &ProcessedHash) -> bool {
        self.known_hashes.contains(hash)
    }

    /// Number of known identity keys.
    #[must_use]
    pub fn identity_count(&self) -> usize {
        self.known_identity_keys.len()
    }

    /// Number of known content hashes.
    #[must_use]
    pub fn hash_count(&self) -> usize {
        self.known_hashes.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================
