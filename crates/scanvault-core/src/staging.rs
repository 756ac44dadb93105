//! # Staging Log
//!
//! The text mailbox between capture and consolidation.
//!
//! Producers append one line per scan. The consolidator takes the current
//! contents with [`StagingLog::claim`]: the file is renamed to a sibling
//! `<name>.claimed` file and an empty staging file is recreated in its place,
//! so lines appended while a batch is being processed land in the fresh file
//! and are never lost to a truncate. The claimed file is removed with
//! [`StagingLog::release`] once the batch is durably in the table.
//!
//! A claimed file that survives a failed or interrupted cycle is picked up
//! again by the next `claim` before any new lines.

use crate::files::{append_line, ensure_file_exists, read_lines};
use crate::primitives::CLAIMED_SUFFIX;
use crate::ScanVaultError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// A batch of staged lines taken out of the staging log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedBatch {
    /// The raw lines, in write order.
    pub lines: Vec<String>,
    /// True when the batch was left over from an earlier, unreleased claim.
    pub recovered: bool,
}

impl ClaimedBatch {
    /// SHA-256 over the lines, each terminated by a newline, base64-encoded.
    ///
    /// Stored with the table so a replayed batch can be matched against the
    /// last one committed.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for line in &self.lines {
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        }
        STANDARD.encode(hasher.finalize())
    }
}

/// Append-only staging log consumed destructively by the consolidator.
#[derive(Debug, Clone)]
pub struct StagingLog {
    path: PathBuf,
    claimed_path: PathBuf,
}

impl StagingLog {
    /// Open the staging log at `path`, creating an empty file if missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScanVaultError> {
        let path = path.as_ref().to_path_buf();
        let claimed_path = Self::claimed_path_for(&path)?;
        ensure_file_exists(&path)?;
        Ok(Self { path, claimed_path })
    }

    /// Sibling path a batch claimed from `path` is renamed to.
    pub fn claimed_path_for(path: &Path) -> Result<PathBuf, ScanVaultError> {
        let mut claimed_name = path
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| {
                ScanVaultError::Config(format!(
                    "Staging log path '{}' has no file name",
                    path.display()
                ))
            })?;
        claimed_name.push(".");
        claimed_name.push(CLAIMED_SUFFIX);
        Ok(path.with_file_name(claimed_name))
    }

    /// Path of the staging file producers append to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the in-flight claimed batch.
    #[must_use]
    pub fn claimed_path(&self) -> &Path {
        &self.claimed_path
    }

    /// Append one line for a later consolidation cycle.
    pub fn append(&self, line: &str) -> Result<(), ScanVaultError> {
        append_line(&self.path, line)
    }

    /// Lines currently waiting in the staging file (not the claimed batch).
    pub fn staged_lines(&self) -> Result<Vec<String>, ScanVaultError> {
        read_lines(&self.path)
    }

    /// Whether an unreleased claimed batch is on disk.
    #[must_use]
    pub fn has_claimed_batch(&self) -> bool {
        self.claimed_path.is_file()
    }

    /// Take the current batch out of the staging log.
    ///
    /// Returns `None` when there is nothing to consolidate.
    pub fn claim(&self) -> Result<Option<ClaimedBatch>, ScanVaultError> {
        if self.has_claimed_batch() {
            return Ok(Some(ClaimedBatch {
                lines: read_lines(&self.claimed_path)?,
                recovered: true,
            }));
        }

        let len = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => {
                return Err(ScanVaultError::Io(format!(
                    "Stat '{}': {}",
                    self.path.display(),
                    e
                )));
            }
        };
        if len == 0 {
            return Ok(None);
        }

        fs::rename(&self.path, &self.claimed_path).map_err(|e| {
            ScanVaultError::Io(format!(
                "Claim '{}' as '{}': {}",
                self.path.display(),
                self.claimed_path.display(),
                e
            ))
        })?;
        ensure_file_exists(&self.path)?;

        Ok(Some(ClaimedBatch {
            lines: read_lines(&self.claimed_path)?,
            recovered: false,
        }))
    }

    /// Drop the claimed batch after it has been consolidated.
    pub fn release(&self) -> Result<(), ScanVaultError> {
        match fs::remove_file(&self.claimed_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ScanVaultError::Io(format!(
                "Release '{}': {}",
                self.claimed_path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open(temp: &tempfile::TempDir) -> StagingLog {
        StagingLog::open(temp.path().join("scanned.txt")).expect("open")
    }

    #[test]
    fn empty_log_claims_nothing() {
        let temp = tempdir().expect("temp dir");
        let log = open(&temp);
        assert_eq!(log.claim().expect("claim"), None);
        assert!(!log.has_claimed_batch());
    }

    #[test]
    fn claim_empties_staging_file() {
        let temp = tempdir().expect("temp dir");
        let log = open(&temp);
        log.append("'a'b'123456").expect("append");
        log.append("'c'd'654321").expect("append");

        let batch = log.claim().expect("claim").expect("batch");
        assert_eq!(batch.lines.len(), 2);
        assert!(!batch.recovered);
        assert!(log.path().is_file());
        assert!(log.staged_lines().expect("read").is_empty());
        assert_eq!(
            log.claimed_path().file_name().and_then(|n| n.to_str()),
            Some("scanned.txt.claimed")
        );
    }

    #[test]
    fn lines_appended_after_claim_wait_for_next_cycle() {
        let temp = tempdir().expect("temp dir");
        let log = open(&temp);
        log.append("first").expect("append");

        let batch = log.claim().expect("claim").expect("batch");
        log.append("second").expect("append");
        assert_eq!(batch.lines, vec!["first"]);

        log.release().expect("release");
        let next = log.claim().expect("claim").expect("batch");
        assert_eq!(next.lines, vec!["second"]);
    }

    #[test]
    fn fingerprint_respects_line_boundaries() {
        let batch = |lines: &[&str]| ClaimedBatch {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            recovered: false,
        };
        assert_eq!(batch(&["ab", "c"]).fingerprint(), batch(&["ab", "c"]).fingerprint());
        assert_ne!(batch(&["ab", "c"]).fingerprint(), batch(&["a", "bc"]).fingerprint());
        assert_ne!(batch(&["ab"]).fingerprint(), batch(&["ab", ""]).fingerprint());
    }

    #[test]
    fn unreleased_batch_is_recovered_first() {
        let temp = tempdir().expect("temp dir");
        let log = open(&temp);
        log.append("first").expect("append");
        let _ = log.claim().expect("claim");
        log.append("second").expect("append");

        let again = log.claim().expect("claim").expect("batch");
        assert!(again.recovered);
        assert_eq!(again.lines, vec!["first"]);
        assert_eq!(log.staged_lines().expect("read"), vec!["second"]);
    }

    #[test]
    fn release_without_claim_is_noop() {
        let temp = tempdir().expect("temp dir");
        let log = open(&temp);
        log.release().expect("release");
    }
}
