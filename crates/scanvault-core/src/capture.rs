//! # Capture Module
//!
//! The producer side of the staging log.
//!
//! A raw scan is cleaned, its identity is located, and the cleaned line is
//! appended to the staging log unless the identity was already captured.
//! The duplicate check is best effort: the set lives in memory and is seeded
//! from whatever is still staged, so the consolidator stays authoritative.

use crate::parser::Parser;
use crate::staging::StagingLog;
use crate::{IdentityKey, ScanVaultError};
use std::collections::BTreeSet;

/// What happened to one submitted scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The cleaned line was appended to the staging log.
    Saved(IdentityKey),
    /// The identity was already captured; nothing was written.
    Duplicate(IdentityKey),
    /// The scan is empty or carries no enclosed 6+-digit identity.
    Invalid,
}

/// Headless capture front-end.
#[derive(Debug)]
pub struct Capture {
    staging: StagingLog,
    seen: BTreeSet<IdentityKey>,
}

impl Capture {
    /// Start capturing into `staging`, remembering identities already staged.
    pub fn open(staging: StagingLog) -> Result<Self, ScanVaultError> {
        let seen = staging
            .staged_lines()?
            .iter()
            .filter_map(|line| Parser::extract_scanned_identity(&Parser::clean(line)))
            .collect();
        Ok(Self { staging, seen })
    }

    /// Submit one raw scan.
    pub fn submit(&mut self, raw: &str) -> Result<CaptureOutcome, ScanVaultError> {
        let cleaned = Parser::clean(raw);
        if cleaned.is_empty() {
            return Ok(CaptureOutcome::Invalid);
        }

        let Some(identity) = Parser::extract_scanned_identity(&cleaned) else {
            return Ok(CaptureOutcome::Invalid);
        };

        if self.seen.contains(&identity) {
            return Ok(CaptureOutcome::Duplicate(identity));
        }

        self.staging.append(&cleaned)?;
        self.seen.insert(identity.clone());
        Ok(CaptureOutcome::Saved(identity))
    }

    /// Number of identities captured so far.
    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn staging(temp: &tempfile::TempDir) -> StagingLog {
        StagingLog::open(temp.path().join("scanned.txt")).expect("open")
    }

    #[test]
    fn saves_cleaned_line() {
        let temp = tempdir().expect("temp dir");
        let log = staging(&temp);
        let mut capture = Capture::open(log.clone()).expect("capture");

        let outcome = capture
            .submit("  'Smith'\t'Jones'  '123456'  'Doe'\r\n")
            .expect("submit");
        assert_eq!(outcome, CaptureOutcome::Saved(IdentityKey::new("123456")));
        assert_eq!(
            log.staged_lines().expect("read"),
            vec!["'Smith' 'Jones' '123456' 'Doe'"]
        );
    }

    #[test]
    fn rejects_repeat_scan() {
        let temp = tempdir().expect("temp dir");
        let log = staging(&temp);
        let mut capture = Capture::open(log.clone()).expect("capture");

        capture.submit("'A'B'123456'C'").expect("submit");
        let outcome = capture.submit("'X'Y'123456'Z'").expect("submit");
        assert_eq!(
            outcome,
            CaptureOutcome::Duplicate(IdentityKey::new("123456"))
        );
        assert_eq!(log.staged_lines().expect("read").len(), 1);
    }

    #[test]
    fn rejects_scan_without_identity() {
        let temp = tempdir().expect("temp dir");
        let mut capture = Capture::open(staging(&temp)).expect("capture");
        assert_eq!(capture.submit("   ").expect("submit"), CaptureOutcome::Invalid);
        assert_eq!(
            capture.submit("'A'B'12345'C'").expect("submit"),
            CaptureOutcome::Invalid
        );
        assert_eq!(capture.seen_count(), 0);
    }

    #[test]
    fn seeds_from_staged_lines() {
        let temp = tempdir().expect("temp dir");
        let log = staging(&temp);
        log.append("'A'B'123456'C'").expect("append");

        let mut capture = Capture::open(log).expect("capture");
        assert_eq!(capture.seen_count(), 1);
        assert!(matches!(
            capture.submit("'A'B'123456'C'").expect("submit"),
            CaptureOutcome::Duplicate(_)
        ));
    }
}
