//! # Error Log
//!
//! Append-only text log of record-level problems, one timestamped entry per
//! line: `YYYY-MM-DD HH:MM:SS - <message>`.

use crate::files::{append_line, ensure_file_exists};
use crate::primitives::ERROR_LOG_TIMESTAMP_FORMAT;
use crate::{IdentityKey, ScanVaultError};
use chrono::{Local, NaiveDateTime};
use std::path::{Path, PathBuf};

/// Timestamped, append-only error log.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    /// Open the error log at `path`, creating an empty file if missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScanVaultError> {
        let path = path.as_ref().to_path_buf();
        ensure_file_exists(&path)?;
        Ok(Self { path })
    }

    /// Path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `message` stamped with the current local time.
    ///
    /// Returns the full entry as written.
    pub fn record(&self, message: &str) -> Result<String, ScanVaultError> {
        self.record_at(Local::now().naive_local(), message)
    }

    /// Append `message` stamped with `at`.
    pub fn record_at(&self, at: NaiveDateTime, message: &str) -> Result<String, ScanVaultError> {
        let entry = Self::format_entry(at, message);
        append_line(&self.path, &entry)?;
        Ok(entry)
    }

    /// Append the notice for a rejected duplicate identity.
    pub fn record_duplicate(&self, identity: &IdentityKey) -> Result<String, ScanVaultError> {
        self.record(&format!("Duplicate Student ID detected: {}", identity))
    }

    /// Format one entry without writing it.
    #[must_use]
    pub fn format_entry(at: NaiveDateTime, message: &str) -> String {
        format!("{} - {}", at.format(ERROR_LOG_TIMESTAMP_FORMAT), message)
    }
}
