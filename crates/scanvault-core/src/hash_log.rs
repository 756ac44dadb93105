//! # Hash Log
//!
//! Durable, append-only set of processed row hashes.
//!
//! One encoded [`ProcessedHash`] per line. Entries are never removed or
//! rewritten; the log is read once at startup to seed the duplicate sets.

use crate::files::{append_line, ensure_file_exists, read_lines};
use crate::{ProcessedHash, ScanVaultError};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Append-only hash file.
#[derive(Debug, Clone)]
pub struct HashLog {
    path: PathBuf,
}

impl HashLog {
    /// Open the hash log at `path`, creating an empty file if missing.
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

    /// Load every hash in the log. Blank lines are ignored.
    pub fn load(&self) -> Result<BTreeSet<ProcessedHash>, ScanVaultError> {
        Self::read(&self.path)
    }

    /// Read the hashes stored at `path`; a missing file holds none.
    pub fn read(path: &Path) -> Result<BTreeSet<ProcessedHash>, ScanVaultError> {
        Ok(read_lines(path)?
            .iter()
            .filter(|line| !line.trim().is_empty())
            .map(ProcessedHash::from_encoded)
            .collect())
    }

    /// Append one hash to the log.
    pub fn append(&self, hash: &ProcessedHash) -> Result<(), ScanVaultError> {
        append_line(&self.path, hash.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_creates_empty_log() {
        let temp = tempdir().expect("temp dir");
        let log = HashLog::open(temp.path().join("hashes.txt")).expect("open");
        assert!(log.path().is_file());
        assert!(log.load().expect("load").is_empty());
    }

    #[test]
    fn appended_hashes_survive_reopen() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("hashes.txt");
        let a = ProcessedHash::of_cells(["row a"]);
        let b = ProcessedHash::of_cells(["row b"]);

        {
            let log = HashLog::open(&path).expect("open");
            log.append(&a).expect("append");
            log.append(&b).expect("append");
            log.append(&a).expect("append");
        }

        let log = HashLog::open(&path).expect("reopen");
        let loaded = log.load().expect("load");
        assert_eq!(loaded.len(), 2);
        assert!(loaded.contains(&a));
        assert!(loaded.contains(&b));

        // Append-only: the duplicate line is still on disk.
        let raw = std::fs::read_to_string(&path).expect("read");
        assert_eq!(raw.lines().count(), 3);
    }

    #[test]
    fn load_skips_blank_lines() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("hashes.txt");
        std::fs::write(&path, "abc=\n\n  \ndef=\n").expect("write");

        let log = HashLog::open(&path).expect("open");
        assert_eq!(log.load().expect("load").len(), 2);
    }
}
