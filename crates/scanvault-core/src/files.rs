//! # File Helpers
//!
//! Small shared helpers for the text artifacts of the pipeline.

use crate::ScanVaultError;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Create the parent directories of `path` and an empty file if missing.
///
/// Existing files are left untouched.
pub fn ensure_file_exists(path: &Path) -> Result<(), ScanVaultError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            ScanVaultError::Io(format!("Create directory '{}': {}", parent.display(), e))
        })?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ScanVaultError::Io(format!("Create file '{}': {}", path.display(), e)))?;

    Ok(())
}

/// Append one line (plus a trailing newline) to a text file.
pub fn append_line(path: &Path, line: &str) -> Result<(), ScanVaultError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ScanVaultError::Io(format!("Open '{}': {}", path.display(), e)))?;

    writeln!(file, "{}", line)
        .map_err(|e| ScanVaultError::Io(format!("Append to '{}': {}", path.display(), e)))
}

/// Read a text file as lines; a missing file reads as no lines.
///
/// Bytes that are not valid UTF-8 decode to U+FFFD, so one damaged scan
/// cannot make the whole file unreadable.
pub fn read_lines(path: &Path) -> Result<Vec<String>, ScanVaultError> {
    match fs::read(path) {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(ScanVaultError::Io(format!(
            "Read '{}': {}",
            path.display(),
            e
        ))),
    }
}
