//! # redb-backed Sheet Storage
//!
//! A disk-backed table store using the redb embedded database.
//!
//! - ACID transactions: one save is one write transaction
//! - Crash safety (copy-on-write B-trees): a failed save leaves the previous
//!   durable sheet in place
//! - Zero configuration
//!
//! Cells are stored natively as `(row, column) -> text`; absent keys are
//! empty cells.

use super::{SheetStore, Worksheet};
use crate::ScanVaultError;
use crate::primitives::SHEET_NAME;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Table for cells: (row, column) -> text
const CELLS: TableDefinition<(u32, u32), &str> = TableDefinition::new("cells");

/// Table for bold rows: row -> ()
const BOLD_ROWS: TableDefinition<u32, ()> = TableDefinition::new("bold_rows");

/// Table for metadata: key -> value
const METADATA: TableDefinition<&str, &str> = TableDefinition::new("metadata");

/// Metadata key holding the sheet name.
const SHEET_NAME_KEY: &str = "sheet_name";

/// Metadata key holding the fingerprint of the last committed batch.
const COMMITTED_BATCH_KEY: &str = "committed_batch";

fn storage_err(e: impl std::fmt::Display) -> ScanVaultError {
    ScanVaultError::Storage(e.to_string())
}

/// A disk-backed sheet store using redb.
pub struct RedbSheetStore {
    /// The redb database handle.
    db: Database,
    /// Where the database lives.
    path: PathBuf,
}

impl std::fmt::Debug for RedbSheetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbSheetStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RedbSheetStore {
    /// Open or create a table database at the given path.
    ///
    /// Parent directories are created if missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScanVaultError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ScanVaultError::Io(format!("Create directory '{}': {}", parent.display(), e))
            })?;
        }

        let db = Database::create(&path).map_err(storage_err)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(storage_err)?;
            let _ = write_txn.open_table(CELLS).map_err(storage_err)?;
            let _ = write_txn.open_table(BOLD_ROWS).map_err(storage_err)?;
            {
                let mut meta = write_txn.open_table(METADATA).map_err(storage_err)?;
                let has_name = meta.get(SHEET_NAME_KEY).map_err(storage_err)?.is_some();
                if !has_name {
                    meta.insert(SHEET_NAME_KEY, SHEET_NAME)
                        .map_err(storage_err)?;
                }
            }
            write_txn.commit().map_err(storage_err)?;
        }

        Ok(Self { db, path })
    }

    /// Path of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the sheet stored at `path` without creating anything.
    ///
    /// A missing database reads as an empty sheet. redb locks the file, so
    /// this fails while another process (a running worker) holds it open.
    pub fn read_existing(path: impl AsRef<Path>) -> Result<Worksheet, ScanVaultError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Worksheet::new(SHEET_NAME));
        }

        let db = Database::open(path).map_err(|e| {
            ScanVaultError::Storage(format!("Open '{}' for reading: {}", path.display(), e))
        })?;
        Self {
            db,
            path: path.to_path_buf(),
        }
        .load()
    }
}

// =============================================================================
// SHEETSTORE TRAIT IMPLEMENTATION
// =============================================================================

impl SheetStore for RedbSheetStore {
    fn load(&self) -> Result<Worksheet, ScanVaultError> {
        let read_txn = self.db.begin_read().map_err(storage_err)?;

        let (name, committed_batch) = {
            let meta = read_txn.open_table(METADATA).map_err(storage_err)?;
            let name = meta
                .get(SHEET_NAME_KEY)
                .map_err(storage_err)?
                .map(|v| v.value().to_string())
                .unwrap_or_else(|| SHEET_NAME.to_string());
            let batch = meta
                .get(COMMITTED_BATCH_KEY)
                .map_err(storage_err)?
                .map(|v| v.value().to_string());
            (name, batch)
        };

        let cells = {
            let table = read_txn.open_table(CELLS).map_err(storage_err)?;
            let mut cells = BTreeMap::new();
            for entry in table.iter().map_err(storage_err)? {
                let (key, value) = entry.map_err(storage_err)?;
                cells.insert(key.value(), value.value().to_string());
            }
            cells
        };

        let bold_rows = {
            let table = read_txn.open_table(BOLD_ROWS).map_err(storage_err)?;
            let mut rows = BTreeSet::new();
            for entry in table.iter().map_err(storage_err)? {
                let (key, _) = entry.map_err(storage_err)?;
                rows.insert(key.value());
            }
            rows
        };

        Ok(Worksheet::from_parts(name, cells, bold_rows).with_committed_batch(committed_batch))
    }

    fn save(&mut self, sheet: &mut Worksheet) -> Result<(), ScanVaultError> {
        if !sheet.has_changes() {
            return Ok(());
        }

        let write_txn = self.db.begin_write().map_err(storage_err)?;
        {
            let mut cells = write_txn.open_table(CELLS).map_err(storage_err)?;
            for (row, col) in sheet.changed_cells() {
                match sheet.get(row, col) {
                    Some(text) => {
                        cells.insert((row, col), text).map_err(storage_err)?;
                    }
                    None => {
                        cells.remove((row, col)).map_err(storage_err)?;
                    }
                }
            }

            let mut bold = write_txn.open_table(BOLD_ROWS).map_err(storage_err)?;
            for row in sheet.changed_bold_rows() {
                bold.insert(row, ()).map_err(storage_err)?;
            }

            if sheet.committed_batch_changed() {
                if let Some(fingerprint) = sheet.committed_batch() {
                    let mut meta = write_txn.open_table(METADATA).map_err(storage_err)?;
                    meta.insert(COMMITTED_BATCH_KEY, fingerprint)
                        .map_err(storage_err)?;
                }
            }
        }
        write_txn.commit().map_err(storage_err)?;

        // Update in-memory state only after successful commit.
        sheet.mark_saved();
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
