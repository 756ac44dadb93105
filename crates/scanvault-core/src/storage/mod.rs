//! # Storage Module
//!
//! The persistent table behind the pipeline.
//!
//! A [`Worksheet`] is loaded once per cycle, mutated in memory, and handed
//! back to its [`SheetStore`] for a single save. A save either persists every
//! journaled change or none of them.
//!
//! ## Backends
//!
//! - `RedbSheetStore`: disk-backed, one redb write transaction per save
//! - `MemorySheetStore`: volatile, for tests and dry runs

mod redb_sheet;
mod worksheet;

pub use redb_sheet::RedbSheetStore;
pub use worksheet::{CellRef, Worksheet};

use crate::ScanVaultError;
use crate::primitives::SHEET_NAME;

/// Load/save contract the pipeline needs from a table store.
///
/// Implementations must make `save` all-or-nothing: on error the durable
/// state is the one from the previous successful save.
pub trait SheetStore: Send + Sync {
    /// Load the current durable sheet.
    fn load(&self) -> Result<Worksheet, ScanVaultError>;

    /// Persist the sheet's journaled changes and clear its journal.
    fn save(&mut self, sheet: &mut Worksheet) -> Result<(), ScanVaultError>;
}

/// Volatile sheet store.
#[derive(Debug, Clone)]
pub struct MemorySheetStore {
    durable: Worksheet,
}

impl MemorySheetStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            durable: Worksheet::new(SHEET_NAME),
        }
    }
}

impl Default for MemorySheetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SheetStore for MemorySheetStore {
    fn load(&self) -> Result<Worksheet, ScanVaultError> {
        let mut sheet = self.durable.clone();
        sheet.mark_saved();
        Ok(sheet)
    }

    fn save(&mut self, sheet: &mut Worksheet) -> Result<(), ScanVaultError> {
        for (row, col) in sheet.changed_cells() {
            self.durable.set(row, col, sheet.text(row, col));
        }
        for row in sheet.changed_bold_rows() {
            self.durable.set_bold_row(row);
        }
        if let Some(fingerprint) = sheet.committed_batch() {
            self.durable.set_committed_batch(fingerprint);
        }
        self.durable.mark_saved();
        sheet.mark_saved();
        Ok(())
    }
}
