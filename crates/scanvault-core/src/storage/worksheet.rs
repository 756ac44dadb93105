//! # Worksheet
//!
//! In-memory, cell-addressable sheet.
//!
//! Cells are addressed by 1-based `(row, column)`. An empty value is an
//! absent cell. Every mutation is journaled so a [`SheetStore`] can persist
//! exactly the changed cells in one transaction; until then the changes are
//! visible only in memory.
//!
//! A sheet also carries the fingerprint of the last staging batch committed
//! into it. It is saved in the same transaction as the batch's rows, so a
//! batch replayed after a crash can be recognised as already applied.
//!
//! [`SheetStore`]: crate::storage::SheetStore

use crate::primitives::COLUMN_COUNT;
use crate::TableRow;
use std::collections::{BTreeMap, BTreeSet};

/// A cell coordinate: `(row, column)`, both 1-based.
pub type CellRef = (u32, u32);

/// One sheet of the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Worksheet {
    name: String,
    cells: BTreeMap<CellRef, String>,
    bold_rows: BTreeSet<u32>,
    committed_batch: Option<String>,
    changed_cells: BTreeSet<CellRef>,
    changed_bold_rows: BTreeSet<u32>,
    committed_batch_changed: bool,
}

impl Worksheet {
    /// Create an empty sheet.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Rebuild a sheet from persisted state. The journal starts empty.
    #[must_use]
    pub fn from_parts(
        name: impl Into<String>,
        cells: BTreeMap<CellRef, String>,
        bold_rows: BTreeSet<u32>,
    ) -> Self {
        Self {
            name: name.into(),
            cells,
            bold_rows,
            ..Self::default()
        }
    }

    /// Attach the persisted batch fingerprint while rebuilding a sheet.
    #[must_use]
    pub fn with_committed_batch(mut self, fingerprint: Option<String>) -> Self {
        self.committed_batch = fingerprint;
        self
    }

    /// The sheet name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of a cell, if set.
    #[must_use]
    pub fn get(&self, row: u32, col: u32) -> Option<&str> {
        self.cells.get(&(row, col)).map(String::as_str)
    }

    /// Text of a cell; unset cells read as `""`.
    #[must_use]
    pub fn text(&self, row: u32, col: u32) -> &str {
        self.get(row, col).unwrap_or("")
    }

    /// Set a cell. An empty value clears it.
    pub fn set(&mut self, row: u32, col: u32, value: impl Into<String>) {
        let value = value.into();
        let key = (row, col);
        let changed = if value.is_empty() {
            self.cells.remove(&key).is_some()
        } else {
            self.cells.insert(key, value.clone()).as_ref() != Some(&value)
        };
        if changed {
            self.changed_cells.insert(key);
        }
    }

    /// Render a whole row in bold.
    pub fn set_bold_row(&mut self, row: u32) {
        if self.bold_rows.insert(row) {
            self.changed_bold_rows.insert(row);
        }
    }

    /// Fingerprint of the last batch committed into this sheet.
    #[must_use]
    pub fn committed_batch(&self) -> Option<&str> {
        self.committed_batch.as_deref()
    }

    /// Record the batch whose rows this sheet is about to persist.
    pub fn set_committed_batch(&mut self, fingerprint: impl Into<String>) {
        let fingerprint = fingerprint.into();
        if self.committed_batch.as_deref() != Some(fingerprint.as_str()) {
            self.committed_batch = Some(fingerprint);
            self.committed_batch_changed = true;
        }
    }

    /// Whether the batch fingerprint changed since the last save.
    #[must_use]
    pub fn committed_batch_changed(&self) -> bool {
        self.committed_batch_changed
    }

    /// Whether a row is rendered in bold.
    #[must_use]
    pub fn is_bold_row(&self, row: u32) -> bool {
        self.bold_rows.contains(&row)
    }

    /// Used range as `(last_row, last_column)`, or `None` for an empty sheet.
    #[must_use]
    pub fn dimension(&self) -> Option<(u32, u32)> {
        let last_row = self.cells.keys().map(|(r, _)| *r).max()?;
        let last_col = self.cells.keys().map(|(_, c)| *c).max()?;
        Some((last_row, last_col))
    }

    /// Number of set cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Texts of columns `1..=width` of one row.
    #[must_use]
    pub fn row_texts(&self, row: u32, width: u32) -> Vec<&str> {
        (1..=width).map(|col| self.text(row, col)).collect()
    }

    /// Read a row back as a fixed-schema [`TableRow`].
    ///
    /// Cells beyond the schema width are ignored.
    #[must_use]
    pub fn table_row(&self, row: u32) -> TableRow {
        let cells: [String; COLUMN_COUNT] =
            std::array::from_fn(|i| self.text(row, i as u32 + 1).to_string());
        TableRow::from_cells(cells)
    }

    /// Iterate over all set cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (CellRef, &str)> {
        self.cells.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Iterate over bold rows in ascending order.
    pub fn bold_rows(&self) -> impl Iterator<Item = u32> + '_ {
        self.bold_rows.iter().copied()
    }

    /// Cells changed since the last save.
    pub fn changed_cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        self.changed_cells.iter().copied()
    }

    /// Bold rows added since the last save.
    pub fn changed_bold_rows(&self) -> impl Iterator<Item = u32> + '_ {
        self.changed_bold_rows.iter().copied()
    }

    /// Whether there are unsaved changes.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changed_cells.is_empty()
            || !self.changed_bold_rows.is_empty()
            || self.committed_batch_changed
    }

    /// Forget the journal once the store has persisted it.
    pub fn mark_saved(&mut self) {
        self.changed_cells.clear();
        self.changed_bold_rows.clear();
        self.committed_batch_changed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sheet_has_no_dimension() {
        let sheet = Worksheet::new("s");
        assert_eq!(sheet.dimension(), None);
        assert_eq!(sheet.text(1, 1), "");
    }

    #[test]
    fn dimension_tracks_used_range() {
        let mut sheet = Worksheet::new("s");
        sheet.set(1, 3, "a");
        sheet.set(4, 1, "b");
        assert_eq!(sheet.dimension(), Some((4, 3)));

        sheet.set(4, 1, "");
        assert_eq!(sheet.dimension(), Some((1, 3)));
    }

    #[test]
    fn empty_value_clears_cell() {
        let mut sheet = Worksheet::new("s");
        sheet.set(2, 2, "x");
        sheet.set(2, 2, "");
        assert_eq!(sheet.get(2, 2), None);
        assert_eq!(sheet.cell_count(), 0);
    }

    #[test]
    fn batch_fingerprint_is_journaled() {
        let mut sheet = Worksheet::new("s");
        sheet.set_committed_batch("abc=");
        assert!(sheet.has_changes());
        assert_eq!(sheet.committed_batch(), Some("abc="));

        sheet.mark_saved();
        sheet.set_committed_batch("abc=");
        assert!(!sheet.has_changes());
    }

    #[test]
    fn journal_records_only_real_changes() {
        let mut sheet = Worksheet::new("s");
        sheet.set(1, 1, "x");
        sheet.set_bold_row(1);
        assert!(sheet.has_changes());

        sheet.mark_saved();
        assert!(!sheet.has_changes());

        sheet.set(1, 1, "x");
        sheet.set(5, 5, "");
        sheet.set_bold_row(1);
        assert!(!sheet.has_changes());

        sheet.set(1, 1, "y");
        assert_eq!(sheet.changed_cells().collect::<Vec<_>>(), vec![(1, 1)]);
    }

    #[test]
    fn table_row_reads_schema_width() {
        let mut sheet = Worksheet::new("s");
        sheet.set(2, 3, "123456");
        sheet.set(2, 25, "outside");
        let row = sheet.table_row(2);
        assert_eq!(row.identity().as_str(), "123456");
        assert_eq!(row.iter().count(), COLUMN_COUNT);
    }
}
