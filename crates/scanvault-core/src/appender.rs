//! # Appender Module
//!
//! Writes admitted records into the fixed-schema table.
//!
//! - Header row written once, lazily, in bold
//! - One row per record, strictly after the last used row
//! - Redaction applied through [`TableRow::from_record`]
//! - No save: the caller persists the sheet once per batch

use crate::primitives::{FIRST_DATA_ROW, HEADER_ROW};
use crate::storage::Worksheet;
use crate::{Column, IdentityKey, ParsedRecord, ProcessedHash, TableRow};
use std::collections::BTreeSet;

/// The TableAppender handles header management, row placement and the
/// table scans used to seed duplicate detection.
pub struct TableAppender;

impl TableAppender {
    /// Whether the sheet already carries its header row.
    #[must_use]
    pub fn has_header(sheet: &Worksheet) -> bool {
        sheet.get(HEADER_ROW, Column::Examiner.index()).is_some()
    }

    /// Write the 20 column names into row 1 (bold) if the header is missing.
    ///
    /// Returns true if the header was written.
    pub fn ensure_header(sheet: &mut Worksheet) -> bool {
        if Self::has_header(sheet) {
            return false;
        }
        for column in Column::ALL {
            sheet.set(HEADER_ROW, column.index(), column.header());
        }
        sheet.set_bold_row(HEADER_ROW);
        true
    }

    /// The row the next record goes into: one past the last used row.
    #[must_use]
    pub fn next_free_row(sheet: &Worksheet) -> u32 {
        sheet
            .dimension()
            .map(|(last_row, _)| last_row.saturating_add(1).max(FIRST_DATA_ROW))
            .unwrap_or(FIRST_DATA_ROW)
    }

    /// Write one row at `row`.
    pub fn write_row(sheet: &mut Worksheet, row: u32, table_row: &TableRow) {
        for (column, text) in table_row.iter() {
            sheet.set(row, column.index(), text);
        }
    }

    /// Append a batch of admitted records.
    ///
    /// Returns the row index each record was written to, in input order.
    pub fn append_batch(sheet: &mut Worksheet, records: &[ParsedRecord]) -> Vec<u32> {
        if records.is_empty() {
            return Vec::new();
        }

        Self::ensure_header(sheet);

        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let row = Self::next_free_row(sheet);
            Self::write_row(sheet, row, &TableRow::from_record(record));
            rows.push(row);
        }
        rows
    }

    /// Data rows (below the header) that hold at least one cell.
    #[must_use]
    pub fn data_rows(sheet: &Worksheet) -> Vec<u32> {
        let Some((last_row, last_col)) = sheet.dimension() else {
            return Vec::new();
        };
        (FIRST_DATA_ROW..=last_row)
            .filter(|&row| (1..=last_col).any(|col| sheet.get(row, col).is_some()))
            .collect()
    }

    /// Every identity key currently in column 3 of the data rows.
    #[must_use]
    pub fn identity_keys(sheet: &Worksheet) -> BTreeSet<IdentityKey> {
        let Some((last_row, _)) = sheet.dimension() else {
            return BTreeSet::new();
        };
        (FIRST_DATA_ROW..=last_row)
            .map(|row| IdentityKey::new(sheet.text(row, Column::StudentId.index())))
            .filter(|key| !key.is_empty())
            .collect()
    }

    /// Content hash of every data row, over the full used width.
    #[must_use]
    pub fn row_hashes(sheet: &Worksheet) -> BTreeSet<ProcessedHash> {
        let Some((last_row, last_col)) = sheet.dimension() else {
            return BTreeSet::new();
        };
        (FIRST_DATA_ROW..=last_row)
            .map(|row| ProcessedHash::of_cells(sheet.row_texts(row, last_col)))
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{COLUMN_COUNT, SHEET_NAME};

    fn record(identity: &str, directory_listing: &str) -> ParsedRecord {
        let fields = Column::ALL
            .iter()
            .map(|c| match c {
                Column::StudentId => identity.to_string(),
                Column::DirectoryListing => directory_listing.to_string(),
                other => format!("{}-{}", other.index(), identity),
            })
            .collect();
        ParsedRecord::new(fields, IdentityKey::new(identity))
    }

    #[test]
    fn first_append_writes_bold_header() {
        let mut sheet = Worksheet::new(SHEET_NAME);
        let rows = TableAppender::append_batch(&mut sheet, &[record("123456", "true")]);

        assert_eq!(rows, vec![2]);
        assert!(sheet.is_bold_row(1));
        for column in Column::ALL {
            assert_eq!(sheet.text(1, column.index()), column.header());
        }
        assert_eq!(sheet.dimension(), Some((2, COLUMN_COUNT as u32)));
    }

    #[test]
    fn header_is_written_once() {
        let mut sheet = Worksheet::new(SHEET_NAME);
        assert!(TableAppender::ensure_header(&mut sheet));
        assert!(!TableAppender::ensure_header(&mut sheet));

        TableAppender::append_batch(&mut sheet, &[record("111111", "true")]);
        TableAppender::append_batch(&mut sheet, &[record("222222", "true")]);

        let header_rows = (1..=3)
            .filter(|&r| sheet.text(r, 1) == Column::Examiner.header())
            .count();
        assert_eq!(header_rows, 1);
    }

    #[test]
    fn empty_batch_touches_nothing() {
        let mut sheet = Worksheet::new(SHEET_NAME);
        assert!(TableAppender::append_batch(&mut sheet, &[]).is_empty());
        assert!(!sheet.has_changes());
    }

    #[test]
    fn rows_advance_by_one_per_record() {
        let mut sheet = Worksheet::new(SHEET_NAME);
        let rows = TableAppender::append_batch(
            &mut sheet,
            &[
                record("111111", "true"),
                record("222222", "true"),
                record("333333", "true"),
            ],
        );
        assert_eq!(rows, vec![2, 3, 4]);
        assert_eq!(TableAppender::next_free_row(&sheet), 5);
    }

    #[test]
    fn short_record_still_takes_a_full_row() {
        let mut sheet = Worksheet::new(SHEET_NAME);
        let short = ParsedRecord::new(
            vec!["A".into(), "B".into(), "123456".into()],
            IdentityKey::new("123456"),
        );
        let rows = TableAppender::append_batch(&mut sheet, &[short.clone(), short]);
        assert_eq!(rows, vec![2, 3]);
    }

    #[test]
    fn missing_header_is_restored_above_existing_rows() {
        let mut sheet = Worksheet::new(SHEET_NAME);
        sheet.set(2, 3, "999999");

        let rows = TableAppender::append_batch(&mut sheet, &[record("123456", "true")]);
        assert_eq!(rows, vec![3]);
        assert_eq!(sheet.text(1, 3), Column::StudentId.header());
    }

    #[test]
    fn redaction_applies_to_written_cells() {
        let mut sheet = Worksheet::new(SHEET_NAME);
        TableAppender::append_batch(&mut sheet, &[record("123456", "FaLsE")]);

        assert_eq!(sheet.get(2, Column::PrivateEmail.index()), None);
        assert_eq!(sheet.get(2, Column::Phone.index()), None);
        assert_eq!(sheet.get(2, Column::PostalAddress.index()), None);
        assert_eq!(sheet.text(2, Column::DirectoryListing.index()), "FaLsE");
    }

    #[test]
    fn identity_scan_skips_header_and_blanks() {
        let mut sheet = Worksheet::new(SHEET_NAME);
        TableAppender::append_batch(
            &mut sheet,
            &[record("111111", "true"), record("222222", "true")],
        );
        sheet.set(5, 1, "no identity here");

        let keys = TableAppender::identity_keys(&sheet);
        assert_eq!(keys.len(), 2);
        assert!(keys.contains(&IdentityKey::new("111111")));
        assert!(!keys.contains(&IdentityKey::new(Column::StudentId.header())));
    }

    #[test]
    fn row_hash_matches_record_hash() {
        let rec = record("123456", "true");
        let mut sheet = Worksheet::new(SHEET_NAME);
        TableAppender::append_batch(&mut sheet, std::slice::from_ref(&rec));

        let hashes = TableAppender::row_hashes(&sheet);
        assert_eq!(hashes.len(), 1);
        assert!(hashes.contains(&TableRow::from_record(&rec).content_hash()));
    }

    #[test]
    fn data_rows_ignore_gaps() {
        let mut sheet = Worksheet::new(SHEET_NAME);
        TableAppender::ensure_header(&mut sheet);
        sheet.set(2, 1, "a");
        sheet.set(4, 1, "b");
        assert_eq!(TableAppender::data_rows(&sheet), vec![2, 4]);
    }
}
