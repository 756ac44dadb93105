//! # Core Type Definitions
//!
//! This module contains all core types for the scanvault pipeline:
//! - Record identity and content digests (`IdentityKey`, `ProcessedHash`)
//! - Parsed staging lines (`ParsedRecord`)
//! - The fixed table schema (`Column`, `TableRow`)
//! - Error types (`ScanVaultError`)
//!
//! ## Schema Guarantees
//!
//! The table has exactly [`COLUMN_COUNT`] columns. `TableRow` stores its cells
//! in a fixed-size array indexed by `Column`, so a row with the wrong number
//! of cells cannot be constructed.

use crate::primitives::{COLUMN_COUNT, OPT_OUT_LITERAL};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::ops::Index;
use thiserror::Error;

// =============================================================================
// IDENTITY KEY
// =============================================================================

/// The unique identifying field of a record (the student ID).
///
/// Stored trimmed. Implements `Ord` so sets of keys iterate deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IdentityKey(pub String);

impl IdentityKey {
    /// Create a new identity key, trimming surrounding whitespace.
    #[must_use]
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(s.as_ref().trim().to_string())
    }

    /// Get the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check if the key is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// PROCESSED HASH
// =============================================================================

/// SHA-256 digest of one row's content, base64 encoded (44 chars, padded).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProcessedHash(pub String);

impl ProcessedHash {
    /// Hash the concatenation of the given cell texts.
    ///
    /// Each cell is trimmed before concatenation; no separator is inserted.
    pub fn of_cells<'a, I>(cells: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut hasher = Sha256::new();
        for cell in cells {
            hasher.update(cell.trim().as_bytes());
        }
        Self(STANDARD.encode(hasher.finalize()))
    }

    /// Wrap an already encoded hash (one line of the hash log).
    #[must_use]
    pub fn from_encoded(s: impl AsRef<str>) -> Self {
        Self(s.as_ref().trim().to_string())
    }

    /// Get the encoded hash as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// PARSED RECORD
// =============================================================================

/// One staging line split into its fields.
///
/// `fields[0]` is the Examiner and lands in column 1; the framing artifact
/// before the first delimiter is already gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRecord {
    /// Trimmed fields in line order.
    pub fields: Vec<String>,
    /// The identity key extracted from the fields.
    pub identity: IdentityKey,
}

impl ParsedRecord {
    /// Create a new parsed record.
    #[must_use]
    pub fn new(fields: Vec<String>, identity: IdentityKey) -> Self {
        Self { fields, identity }
    }
}

// =============================================================================
// COLUMN
// =============================================================================

/// The 20 columns of the table, in positional order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Column {
    Examiner,
    SecondReviewer,
    StudentId,
    Surname,
    FirstName,
    FieldOfStudy,
    Degree,
    ExaminationRegulations,
    Title,
    StartDate,
    Account,
    PrivateEmail,
    Phone,
    DirectoryListing,
    PostalAddress,
    Language,
    Birthdate,
    Birthplace,
    Approved,
    Comments,
}

impl Column {
    /// All columns in table order.
    pub const ALL: [Column; COLUMN_COUNT] = [
        Column::Examiner,
        Column::SecondReviewer,
        Column::StudentId,
        Column::Surname,
        Column::FirstName,
        Column::FieldOfStudy,
        Column::Degree,
        Column::ExaminationRegulations,
        Column::Title,
        Column::StartDate,
        Column::Account,
        Column::PrivateEmail,
        Column::Phone,
        Column::DirectoryListing,
        Column::PostalAddress,
        Column::Language,
        Column::Birthdate,
        Column::Birthplace,
        Column::Approved,
        Column::Comments,
    ];

    /// Columns cleared when a record opts out of the alumni directory.
    pub const REDACTED_ON_OPT_OUT: [Column; 3] =
        [Column::PrivateEmail, Column::Phone, Column::PostalAddress];

    /// 1-based column number in the table.
    #[must_use]
    pub const fn index(self) -> u32 {
        self as u32 + 1
    }

    /// 0-based offset into a row's cells.
    #[must_use]
    pub const fn offset(self) -> usize {
        self as usize
    }

    /// Header text written into row 1.
    #[must_use]
    pub const fn header(self) -> &'static str {
        match self {
            Column::Examiner => "Examiner",
            Column::SecondReviewer => "Second Reviewer",
            Column::StudentId => "Student ID",
            Column::Surname => "Surname",
            Column::FirstName => "First name",
            Column::FieldOfStudy => "Field of study",
            Column::Degree => "Degree",
            Column::ExaminationRegulations => "Examination Regulations",
            Column::Title => "Title",
            Column::StartDate => "Start Date",
            Column::Account => "Uni account",
            Column::PrivateEmail => "Private Email",
            Column::Phone => "Phone",
            Column::DirectoryListing => "Storage in alumni directory",
            Column::PostalAddress => "Postal Address",
            Column::Language => "Language",
            Column::Birthdate => "Birthdate",
            Column::Birthplace => "Birthplace",
            Column::Approved => "zugelassen",
            Column::Comments => "Additional Comments",
        }
    }
}

// =============================================================================
// TABLE ROW
// =============================================================================

/// One data row of the table, exactly [`COLUMN_COUNT`] cells wide.
///
/// An empty string is an empty (null) cell.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableRow {
    cells: [String; COLUMN_COUNT],
}

impl TableRow {
    /// Build the row that a parsed record is written as.
    ///
    /// Fields map positionally onto columns; fields past the last column are
    /// dropped. When the directory-listing column holds `"false"` (any case),
    /// the private email, phone and postal address cells are left empty.
    #[must_use]
    pub fn from_record(record: &ParsedRecord) -> Self {
        let mut row = Self::default();
        for (cell, field) in row.cells.iter_mut().zip(&record.fields) {
            cell.clone_from(field);
        }
        if row.is_opted_out() {
            for column in Column::REDACTED_ON_OPT_OUT {
                row.cells[column.offset()].clear();
            }
        }
        row
    }

    /// Build a row from raw cell texts, as read back from the table.
    #[must_use]
    pub fn from_cells(cells: [String; COLUMN_COUNT]) -> Self {
        Self { cells }
    }

    /// Whether the record opted out of the alumni directory.
    #[must_use]
    pub fn is_opted_out(&self) -> bool {
        self[Column::DirectoryListing].eq_ignore_ascii_case(OPT_OUT_LITERAL)
    }

    /// Iterate over `(column, text)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (Column, &str)> {
        Column::ALL
            .iter()
            .zip(self.cells.iter())
            .map(|(column, cell)| (*column, cell.as_str()))
    }

    /// Content digest of the row, as used to seed the duplicate sets.
    #[must_use]
    pub fn content_hash(&self) -> ProcessedHash {
        ProcessedHash::of_cells(self.cells.iter().map(String::as_str))
    }

    /// The identity key held in column 3.
    #[must_use]
    pub fn identity(&self) -> IdentityKey {
        IdentityKey::new(&self[Column::StudentId])
    }
}

impl Index<Column> for TableRow {
    type Output = str;

    fn index(&self, column: Column) -> &str {
        &self.cells[column.offset()]
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the scanvault pipeline.
///
/// - No silent failures
/// - Use `Result<T, ScanVaultError>` for fallible operations
/// - The pipeline should never panic; one bad record or cycle is recoverable
#[derive(Debug, Error)]
pub enum ScanVaultError {
    /// A staging line cannot be turned into a record.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// A file of the pipeline could not be read or written.
    #[error("I/O error: {0}")]
    Io(String),

    /// The table store failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A value could not be serialized or deserialized.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration is missing or inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> ParsedRecord {
        ParsedRecord::new(
            fields.iter().map(|f| f.to_string()).collect(),
            IdentityKey::new(fields.get(2).copied().unwrap_or_default()),
        )
    }

    fn full_fields(directory_listing: &str) -> Vec<String> {
        Column::ALL
            .iter()
            .map(|c| match c {
                Column::DirectoryListing => directory_listing.to_string(),
                other => format!("v{}", other.index()),
            })
            .collect()
    }

    #[test]
    fn column_indices_are_one_based_and_ordered() {
        for (i, column) in Column::ALL.iter().enumerate() {
            assert_eq!(column.index() as usize, i + 1);
        }
        assert_eq!(Column::StudentId.index(), 3);
        assert_eq!(Column::DirectoryListing.index(), 14);
        assert_eq!(Column::PrivateEmail.index(), 12);
        assert_eq!(Column::Phone.index(), 13);
        assert_eq!(Column::PostalAddress.index(), 15);
    }

    #[test]
    fn row_caps_at_twenty_columns() {
        let mut fields: Vec<&str> = vec!["x"; 25];
        fields[2] = "123456";
        let row = TableRow::from_record(&record(&fields));
        assert_eq!(row.iter().count(), COLUMN_COUNT);
        assert_eq!(&row[Column::Comments], "x");
    }

    #[test]
    fn short_record_leaves_trailing_cells_empty() {
        let row = TableRow::from_record(&record(&["Alice", "Bob", "123456"]));
        assert_eq!(&row[Column::Examiner], "Alice");
        assert_eq!(&row[Column::StudentId], "123456");
        assert_eq!(&row[Column::Surname], "");
        assert_eq!(&row[Column::Comments], "");
    }

    #[test]
    fn opt_out_clears_private_columns() {
        for flag in ["false", "FALSE", "False"] {
            let rec = ParsedRecord::new(full_fields(flag), IdentityKey::new("v3"));
            let row = TableRow::from_record(&rec);
            assert_eq!(&row[Column::PrivateEmail], "");
            assert_eq!(&row[Column::Phone], "");
            assert_eq!(&row[Column::PostalAddress], "");
            assert_eq!(&row[Column::DirectoryListing], flag);
            assert_eq!(&row[Column::Language], "v16");
        }
    }

    #[test]
    fn opt_in_keeps_private_columns() {
        let rec = ParsedRecord::new(full_fields("true"), IdentityKey::new("v3"));
        let row = TableRow::from_record(&rec);
        assert_eq!(&row[Column::PrivateEmail], "v12");
        assert_eq!(&row[Column::Phone], "v13");
        assert_eq!(&row[Column::PostalAddress], "v15");
    }

    #[test]
    fn hash_is_sha256_base64() {
        let hash = ProcessedHash::of_cells(["a", " b "]);
        // SHA-256("ab")
        assert_eq!(
            hash.as_str(),
            "+44g/C5MPySMYMOb1lLzwTRymLuXe4tNWQO4UFViBgM="
        );
    }

    #[test]
    fn hash_ignores_cell_boundaries() {
        assert_eq!(
            ProcessedHash::of_cells(["ab", ""]),
            ProcessedHash::of_cells(["a", "b"])
        );
    }

    #[test]
    fn identity_key_trims() {
        let key = IdentityKey::new("  123456 ");
        assert_eq!(key.as_str(), "123456");
        assert!(!key.is_empty());
        assert!(IdentityKey::new("   ").is_empty());
    }
}
