//! # Pipeline Primitives
//!
//! Hardcoded runtime constants for the scanvault pipeline.
//!
//! The staged line format and the table schema are fixed: they are compiled
//! into the binary and are immutable at runtime.
//!
//! ## Primitives
//!
//! 1. **Framing Primitive**: how a staged line is split into fields.
//! 2. **Identity Primitive**: where the identity key lives and what it looks like.
//! 3. **Layout Primitive**: where the header and the data rows sit in the table.

/// Field delimiter of a staged line.
///
/// Scanner payloads are apostrophe-framed: `'Examiner'Reviewer'123456'...`.
/// Everything before the first delimiter is a framing artifact and discarded.
pub const FIELD_DELIMITER: char = '\'';

/// Position of the identity key in the raw split of a staged line.
///
/// Element 0 is the framing artifact, so this is the 3rd meaningful field,
/// which lands in table column 3 ("Student ID").
pub const IDENTITY_FIELD_INDEX: usize = 3;

/// Minimum number of digits an identity key must have.
pub const MIN_IDENTITY_DIGITS: usize = 6;

/// Number of columns in the fixed table schema.
pub const COLUMN_COUNT: usize = 20;

/// Row holding the column headers.
pub const HEADER_ROW: u32 = 1;

/// First row that holds data.
pub const FIRST_DATA_ROW: u32 = 2;

/// Name of the single sheet of the table.
pub const SHEET_NAME: &str = "Scanned Data";

/// Literal that opts a record out of the alumni directory.
///
/// Compared case-insensitively against column 14.
pub const OPT_OUT_LITERAL: &str = "false";

/// Default delay between two consolidation cycles.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

// =============================================================================
// ARTIFACT FILE NAMES
// =============================================================================

/// Default file name of the staging log inside the data directory.
pub const STAGING_LOG_FILE: &str = "scanned.txt";

/// Default file name of the table database inside the data directory.
pub const TABLE_FILE: &str = "ScannedData.redb";

/// Default file name of the persisted hash log inside the data directory.
pub const HASH_LOG_FILE: &str = "ProcessedHashes.txt";

/// Default file name of the error log inside the data directory.
pub const ERROR_LOG_FILE: &str = "ErrorLogs.txt";

/// Suffix appended to the staging log while a batch is being consolidated.
pub const CLAIMED_SUFFIX: &str = "claimed";

/// Timestamp format prefixed to every error log entry.
pub const ERROR_LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_third_meaningful_field() {
        // Element 0 is discarded, so index 3 is the 3rd meaningful field.
        assert_eq!(IDENTITY_FIELD_INDEX, 3);
    }

    #[test]
    fn data_starts_below_header() {
        assert_eq!(FIRST_DATA_ROW, HEADER_ROW + 1);
    }
}
