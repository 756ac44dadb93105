//! # Parser Module
//!
//! Turns one raw staging line into a [`ParsedRecord`].
//!
//! - Collapse whitespace runs, trim the ends
//! - Split on the apostrophe delimiter, drop the framing artifact
//! - Extract and validate the identity key
//! - Pure: no I/O, failures are returned, never fatal

use crate::primitives::{FIELD_DELIMITER, IDENTITY_FIELD_INDEX, MIN_IDENTITY_DIGITS};
use crate::{IdentityKey, ParsedRecord, ScanVaultError};

/// Result of looking at one staging line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Nothing but whitespace; skipped without a warning.
    Blank,
    /// A record ready for duplicate detection.
    Record(ParsedRecord),
    /// A record that must be dropped, with the reason.
    Invalid(String),
}

/// The Parser handles line cleaning, splitting and identity extraction.
pub struct Parser;

impl Parser {
    /// Collapse every whitespace run to a single space and trim the ends.
    ///
    /// Idempotent: cleaning clean text returns it unchanged.
    #[must_use]
    pub fn clean(raw: &str) -> String {
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Parse one staging line.
    ///
    /// Returns `ScanVaultError::InvalidRecord` if:
    /// - The line has no field after the framing artifact, or it is blank
    /// - The identity field is missing or empty
    /// - The identity field is not a numeric string of at least 6 digits
    pub fn parse_line(raw: &str) -> Result<ParsedRecord, ScanVaultError> {
        let cleaned = Self::clean(raw);
        let mut parts = cleaned.split(FIELD_DELIMITER);

        // Framing artifact
        parts.next();
        let fields: Vec<String> = parts.map(|f| f.trim().to_string()).collect();

        if fields.first().is_none_or(|f| f.is_empty()) {
            return Err(ScanVaultError::InvalidRecord(
                "missing framing: no examiner field after the first delimiter".to_string(),
            ));
        }

        // Offset into `fields`, which no longer holds the framing artifact.
        let identity = fields
            .get(IDENTITY_FIELD_INDEX - 1)
            .map(IdentityKey::new)
            .unwrap_or_else(|| IdentityKey::new(""));

        Self::validate_identity(&identity)?;

        Ok(ParsedRecord::new(fields, identity))
    }

    /// Classify a staging line for the consolidation cycle.
    #[must_use]
    pub fn classify(raw: &str) -> ParseOutcome {
        if raw.trim().is_empty() {
            return ParseOutcome::Blank;
        }
        match Self::parse_line(raw) {
            Ok(record) => ParseOutcome::Record(record),
            Err(ScanVaultError::InvalidRecord(reason)) => ParseOutcome::Invalid(reason),
            Err(other) => ParseOutcome::Invalid(other.to_string()),
        }
    }

    /// Validate an identity key.
    ///
    /// A key is valid if it is non-empty, ASCII digits only, and at least
    /// [`MIN_IDENTITY_DIGITS`] long.
    pub fn validate_identity(identity: &IdentityKey) -> Result<(), ScanVaultError> {
        let key = identity.as_str();

        if key.is_empty() {
            return Err(ScanVaultError::InvalidRecord(
                "missing identity".to_string(),
            ));
        }

        if !key.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ScanVaultError::InvalidRecord(format!(
                "identity '{}' is not numeric",
                key
            )));
        }

        if key.len() < MIN_IDENTITY_DIGITS {
            return Err(ScanVaultError::InvalidRecord(format!(
                "identity '{}' has fewer than {} digits",
                key, MIN_IDENTITY_DIGITS
            )));
        }

        Ok(())
    }

    /// Find the identity the way the capture front-end does.
    ///
    /// Returns the first run of at least [`MIN_IDENTITY_DIGITS`] digits that
    /// is enclosed in delimiters anywhere in the line, regardless of position.
    #[must_use]
    pub fn extract_scanned_identity(cleaned: &str) -> Option<IdentityKey> {
        let mut segments = cleaned.split(FIELD_DELIMITER);
        // A segment is enclosed only if a delimiter precedes and follows it.
        segments.next();
        let mut enclosed: Vec<&str> = segments.collect();
        enclosed.pop();

        enclosed
            .into_iter()
            .find(|s| s.len() >= MIN_IDENTITY_DIGITS && s.bytes().all(|b| b.is_ascii_digit()))
            .map(IdentityKey::new)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_collapses_whitespace() {
        assert_eq!(Parser::clean("  a \t b\r\n c  "), "a b c");
    }

    #[test]
    fn clean_is_idempotent() {
        let once = Parser::clean(" 'Dr.  Smith'\t'Jones'  ");
        assert_eq!(Parser::clean(&once), once);
    }

    #[test]
    fn parse_discards_framing_artifact() {
        let record = Parser::parse_line("junk'Smith'Jones'123456'Doe").expect("valid");
        assert_eq!(record.fields, vec!["Smith", "Jones", "123456", "Doe"]);
        assert_eq!(record.identity.as_str(), "123456");
    }

    #[test]
    fn parse_trims_fields() {
        let record = Parser::parse_line("' Smith ' Jones '  123456  '").expect("valid");
        assert_eq!(record.fields[0], "Smith");
        assert_eq!(record.identity.as_str(), "123456");
    }

    #[test]
    fn parse_comma_separated_quotes() {
        // Literal apostrophe split: separators land between the values.
        let record = Parser::parse_line("'Alice','123456','Bob'").expect("valid");
        assert_eq!(record.fields[0], "Alice");
        assert_eq!(record.fields[1], ",");
        assert_eq!(record.identity.as_str(), "123456");
    }

    #[test]
    fn parse_rejects_missing_identity_field() {
        let result = Parser::parse_line("'Smith'Jones");
        assert!(matches!(result, Err(ScanVaultError::InvalidRecord(_))));
    }

    #[test]
    fn parse_rejects_blank_identity() {
        let result = Parser::parse_line("'Smith'Jones'   'Doe");
        assert!(matches!(result, Err(ScanVaultError::InvalidRecord(_))));
    }

    #[test]
    fn parse_rejects_short_identity() {
        let result = Parser::parse_line("'Smith'Jones'12345'Doe");
        assert!(matches!(result, Err(ScanVaultError::InvalidRecord(_))));
    }

    #[test]
    fn parse_rejects_non_numeric_identity() {
        let result = Parser::parse_line("'Smith'Jones'12345a'Doe");
        assert!(matches!(result, Err(ScanVaultError::InvalidRecord(_))));
    }

    #[test]
    fn parse_rejects_missing_examiner() {
        let result = Parser::parse_line("''Jones'123456'Doe");
        assert!(matches!(result, Err(ScanVaultError::InvalidRecord(_))));
        let result = Parser::parse_line("no delimiter at all");
        assert!(matches!(result, Err(ScanVaultError::InvalidRecord(_))));
    }

    #[test]
    fn classify_blank_lines() {
        assert_eq!(Parser::classify(""), ParseOutcome::Blank);
        assert_eq!(Parser::classify(" \t "), ParseOutcome::Blank);
        assert!(matches!(
            Parser::classify("'a'b'c"),
            ParseOutcome::Invalid(_)
        ));
        assert!(matches!(
            Parser::classify("'a'b'1234567"),
            ParseOutcome::Record(_)
        ));
    }

    #[test]
    fn scanned_identity_requires_enclosing_delimiters() {
        assert_eq!(
            Parser::extract_scanned_identity("'Smith'Jones'1234567'Doe'"),
            Some(IdentityKey::new("1234567"))
        );
        // Trailing run without a closing delimiter does not count.
        assert_eq!(Parser::extract_scanned_identity("'Smith'1234567"), None);
        assert_eq!(Parser::extract_scanned_identity("'12345'"), None);
    }
}
