//! # Property-Based Tests
//!
//! Invariants of the pipeline checked over generated inputs with proptest.

use proptest::collection::vec;
use proptest::prelude::*;
use scanvault_core::{
    Column, Consolidator, ErrorLog, HashLog, HashPolicy, MemorySheetStore, Parser, PipelinePaths,
    StagingLog, TableAppender,
};
use std::collections::BTreeSet;
use tempfile::tempdir;

fn memory_consolidator(dir: &std::path::Path) -> Consolidator {
    let paths = PipelinePaths::in_dir(dir);
    Consolidator::new(
        StagingLog::open(&paths.staging_log).expect("staging"),
        Box::new(MemorySheetStore::new()),
        ErrorLog::open(&paths.error_log).expect("error log"),
        HashLog::open(&paths.hash_log).expect("hash log"),
        HashPolicy::SeedOnly,
    )
    .expect("consolidator")
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Cleaning is idempotent.
    #[test]
    fn clean_is_idempotent(raw in "[ \\t\\r\\na-z0-9']{0,60}") {
        let once = Parser::clean(&raw);
        prop_assert_eq!(Parser::clean(&once), once.clone());
        prop_assert!(!once.starts_with(' '));
        prop_assert!(!once.ends_with(' '));
        prop_assert!(!once.contains("  "));
    }

    /// Parsing never panics, and accepted identities are 6+ ASCII digits.
    #[test]
    fn parse_accepts_only_numeric_identities(raw in "[a-z0-9' ]{0,40}") {
        if let Ok(record) = Parser::parse_line(&raw) {
            let key = record.identity.as_str();
            prop_assert!(key.len() >= 6);
            prop_assert!(key.bytes().all(|b| b.is_ascii_digit()));
        }
    }

    /// Whatever batches arrive, no identity appears in two rows.
    #[test]
    fn no_duplicate_identities_across_cycles(
        batches in vec(vec(100_000u32..100_020, 0..8), 1..5)
    ) {
        let temp = tempdir().expect("temp dir");
        let mut c = memory_consolidator(temp.path());
        let mut expected = BTreeSet::new();

        for batch in &batches {
            for id in batch {
                c.staging()
                    .append(&format!("'Examiner'Reviewer'{}'Surname", id))
                    .expect("append");
                expected.insert(id.to_string());
            }
            c.run_cycle().expect("cycle");
        }

        let sheet = c.load_sheet().expect("load");
        let ids: Vec<String> = TableAppender::data_rows(&sheet)
            .into_iter()
            .map(|row| sheet.text(row, Column::StudentId.index()).to_string())
            .collect();
        let unique: BTreeSet<String> = ids.iter().cloned().collect();

        prop_assert_eq!(ids.len(), unique.len());
        prop_assert_eq!(unique, expected);
    }

    /// Rows are contiguous from row 2, one per admitted record.
    #[test]
    fn rows_are_contiguous(count in 1usize..15) {
        let temp = tempdir().expect("temp dir");
        let mut c = memory_consolidator(temp.path());
        for i in 0..count {
            c.staging()
                .append(&format!("'E'R'{}'S", 200_000 + i))
                .expect("append");
        }
        let report = c.run_cycle().expect("cycle");

        let rows: Vec<u32> = report.appended.iter().map(|a| a.row).collect();
        let expected: Vec<u32> = (2..2 + count as u32).collect();
        prop_assert_eq!(rows, expected);
    }
}
