//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! `status` and `export` only read the artifacts and create nothing. redb
//! locks the table file, so they (like `once` and `init`) cannot run against
//! a data directory a `run` worker has open; use the status endpoint instead.

use crate::api::{self, AppState};
use crate::config::Config;
use crate::worker::{Worker, log_report};
use scanvault_core::{
    Capture, CaptureOutcome, Column, Consolidator, CycleReport, ErrorLog, HashLog,
    PipelineStatus, RedbSheetStore, ScanVaultError, SheetStore, StagingLog, TableAppender,
    Worksheet,
};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tokio::sync::watch;

/// Validate output path for export.
///
/// The parent directory must exist; the file itself may not.
fn validate_output_path(path: &Path) -> Result<PathBuf, ScanVaultError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        ScanVaultError::Io(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(ScanVaultError::Io(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| ScanVaultError::Io("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

fn print_json(value: &impl serde::Serialize) -> Result<(), ScanVaultError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| ScanVaultError::Serialization(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

// =============================================================================
// RUN COMMAND
// =============================================================================

/// Run the worker until Ctrl+C.
pub async fn cmd_run(config: Config) -> Result<(), ScanVaultError> {
    let worker = Worker::new(&config);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    println!("scanvault worker starting...");
    println!();
    println!("Configuration:");
    println!("  Staging log: {}", config.paths().staging_log.display());
    println!("  Table:       {}", config.paths().table.display());
    println!("  Interval:    {}s", config.poll_interval_secs);
    println!("  Hash policy: {:?}", config.hash_policy());
    if let Some(addr) = &config.status_addr {
        println!("  Status:      http://{}/status", addr);
    }
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let server = config.status_addr.clone().map(|addr| {
        let state = AppState::new(&config, worker.stats());
        let rx = shutdown_rx.clone();
        tokio::spawn(async move {
            if let Err(e) = api::run_server(&addr, state, rx).await {
                tracing::error!(error = %e, "status endpoint failed");
            }
        })
    });

    let worker_task = tokio::spawn(worker.run(shutdown_rx));

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown requested, finishing the current cycle"),
        Err(e) => tracing::error!(error = %e, "cannot listen for Ctrl+C, stopping"),
    }
    let _ = shutdown_tx.send(true);

    worker_task
        .await
        .map_err(|e| ScanVaultError::Io(format!("Worker task failed: {}", e)))?;
    if let Some(server) = server {
        server
            .await
            .map_err(|e| ScanVaultError::Io(format!("Status task failed: {}", e)))?;
    }

    Ok(())
}

// =============================================================================
// ONCE COMMAND
// =============================================================================

/// Run one consolidation cycle and print its report.
pub fn cmd_once(config: &Config, json_mode: bool) -> Result<(), ScanVaultError> {
    let mut consolidator = Consolidator::open(&config.paths(), config.hash_policy())?;
    let report = consolidator.run_cycle()?;
    log_report(&report);

    if json_mode {
        return print_json(&report);
    }

    print_report(&report);
    Ok(())
}

fn print_report(report: &CycleReport) {
    if report.is_idle() {
        println!("Nothing staged.");
        return;
    }

    println!("Consolidation Cycle");
    println!("===================");
    if report.already_committed {
        println!("(released an unfinished batch that was already saved)");
        return;
    }
    if report.recovered {
        println!("(replayed an unfinished batch)");
    }
    println!("Lines read:  {}", report.lines_read);
    println!("Appended:    {}", report.appended.len());
    println!("Invalid:     {}", report.invalid.len());
    println!("Duplicates:  {}", report.duplicates.len());
    println!("Saved:       {}", report.saved);

    for row in &report.appended {
        println!("  + row {:>5}  {}", row.row, row.identity);
    }
    for dup in &report.duplicates {
        println!("  = {} ({})", dup.identity, dup.reason);
    }
    for invalid in &report.invalid {
        println!("  ! {} ({})", invalid.line, invalid.reason);
    }
}

// =============================================================================
// CAPTURE COMMAND
// =============================================================================

/// Stage raw scans read from stdin.
pub fn cmd_capture(config: &Config, json_mode: bool) -> Result<(), ScanVaultError> {
    let staging = StagingLog::open(&config.paths().staging_log)?;
    let mut capture = Capture::open(staging)?;

    let (mut saved, mut duplicates, mut invalid) = (0usize, 0usize, 0usize);
    for line in std::io::stdin().lock().lines() {
        let line = line.map_err(|e| ScanVaultError::Io(format!("Read stdin: {}", e)))?;
        match capture.submit(&line)? {
            CaptureOutcome::Saved(identity) => {
                saved += 1;
                tracing::info!(identity = %identity, "scan saved");
                if !json_mode {
                    println!("Data saved successfully: {}", identity);
                }
            }
            CaptureOutcome::Duplicate(identity) => {
                duplicates += 1;
                tracing::warn!(identity = %identity, "duplicate scan ignored");
                if !json_mode {
                    println!("Duplicate Student ID detected: {}", identity);
                }
            }
            CaptureOutcome::Invalid => {
                invalid += 1;
                if !json_mode {
                    println!("Invalid data format. Scan again.");
                }
            }
        }
    }

    if json_mode {
        return print_json(&serde_json::json!({
            "saved": saved,
            "duplicates": duplicates,
            "invalid": invalid,
        }));
    }
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show table and staging status.
pub fn cmd_status(config: &Config, json_mode: bool) -> Result<(), ScanVaultError> {
    let paths = config.paths();
    let status = PipelineStatus::inspect(&paths, config.hash_policy())?;

    if json_mode {
        return print_json(&status);
    }

    println!("scanvault Status");
    println!("================");
    println!("Staging log: {}", paths.staging_log.display());
    println!("Table:       {}", paths.table.display());
    println!();
    println!("Header:           {}", if status.has_header { "yes" } else { "no" });
    println!("Data rows:        {}", status.data_rows);
    println!("Known identities: {}", status.known_identities);
    println!("Known hashes:     {}", status.known_hashes);
    println!("Staged lines:     {}", status.staged_lines);
    println!("Unfinished batch: {}", status.claimed_batch_pending);
    println!("Hash policy:      {}", status.hash_policy);

    Ok(())
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Export the table.
pub fn cmd_export(config: &Config, output: &Path, format: &str) -> Result<(), ScanVaultError> {
    let output = validate_output_path(output)?;
    let sheet = RedbSheetStore::read_existing(&config.paths().table)?;

    let text = match format {
        "json" => export_json(&sheet)?,
        "tsv" => export_tsv(&sheet),
        other => {
            return Err(ScanVaultError::Config(format!(
                "Unknown export format '{}'. Use: json, tsv",
                other
            )));
        }
    };

    std::fs::write(&output, text)
        .map_err(|e| ScanVaultError::Io(format!("Write '{}': {}", output.display(), e)))?;

    let rows = TableAppender::data_rows(&sheet).len();
    tracing::info!(rows, output = %output.display(), "table exported");
    println!("Exported {} rows to {}", rows, output.display());
    Ok(())
}

/// One JSON object per data row, keyed by column header in table order.
pub fn export_json(sheet: &Worksheet) -> Result<String, ScanVaultError> {
    let rows: Vec<serde_json::Value> = TableAppender::data_rows(sheet)
        .into_iter()
        .map(|row| {
            let table_row = sheet.table_row(row);
            let object: serde_json::Map<String, serde_json::Value> = table_row
                .iter()
                .map(|(column, text)| (column.header().to_string(), text.into()))
                .collect();
            serde_json::Value::Object(object)
        })
        .collect();

    serde_json::to_string_pretty(&rows).map_err(|e| ScanVaultError::Serialization(e.to_string()))
}

/// Header line plus one tab-separated line per data row.
pub fn export_tsv(sheet: &Worksheet) -> String {
    let mut out = Column::ALL
        .iter()
        .map(|c| c.header())
        .collect::<Vec<_>>()
        .join("\t");
    out.push('\n');

    for row in TableAppender::data_rows(sheet) {
        let table_row = sheet.table_row(row);
        let line = table_row
            .iter()
            .map(|(_, text)| text.replace(['\t', '\n'], " "))
            .collect::<Vec<_>>()
            .join("\t");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Create the four data files.
pub fn cmd_init(config: &Config, json_mode: bool) -> Result<(), ScanVaultError> {
    let paths = config.paths();
    StagingLog::open(&paths.staging_log)?;
    ErrorLog::open(&paths.error_log)?;
    HashLog::open(&paths.hash_log)?;
    let sheet = RedbSheetStore::open(&paths.table)?.load()?;
    let data_rows = TableAppender::data_rows(&sheet).len();

    if json_mode {
        return print_json(&serde_json::json!({
            "staging_log": paths.staging_log.display().to_string(),
            "table": paths.table.display().to_string(),
            "hash_log": paths.hash_log.display().to_string(),
            "error_log": paths.error_log.display().to_string(),
            "data_rows": data_rows,
        }));
    }

    println!("Initialized scanvault data files:");
    println!("  {}", paths.staging_log.display());
    println!("  {}", paths.table.display());
    println!("  {}", paths.hash_log.display());
    println!("  {}", paths.error_log.display());
    if data_rows > 0 {
        println!("Existing table kept ({} rows).", data_rows);
    }
    Ok(())
}
