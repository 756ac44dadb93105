//! # scanvault CLI Module
//!
//! This module implements the CLI interface for scanvault.
//!
//! ## Available Commands
//!
//! - `run` - Run the consolidation worker until Ctrl+C
//! - `once` - Run a single consolidation cycle
//! - `capture` - Stage raw scans read from stdin
//! - `status` - Show table and staging status
//! - `export` - Export the table to JSON or TSV
//! - `init` - Create the data files

mod commands;

use crate::config::Config;
use clap::{Parser, Subcommand};
use scanvault_core::ScanVaultError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// scanvault - scanned form consolidation
///
/// Drains a staging log of scanner lines into a deduplicated table.
#[derive(Parser, Debug)]
#[command(name = "scanvault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the data files (overrides config and environment)
    #[arg(short = 'd', long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the consolidation worker
    Run {
        /// Serve /health and /status on this address
        #[arg(long)]
        status_addr: Option<String>,

        /// Seconds between cycles
        #[arg(short, long)]
        interval: Option<u64>,

        /// Reject records whose row content is already known
        #[arg(long)]
        content_hash_dedup: bool,
    },

    /// Run a single consolidation cycle
    Once,

    /// Stage raw scans read from stdin, one per line
    Capture,

    /// Show table and staging status
    Status,

    /// Export the table
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format (json, tsv)
        #[arg(short = 't', long, default_value = "json")]
        format: String,
    },

    /// Create the data files
    Init,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Resolve the configuration for this invocation.
pub fn resolve_config(cli: &Cli) -> Result<Config, ScanVaultError> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }

    if let Some(Commands::Run {
        status_addr,
        interval,
        content_hash_dedup,
    }) = &cli.command
    {
        if let Some(addr) = status_addr {
            config.status_addr = Some(addr.clone());
        }
        if let Some(secs) = interval {
            config.poll_interval_secs = *secs;
        }
        if *content_hash_dedup {
            config.content_hash_dedup = true;
        }
    }

    config.validate()?;
    Ok(config)
}

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), ScanVaultError> {
    let config = resolve_config(&cli)?;
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Run { .. }) => cmd_run(config).await,
        Some(Commands::Once) => cmd_once(&config, json_mode),
        Some(Commands::Capture) => cmd_capture(&config, json_mode),
        Some(Commands::Status) => cmd_status(&config, json_mode),
        Some(Commands::Export { output, format }) => cmd_export(&config, &output, &format),
        Some(Commands::Init) => cmd_init(&config, json_mode),
        None => {
            // No subcommand - show status by default
            cmd_status(&config, json_mode)
        }
    }
}
