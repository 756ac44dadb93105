//! # scanvault - Scanned Form Consolidation
//!
//! The main binary of the scanvault pipeline.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                  apps/scanvault (THE BINARY)                  │
//! │                                                               │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐   │
//! │  │    CLI      │    │   Worker    │    │   Status API     │   │
//! │  │   (clap)    │    │   (tokio)   │    │     (axum)       │   │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬─────────┘   │
//! │         │                  │                    │             │
//! │         └──────────────────┼────────────────────┘             │
//! │                            ▼                                  │
//! │                   ┌─────────────────┐                         │
//! │                   │ scanvault-core  │                         │
//! │                   │ (THE PIPELINE)  │                         │
//! │                   └─────────────────┘                         │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Run the worker with a status endpoint
//! scanvault -d /srv/scans run --status-addr 127.0.0.1:8090
//!
//! # Stage scans from a file, then consolidate once
//! scanvault -d /srv/scans capture < scans.txt
//! scanvault -d /srv/scans once
//! ```

use clap::Parser;
use scanvault::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // SCANVAULT_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("SCANVAULT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "scanvault=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  scanvault v{}
  staged scans in, one row per student out
"#,
        env!("CARGO_PKG_VERSION")
    );
}
