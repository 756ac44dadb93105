//! # scanvault
//!
//! Service side of the scanvault pipeline: configuration, the polling worker,
//! the read-only status API and the CLI built on top of them.
//!
//! The pipeline itself lives in `scanvault-core`; this crate hosts it on a
//! tokio runtime and owns logging.

pub mod api;
pub mod cli;
pub mod config;
pub mod worker;

pub use config::Config;
pub use worker::{SharedStats, Worker, WorkerState, WorkerStats};
