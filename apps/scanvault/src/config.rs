//! # Configuration
//!
//! Layered, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config`)
//! 3. Environment variables
//! 4. CLI flags
//!
//! ## Environment Variables
//!
//! - `SCANVAULT_DATA_DIR`: directory holding the four artifacts (default: ".")
//! - `SCANVAULT_POLL_INTERVAL_SECS`: delay between cycles (default: 5)
//! - `SCANVAULT_CONTENT_HASH_DEDUP`: "true"/"1" rejects known row content
//! - `SCANVAULT_STATUS_ADDR`: bind address of the status endpoint

use scanvault_core::primitives::DEFAULT_POLL_INTERVAL_SECS;
use scanvault_core::{HashPolicy, PipelinePaths, ScanVaultError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_DATA_DIR: &str = "SCANVAULT_DATA_DIR";
pub const ENV_POLL_INTERVAL_SECS: &str = "SCANVAULT_POLL_INTERVAL_SECS";
pub const ENV_CONTENT_HASH_DEDUP: &str = "SCANVAULT_CONTENT_HASH_DEDUP";
pub const ENV_STATUS_ADDR: &str = "SCANVAULT_STATUS_ADDR";

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding the default artifact files.
    pub data_dir: PathBuf,
    /// Explicit staging log path; defaults to `<data_dir>/scanned.txt`.
    pub staging_log: Option<PathBuf>,
    /// Explicit table path; defaults to `<data_dir>/ScannedData.redb`.
    pub table: Option<PathBuf>,
    /// Explicit hash log path; defaults to `<data_dir>/ProcessedHashes.txt`.
    pub hash_log: Option<PathBuf>,
    /// Explicit error log path; defaults to `<data_dir>/ErrorLogs.txt`.
    pub error_log: Option<PathBuf>,
    /// Seconds between two consolidation cycles.
    pub poll_interval_secs: u64,
    /// Reject records whose row content hash is already known.
    pub content_hash_dedup: bool,
    /// Bind address of the status endpoint; disabled when unset.
    pub status_addr: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            staging_log: None,
            table: None,
            hash_log: None,
            error_log: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            content_hash_dedup: false,
            status_addr: None,
        }
    }
}

impl Config {
    /// Defaults, then the optional TOML file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ScanVaultError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ScanVaultError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ScanVaultError::Config(format!("Cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    /// Parse TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ScanVaultError> {
        toml::from_str(text).map_err(|e| ScanVaultError::Config(format!("Invalid TOML: {}", e)))
    }

    /// Apply environment overrides read through `get`.
    pub fn apply_env_with<F>(&mut self, get: F) -> Result<(), ScanVaultError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = get(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }

        if let Some(raw) = get(ENV_POLL_INTERVAL_SECS) {
            self.poll_interval_secs = raw.trim().parse().map_err(|e| {
                ScanVaultError::Config(format!(
                    "{}='{}' is not a number of seconds: {}",
                    ENV_POLL_INTERVAL_SECS, raw, e
                ))
            })?;
        }

        if let Some(raw) = get(ENV_CONTENT_HASH_DEDUP) {
            self.content_hash_dedup = parse_flag(ENV_CONTENT_HASH_DEDUP, &raw)?;
        }

        if let Some(addr) = get(ENV_STATUS_ADDR) {
            let addr = addr.trim();
            self.status_addr = (!addr.is_empty()).then(|| addr.to_string());
        }

        Ok(())
    }

    /// Reject values the worker cannot run with.
    pub fn validate(&self) -> Result<(), ScanVaultError> {
        if self.poll_interval_secs == 0 {
            return Err(ScanVaultError::Config(
                "poll_interval_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolved artifact locations.
    #[must_use]
    pub fn paths(&self) -> PipelinePaths {
        let defaults = PipelinePaths::in_dir(&self.data_dir);
        PipelinePaths {
            staging_log: self.staging_log.clone().unwrap_or(defaults.staging_log),
            table: self.table.clone().unwrap_or(defaults.table),
            hash_log: self.hash_log.clone().unwrap_or(defaults.hash_log),
            error_log: self.error_log.clone().unwrap_or(defaults.error_log),
        }
    }

    /// Hash policy selected by `content_hash_dedup`.
    #[must_use]
    pub fn hash_policy(&self) -> HashPolicy {
        if self.content_hash_dedup {
            HashPolicy::RejectKnownContent
        } else {
            HashPolicy::SeedOnly
        }
    }

    /// Delay between two cycles.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ScanVaultError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ScanVaultError::Config(format!(
            "{}='{}' is not a boolean",
            key, other
        ))),
    }
}
