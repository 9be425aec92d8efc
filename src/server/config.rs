//! Configuration loading for munind.
//!
//! Configuration is loaded from TOML files with the following resolution
//! order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.muninn/config.toml` (user)
//! 3. `/etc/muninn/config.toml` (system)
//!
//! AWS credentials are not configured here; the DynamoDB client reads
//! the ambient environment (shared config files, env vars, instance
//! metadata) like any other AWS tool.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::BucketParams;
use crate::store;
use crate::{MuninnError, Result};

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Server network configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:9780).
    #[serde(default = "default_address")]
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:9780".to_string()
}

/// Backing store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// DynamoDB table name (default: LatestFiles).
    #[serde(default = "default_table")]
    pub table: String,
    /// AWS region override. When absent, the ambient environment decides.
    #[serde(default)]
    pub region: Option<String>,
    /// Point-lookup timeout in seconds (default: 10). Expiry is reported
    /// as an internal error, never as rate limiting.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            region: None,
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

fn default_table() -> String {
    store::DEFAULT_TABLE.to_string()
}

fn default_fetch_timeout() -> u64 {
    10
}

/// Rate-limit parameters for both bucket classes.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Per-identifier bucket for identifiers with a cache entry
    /// (default: 2/min, burst 10).
    #[serde(default = "default_known")]
    pub known: RateConfig,
    /// Shared bucket for never-seen identifiers (default: 4/min,
    /// burst 20).
    #[serde(default = "default_unseen")]
    pub unseen: RateConfig,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            known: default_known(),
            unseen: default_unseen(),
        }
    }
}

/// One bucket's rate and burst.
#[derive(Debug, Clone, Deserialize)]
pub struct RateConfig {
    pub per_minute: u32,
    pub burst: u32,
}

impl RateConfig {
    pub fn params(&self) -> BucketParams {
        BucketParams {
            reqs_per_minute: self.per_minute,
            burst_capacity: self.burst,
        }
    }
}

fn default_known() -> RateConfig {
    RateConfig {
        per_minute: BucketParams::KNOWN_DEFAULT.reqs_per_minute,
        burst: BucketParams::KNOWN_DEFAULT.burst_capacity,
    }
}

fn default_unseen() -> RateConfig {
    RateConfig {
        per_minute: BucketParams::UNSEEN_DEFAULT.reqs_per_minute,
        burst: BucketParams::UNSEEN_DEFAULT.burst_capacity,
    }
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided)
    /// 2. `~/.muninn/config.toml`
    /// 3. `/etc/muninn/config.toml`
    ///
    /// When no file exists anywhere, built-in defaults apply.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let Some(path) = Self::resolve_config_path(explicit_path)? else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(&path).map_err(|e| {
            MuninnError::Configuration(format!("failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            MuninnError::Configuration(format!("failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path. `Ok(None)` means no file anywhere,
    /// which is only an error when a path was requested explicitly.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(MuninnError::Configuration(format!(
                "config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".muninn").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = PathBuf::from("/etc/muninn/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }
}
