//! # Node Configuration
//!
//! One JSON document with a section per concern, every field defaulted.
//! Loaded from `BG_CONFIG` when set, then overridden by environment
//! variables:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `BG_HTTP_PORT` | `http.port` |
//! | `BG_STORAGE_BACKEND` | `storage.backend` (`memory` / `file`) |
//! | `BG_DATA_PATH` | `storage.data_path` |
//! | `BG_TX_TIMEOUT_MS` | `governance.transaction_timeout_ms` |
//! | `BG_SEED` | `seed.fixtures_path` |

use bg_api_gateway::domain::{CorsConfig, HttpConfig, TimeoutConfig};
use bg_api_gateway::GatewayConfig;
use bg_governance::{GovernanceConfig, QuorumPolicy};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// HTTP gateway configuration.
    pub http: HttpSection,
    /// Document store configuration.
    pub storage: StorageConfig,
    /// Governance transaction configuration.
    pub governance: GovernanceSection,
    /// Fixture seeding configuration.
    pub seed: SeedConfig,
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    pub host: IpAddr,
    pub port: u16,
    /// Whole-request deadline in milliseconds.
    pub request_timeout: u64,
    pub cors: CorsConfig,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8080,
            request_timeout: 10_000,
            cors: CorsConfig::default(),
        }
    }
}

/// Which document store adapter backs the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "file" => Ok(StorageBackend::File),
            other => Err(format!("unknown storage backend: {}", other)),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Snapshot file of the `file` backend.
    pub data_path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            data_path: Some(PathBuf::from("./data/governance.json")),
        }
    }
}

/// Governance transaction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceSection {
    pub transaction_timeout_ms: u64,
    pub max_vote_retries: u32,
    pub retry_backoff_ms: u64,
    /// Bound on the attachment lookup of a vote receipt.
    pub attachment_timeout_ms: u64,
    /// Applied to seeded programs that do not carry their own policy.
    pub default_quorum: QuorumPolicy,
}

impl Default for GovernanceSection {
    fn default() -> Self {
        Self {
            transaction_timeout_ms: 5_000,
            max_vote_retries: 5,
            retry_backoff_ms: 10,
            attachment_timeout_ms: 1_000,
            default_quorum: QuorumPolicy::default(),
        }
    }
}

/// Fixture seeding configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub fixtures_path: Option<PathBuf>,
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("cannot read config file {path}: {message}")]
    Io { path: PathBuf, message: String },

    /// Config file is not valid JSON for `NodeConfig`.
    #[error("cannot parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// Environment override has an unusable value.
    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },

    /// Semantic validation failed.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl NodeConfig {
    /// Defaults, then `BG_CONFIG`, then environment overrides, then
    /// validation.
    pub fn load() -> Result<Self, ConfigError> {
        let lookup = |key: &str| std::env::var(key).ok();
        let mut config = match lookup("BG_CONFIG") {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("BG_HTTP_PORT") {
            self.http.port = parse_env("BG_HTTP_PORT", &value)?;
        }
        if let Some(value) = lookup("BG_STORAGE_BACKEND") {
            self.storage.backend = parse_env("BG_STORAGE_BACKEND", &value)?;
        }
        if let Some(value) = lookup("BG_DATA_PATH") {
            self.storage.data_path = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup("BG_TX_TIMEOUT_MS") {
            self.governance.transaction_timeout_ms = parse_env("BG_TX_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("BG_SEED") {
            self.seed.fixtures_path = Some(PathBuf::from(value));
        }
        Ok(())
    }

    /// Reject zero timeouts, a zero port and a `file` backend without a path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.port == 0 {
            return Err(ConfigError::Invalid("http.port must be non-zero".into()));
        }
        if self.http.request_timeout == 0 {
            return Err(ConfigError::Invalid(
                "http.request_timeout must be non-zero".into(),
            ));
        }
        if self.governance.transaction_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "governance.transaction_timeout_ms must be non-zero".into(),
            ));
        }
        if self.storage.backend == StorageBackend::File && self.storage.data_path.is_none() {
            return Err(ConfigError::Invalid(
                "storage.backend = file requires storage.data_path".into(),
            ));
        }
        Ok(())
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            http: HttpConfig {
                host: self.http.host,
                port: self.http.port,
            },
            timeouts: TimeoutConfig {
                request_ms: self.http.request_timeout,
            },
            cors: self.http.cors.clone(),
        }
    }

    pub fn governance_config(&self) -> GovernanceConfig {
        GovernanceConfig {
            transaction_timeout: Duration::from_millis(self.governance.transaction_timeout_ms),
            max_vote_retries: self.governance.max_vote_retries,
            retry_backoff: Duration::from_millis(self.governance.retry_backoff_ms),
            attachment_timeout: Duration::from_millis(self.governance.attachment_timeout_ms),
        }
    }
}

fn parse_env<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}
