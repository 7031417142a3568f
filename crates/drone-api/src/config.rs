//! # API Configuration
//!
//! Environment-based configuration for the dispatch API service.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use drone_persistence::StorageBackend;
use thiserror::Error;

const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_UPLOAD_DIR: &str = "./uploads";
const DEFAULT_UPLOAD_SIZE_MB: usize = 10;
const DEFAULT_IO_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_AUDIT_INTERVAL_SECS: u64 = 60;

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub server_addr: SocketAddr,

    /// Drone storage backend
    pub storage: StorageBackend,

    /// Directory receiving medication pictures
    pub upload_dir: PathBuf,

    /// Maximum request body size for uploads, in bytes
    pub max_upload_bytes: usize,

    /// Battery audit period; `None` disables the audit
    pub battery_audit_interval: Option<Duration>,

    /// Logging level
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for any value that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value source
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for any value that does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let server_addr: SocketAddr = parse_or(&lookup, "SERVER_ADDR", || {
            DEFAULT_SERVER_ADDR.parse().ok()
        })?;

        let io_timeout_ms: u64 = parse_or(&lookup, "STORAGE_IO_TIMEOUT_MS", || {
            Some(DEFAULT_IO_TIMEOUT_MS)
        })?;
        let data_dir =
            PathBuf::from(lookup("DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()));

        let storage = match lookup("STORAGE_BACKEND") {
            None => StorageBackend::InMemory,
            Some(kind) if kind.eq_ignore_ascii_case("memory") => StorageBackend::InMemory,
            Some(kind) if kind.eq_ignore_ascii_case("json") => StorageBackend::JsonFile {
                root: data_dir,
                io_timeout: Duration::from_millis(io_timeout_ms),
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "STORAGE_BACKEND",
                    value: other,
                });
            }
        };

        let upload_size_mb: usize = parse_or(&lookup, "UPLOAD_SIZE_MB", || {
            Some(DEFAULT_UPLOAD_SIZE_MB)
        })?;
        let max_upload_bytes =
            upload_size_mb
                .checked_mul(1024 * 1024)
                .ok_or_else(|| ConfigError::Invalid {
                    key: "UPLOAD_SIZE_MB",
                    value: upload_size_mb.to_string(),
                })?;

        let audit_secs: u64 = parse_or(&lookup, "BATTERY_AUDIT_INTERVAL_SECS", || {
            Some(DEFAULT_AUDIT_INTERVAL_SECS)
        })?;

        Ok(Self {
            server_addr,
            storage,
            upload_dir: PathBuf::from(
                lookup("UPLOAD_DIR").unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string()),
            ),
            max_upload_bytes,
            battery_audit_interval: (audit_secs > 0).then(|| Duration::from_secs(audit_secs)),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// Parse `key` if set, otherwise fall back to `default`.
fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: impl FnOnce() -> Option<T>,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => default().ok_or(ConfigError::Invalid {
            key,
            value: String::new(),
        }),
    }
}
