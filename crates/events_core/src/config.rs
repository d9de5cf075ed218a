//! Environment configuration.
//!
//! Variables:
//! - `EVENTS_DB_PATH`: event store file (default `events.sqlite3`).
//! - `EVENTS_LOG_LEVEL`: `trace|debug|info|warn|error` (default per build mode).
//! - `EVENTS_LOG_DIR`: absolute log directory; file logging is off when unset.

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "events.sqlite3";

/// Core runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: &'static str,
    pub log_dir: Option<PathBuf>,
}

/// Configuration error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value } => {
                write!(f, "invalid value `{value}` for environment variable {key}")
            }
        }
    }
}

impl Error for ConfigError {}

impl CoreConfig {
    /// Loads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let db_path = read("EVENTS_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        let log_level = match read("EVENTS_LOG_LEVEL") {
            Some(value) => normalize_level(&value).map_err(|_| ConfigError::InvalidValue {
                key: "EVENTS_LOG_LEVEL",
                value,
            })?,
            None => default_log_level(),
        };

        let log_dir = match read("EVENTS_LOG_DIR").map(PathBuf::from) {
            Some(dir) if !dir.is_absolute() => {
                return Err(ConfigError::InvalidValue {
                    key: "EVENTS_LOG_DIR",
                    value: dir.display().to_string(),
                });
            }
            other => other,
        };

        Ok(Self {
            db_path,
            log_level,
            log_dir,
        })
    }
}
