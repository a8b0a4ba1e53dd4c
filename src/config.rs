//! Configuration
//!
//! Everything tunable comes from `EF_*` environment variables. Unset
//! variables fall back to logged defaults; set but unparsable ones are an
//! error rather than a silent default.

use std::collections::HashMap;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::info;

use crate::domain::task::DEFAULT_DUPLICATE_WINDOW_MS;
use crate::repository::{DEFAULT_MAX_BYTES, DEFAULT_SAVE_DEBOUNCE_MS};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid {key} value '{value}': {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
    #[error("{0} must be set when EF_STORAGE=remote")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// SQLite file on this device
    Local { db_path: PathBuf },
    /// Process memory only
    Memory,
    Remote { url: String, api_key: String },
}

/// Tunables of the todo and persistence rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub save_debounce_ms: u64,
    pub duplicate_window_ms: i64,
    pub rate_min_interval_ms: i64,
    pub rate_window_ms: i64,
    pub rate_max_per_window: u32,
    pub max_storage_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            save_debounce_ms: DEFAULT_SAVE_DEBOUNCE_MS,
            duplicate_window_ms: DEFAULT_DUPLICATE_WINDOW_MS,
            rate_min_interval_ms: 1000,
            rate_window_ms: 60_000,
            rate_max_per_window: 30,
            max_storage_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub storage: StorageBackend,
    /// Rolling log files go here when set
    pub log_dir: Option<PathBuf>,
    pub limits: Limits,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::Memory,
            log_dir: None,
            limits: Limits::default(),
        }
    }
}

impl AppConfig {
    /// Read the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Build from explicit key/value pairs
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Result<Self, ConfigError> {
        let env = Env(vars.into_iter().collect());
        let defaults = Limits::default();

        let storage = match env.get("EF_STORAGE").unwrap_or("local") {
            "local" => StorageBackend::Local {
                db_path: PathBuf::from(env.get("EF_DB_PATH").unwrap_or("engineer-finder.db")),
            },
            "memory" => StorageBackend::Memory,
            "remote" => StorageBackend::Remote {
                url: env.require("EF_REMOTE_URL")?,
                api_key: env.require("EF_REMOTE_KEY")?,
            },
            other => {
                return Err(ConfigError::Invalid {
                    key: "EF_STORAGE".to_string(),
                    value: other.to_string(),
                    reason: "expected local, memory or remote".to_string(),
                })
            }
        };

        let limits = Limits {
            save_debounce_ms: env.try_load("EF_SAVE_DEBOUNCE_MS", defaults.save_debounce_ms)?,
            duplicate_window_ms: env
                .try_load("EF_DUPLICATE_WINDOW_MS", defaults.duplicate_window_ms)?,
            rate_min_interval_ms: env
                .try_load("EF_RATE_MIN_INTERVAL_MS", defaults.rate_min_interval_ms)?,
            rate_max_per_window: env
                .try_load("EF_RATE_MAX_PER_WINDOW", defaults.rate_max_per_window)?,
            ..defaults
        };

        Ok(Self {
            storage,
            log_dir: env.get("EF_LOG_DIR").map(PathBuf::from),
            limits,
        })
    }
}

struct Env(HashMap<String, String>);

impl Env {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str).filter(|v| !v.trim().is_empty())
    }

    fn require(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key)
            .map(str::to_string)
            .ok_or(ConfigError::Missing(key))
    }

    fn try_load<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr + Display,
        T::Err: Display,
    {
        let Some(raw) = self.get(key) else {
            info!("{key} not set, using default: {default}");
            return Ok(default);
        };
        raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key: key.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
    }
}
