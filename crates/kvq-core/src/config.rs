//! Configuration parsing and validation.
//!
//! Loaded from a JSON file (every field optional) with overrides applied by
//! the caller. `validate()` fails fast on values the runtime cannot use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KvqConfig {
    /// Redis URL of the key-value store. `None` selects the in-memory store.
    pub store_url: Option<String>,

    /// Number of workers executing mutation tasks.
    pub workers: usize,

    /// Retry settings of the read path.
    pub read_retry: ReadRetryConfig,

    /// How long a worker may hold a task before it is redelivered.
    pub lease_timeout_ms: u64,
}

impl Default for KvqConfig {
    fn default() -> Self {
        Self {
            store_url: None,
            workers: 4,
            read_retry: ReadRetryConfig::default(),
            lease_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadRetryConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for ReadRetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 2_000,
        }
    }
}

impl KvqConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".to_string()));
        }
        if self.read_retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "read_retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.lease_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "lease_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if let Some(url) = &self.store_url
            && url.trim().is_empty()
        {
            return Err(ConfigError::Invalid("store_url must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn lease_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.lease_timeout_ms)
    }
}
