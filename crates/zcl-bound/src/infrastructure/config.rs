//! TOML configuration for the bound-cluster engine.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration:
//!
//! ```toml
//! response_timeout_ms = 25000
//! reject_mixed_manufacturer_scope = false
//!
//! [retry]
//! attempts = 3
//! delay_ms = 500
//!
//! [time]
//! utc_offset_secs = 7200
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The file parsed but a value is unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// How long a request waits for its correlated response.
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
    /// Fail reads and writes that mix manufacturer-specific and standard
    /// attributes instead of sending them without a manufacturer id.
    #[serde(default)]
    pub reject_mixed_manufacturer_scope: bool,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub time: TimeConfig,
}

/// Retry behaviour for operations that talk to sleepy devices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

/// Local time settings served to devices.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TimeConfig {
    /// Offset of local time from UTC, in seconds east.
    #[serde(default)]
    pub utc_offset_secs: i32,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_response_timeout_ms() -> u64 {
    25_000
}
fn default_attempts() -> u32 {
    3
}
fn default_delay_ms() -> u64 {
    500
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            response_timeout_ms: default_response_timeout_ms(),
            reject_mixed_manufacturer_scope: false,
            retry: RetryConfig::default(),
            time: TimeConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl EngineConfig {
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed TOML, [`ConfigError::Invalid`]
    /// for a zero timeout, zero retry attempts or an offset beyond ±14 hours.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.response_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "response_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.retry.attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.attempts must be at least 1".to_string(),
            ));
        }
        if self.time.utc_offset_secs.abs() > 14 * 3600 {
            return Err(ConfigError::Invalid(format!(
                "time.utc_offset_secs {} is outside ±14 hours",
                self.time.utc_offset_secs
            )));
        }
        Ok(())
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Loads the config at `path`, returning the defaults if the file does not
/// exist.
///
/// # Errors
///
/// [`ConfigError::Io`] for file-system errors other than "not found", plus
/// everything [`EngineConfig::from_toml_str`] reports.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => EngineConfig::from_toml_str(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(EngineConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
pub fn save_config(path: &Path, config: &EngineConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
