//! Configuration loading, validation, and management for Roundtable.
//!
//! Loads configuration from `~/.roundtable/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.roundtable/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote document preprocessing service
    #[serde(default)]
    pub preprocess: PreprocessConfig,

    /// Worker reply protocol settings
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Orchestrated session settings
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Endpoint receiving the multipart upload
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Multipart field name carrying the file
    #[serde(default = "default_upload_field")]
    pub upload_field: String,

    /// MIME type declared on the uploaded part
    #[serde(default = "default_part_mime")]
    pub part_mime: String,

    /// Where a successful response body is written (overwritten on every success)
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8200/v1/preprocess/document".into()
}
fn default_upload_field() -> String {
    "uploadFiles".into()
}
fn default_part_mime() -> String {
    "multipart/form-data".into()
}
fn default_output_path() -> PathBuf {
    PathBuf::from("./output.json")
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            upload_field: default_upload_field(),
            part_mime: default_part_mime(),
            output_path: default_output_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// How many actionable messages to scan before asking for clarification
    #[serde(default = "default_lookback")]
    pub lookback: usize,

    /// Ask for confirmation before each upload
    #[serde(default)]
    pub confirm_uploads: bool,
}

fn default_lookback() -> usize {
    5
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            lookback: default_lookback(),
            confirm_uploads: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Stop after this many turns. Absent = run until a halt signal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_turns: Option<usize>,

    /// Capacity of the domain event bus
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_event_capacity() -> usize {
    256
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_turns: None,
            event_capacity: default_event_capacity(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.roundtable/config.toml).
    ///
    /// Environment variables override file values:
    /// - `ROUNDTABLE_PREPROCESS_ENDPOINT`
    /// - `ROUNDTABLE_OUTPUT_PATH`
    /// - `ROUNDTABLE_LOOKBACK`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in `load`).
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(endpoint) = lookup("ROUNDTABLE_PREPROCESS_ENDPOINT") {
            self.preprocess.endpoint = endpoint;
        }

        if let Some(output) = lookup("ROUNDTABLE_OUTPUT_PATH") {
            self.preprocess.output_path = PathBuf::from(output);
        }

        if let Some(lookback) = lookup("ROUNDTABLE_LOOKBACK") {
            self.worker.lookback = lookback.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "ROUNDTABLE_LOOKBACK must be a non-negative integer, got '{lookback}'"
                ))
            })?;
        }

        self.validate()
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".roundtable")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = &self.preprocess.endpoint;
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "preprocess.endpoint must start with http:// or https://, got '{endpoint}'"
            )));
        }

        if self.preprocess.upload_field.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "preprocess.upload_field must not be empty".into(),
            ));
        }

        if self.preprocess.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "preprocess.timeout_secs must be > 0".into(),
            ));
        }

        if self.session.max_turns == Some(0) {
            return Err(ConfigError::ValidationError(
                "session.max_turns must be > 0 when set".into(),
            ));
        }

        if self.session.event_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "session.event_capacity must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
