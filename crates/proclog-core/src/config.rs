//! Logger configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::clock::TimeZoneMode;
use crate::error::{LogError, LogResult};
use crate::level::{LogFormat, LogLevel};

/// Environment variable overriding the minimum level.
pub const ENV_LEVEL: &str = "PROCLOG_LEVEL";
/// Environment variable overriding the output format.
pub const ENV_FORMAT: &str = "PROCLOG_FORMAT";
/// Environment variable overriding the rotation threshold in bytes.
pub const ENV_MAX_FILE_SIZE: &str = "PROCLOG_MAX_FILE_SIZE";
/// Environment variable selecting `local` or `utc` dates.
pub const ENV_TIMEZONE: &str = "PROCLOG_TIMEZONE";

/// Configuration for a [`ProcessLogger`](crate::ProcessLogger).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Base directory; one subdirectory per process is created beneath it.
    pub base_dir: PathBuf,

    /// Events below this level are dropped without touching the disk.
    pub min_level: LogLevel,

    /// Line encoding.
    pub format: LogFormat,

    /// Rotation threshold in bytes (0 = never rotate).
    pub max_file_size: u64,

    /// Calendar used for routing dates and timestamps.
    pub timezone: TimeZoneMode,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("logs"),
            min_level: LogLevel::Info,
            format: LogFormat::Json,
            max_file_size: 0,
            timezone: TimeZoneMode::Local,
        }
    }
}

impl LoggerConfig {
    /// Create a configuration rooted at `base_dir` with default settings.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn with_timezone(mut self, timezone: TimeZoneMode) -> Self {
        self.timezone = timezone;
        self
    }

    /// Build a configuration for `base_dir` and apply `PROCLOG_*` overrides.
    pub fn from_env(base_dir: impl Into<PathBuf>) -> LogResult<Self> {
        Self::new(base_dir).apply_overrides(|key| std::env::var(key).ok())
    }

    /// Load a JSON configuration file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> LogResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LogError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| LogError::InvalidConfig(format!("{}: {}", path.display(), e)))
    }

    /// Apply overrides looked up by `lookup`. Unset keys keep their values;
    /// set-but-invalid values are errors.
    pub fn apply_overrides<F>(mut self, lookup: F) -> LogResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LEVEL) {
            self.min_level = level.parse()?;
        }
        if let Some(format) = lookup(ENV_FORMAT) {
            self.format = format.parse()?;
        }
        if let Some(size) = lookup(ENV_MAX_FILE_SIZE) {
            self.max_file_size = size.trim().parse().map_err(|_| {
                LogError::InvalidConfig(format!(
                    "{} must be a byte count, got {:?}",
                    ENV_MAX_FILE_SIZE, size
                ))
            })?;
        }
        if let Some(tz) = lookup(ENV_TIMEZONE) {
            self.timezone = match tz.trim().to_ascii_lowercase().as_str() {
                "local" => TimeZoneMode::Local,
                "utc" => TimeZoneMode::Utc,
                _ => {
                    return Err(LogError::InvalidConfig(format!(
                        "{} must be local or utc, got {:?}",
                        ENV_TIMEZONE, tz
                    )))
                }
            };
        }
        Ok(self)
    }
}
