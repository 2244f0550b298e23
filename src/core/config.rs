//! Logger configuration
//!
//! A `LoggerConfig` is fixed once a logger is built. It can be assembled in
//! code, through [`LoggerBuilder`](super::LoggerBuilder), or loaded from JSON.

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use crate::sinks::RotationPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_QUEUE_SIZE: usize = 1000;
pub const DEFAULT_BATCH_SIZE: usize = 32;
pub const DEFAULT_WORKERS: usize = 1;
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(200);

/// Configuration for a [`Logger`](super::Logger)
///
/// # Example
///
/// ```
/// use rust_field_logger::{LogLevel, LoggerConfig};
///
/// let config = LoggerConfig::from_json_str(
///     r#"{"level": "debug", "color": false, "queue_size": 64, "workers": 2}"#,
/// ).unwrap();
///
/// assert_eq!(config.level, LogLevel::Debug);
/// assert_eq!(config.workers, 2);
/// assert!(config.stdout);
/// ```
///
/// JSON keys may also use the camelCase option names (`asyncQueueSize`,
/// `asyncWorkers`, `callerClip`, flat `rotateMaxSize` and friends). Unknown
/// keys are rejected, and a negative worker count is read as one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawConfig")]
pub struct LoggerConfig {
    /// Path of the rotating file sink; `None` disables it
    pub file: Option<PathBuf>,
    /// Severity threshold
    pub level: LogLevel,
    pub stdout: bool,
    /// Colorize console output
    pub color: bool,
    pub rotation: RotationPolicy,
    pub async_enabled: bool,
    pub queue_size: usize,
    pub batch_size: usize,
    /// Worker count; zero is treated as one
    pub workers: usize,
    pub flush_interval_ms: u64,
    /// Substring removed from call-site paths
    pub caller_clip: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            file: None,
            level: LogLevel::Info,
            stdout: true,
            color: true,
            rotation: RotationPolicy::default(),
            async_enabled: true,
            queue_size: DEFAULT_QUEUE_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            workers: DEFAULT_WORKERS,
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL.as_millis() as u64,
            caller_clip: None,
        }
    }
}

/// `/var/log/<program>.log`, named after the running executable
#[must_use]
pub fn default_log_path() -> PathBuf {
    let program = std::env::args_os()
        .next()
        .and_then(|arg0| {
            Path::new(&arg0)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "app".to_string());
    PathBuf::from("/var/log").join(format!("{}.log", program))
}

/// What a JSON config may contain; every key is optional
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    file: Option<PathBuf>,
    level: Option<LogLevel>,
    stdout: Option<bool>,
    color: Option<bool>,
    rotation: Option<RotationPolicy>,
    #[serde(alias = "rotateMaxSize")]
    rotate_max_size: Option<u64>,
    #[serde(alias = "rotateMaxAge")]
    rotate_max_age: Option<u64>,
    #[serde(alias = "rotateMaxBackups")]
    rotate_max_backups: Option<usize>,
    #[serde(alias = "rotateCompress")]
    rotate_compress: Option<bool>,
    #[serde(alias = "rotateLocalTime")]
    rotate_local_time: Option<bool>,
    #[serde(alias = "asyncEnabled")]
    async_enabled: Option<bool>,
    #[serde(alias = "asyncQueueSize")]
    queue_size: Option<usize>,
    #[serde(alias = "asyncBatchSize")]
    batch_size: Option<usize>,
    #[serde(alias = "asyncWorkers")]
    workers: Option<i64>,
    #[serde(alias = "flushIntervalMs")]
    flush_interval_ms: Option<u64>,
    #[serde(alias = "callerClip")]
    caller_clip: Option<String>,
}

impl From<RawConfig> for LoggerConfig {
    fn from(raw: RawConfig) -> Self {
        let defaults = LoggerConfig::default();

        let mut rotation = raw.rotation.unwrap_or(defaults.rotation);
        if let Some(size) = raw.rotate_max_size {
            rotation.max_size_mb = size;
        }
        if let Some(days) = raw.rotate_max_age {
            rotation.max_age_days = days;
        }
        if let Some(count) = raw.rotate_max_backups {
            rotation.max_backups = count;
        }
        if let Some(compress) = raw.rotate_compress {
            rotation.compress = compress;
        }
        if let Some(local) = raw.rotate_local_time {
            rotation.local_time = local;
        }

        Self {
            file: raw.file,
            level: raw.level.unwrap_or(defaults.level),
            stdout: raw.stdout.unwrap_or(defaults.stdout),
            color: raw.color.unwrap_or(defaults.color),
            rotation,
            async_enabled: raw.async_enabled.unwrap_or(defaults.async_enabled),
            queue_size: raw.queue_size.unwrap_or(defaults.queue_size),
            batch_size: raw.batch_size.unwrap_or(defaults.batch_size),
            workers: raw
                .workers
                .map_or(defaults.workers, |n| usize::try_from(n).unwrap_or(0).max(1)),
            flush_interval_ms: raw.flush_interval_ms.unwrap_or(defaults.flush_interval_ms),
            caller_clip: raw.caller_clip,
        }
    }
}

impl LoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation(
                "reading logger configuration",
                format!("cannot read '{}'", path.display()),
                e,
            )
        })?;
        Self::from_json_str(&text)
    }

    /// Check hard limits and coerce soft ones to their defaults
    pub fn normalized(mut self) -> Result<Self> {
        if self.async_enabled && self.queue_size == 0 {
            return Err(LoggerError::config(
                "LoggerConfig",
                "queue_size must be greater than zero",
            ));
        }
        if self.batch_size == 0 {
            self.batch_size = DEFAULT_BATCH_SIZE;
        }
        if self.workers == 0 {
            self.workers = 1;
        }
        if self.flush_interval_ms == 0 {
            self.flush_interval_ms = DEFAULT_FLUSH_INTERVAL.as_millis() as u64;
        }
        if self.caller_clip.as_deref() == Some("") {
            self.caller_clip = None;
        }
        Ok(self)
    }

    #[must_use]
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    #[must_use]
    pub fn is_level_enabled(&self, level: LogLevel) -> bool {
        self.level.admits(level)
    }
}
