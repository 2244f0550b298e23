//! Core logger types and traits

pub mod call_site;
pub mod config;
pub mod error;
pub mod formatter;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;
pub mod sink;
pub mod time_cache;
mod worker;

pub use config::{default_log_path, LoggerConfig, DEFAULT_BATCH_SIZE, DEFAULT_FLUSH_INTERVAL, DEFAULT_QUEUE_SIZE, DEFAULT_WORKERS};
pub use error::{LoggerError, Result};
pub use formatter::{RecordFormatter, CALL_KEY, CANONICAL_KEYS};
pub use log_level::LogLevel;
pub use log_record::{FieldValue, LogRecord};
pub use logger::{ExitHook, Logger, LoggerBuilder, OverflowCallback, FATAL_EXIT_CODE};
pub use metrics::LoggerMetrics;
pub use sink::Sink;
pub use time_cache::{TimeCache, DEFAULT_TIME_FORMAT};
