//! Process-wide default logger
//!
//! The default instance is created lazily from [`LoggerConfig::default`] on
//! first use. Logging goes through a shared read lock; [`replace`] and
//! [`replace_with`] take the write lock, close (drain) the current instance
//! and install the new one, so no caller can reach a half-replaced logger.
//!
//! ```no_run
//! use rust_field_logger::{global, record, LogLevel, LoggerConfig};
//!
//! global::replace(LoggerConfig {
//!     level: LogLevel::Debug,
//!     ..LoggerConfig::default()
//! })
//! .unwrap();
//!
//! global::debug(&mut record! { "msg" => "ready" });
//! global::close();
//! ```

use crate::core::{LogLevel, LogRecord, Logger, LoggerConfig, LoggerError, Result};
use parking_lot::RwLock;
use std::sync::OnceLock;

static DEFAULT: OnceLock<RwLock<Logger>> = OnceLock::new();

fn slot() -> &'static RwLock<Logger> {
    DEFAULT.get_or_init(|| {
        let logger = Logger::new(LoggerConfig::default()).unwrap_or_else(|e| {
            eprintln!(
                "[LOGGER ERROR] Failed to start default logger: {}. \
                 Falling back to synchronous console output.",
                e
            );
            Logger::console_fallback()
        });
        RwLock::new(logger)
    })
}

/// Run `f` against the current default logger
pub fn with<R>(f: impl FnOnce(&Logger) -> R) -> R {
    let logger = slot().read();
    f(&*logger)
}

/// Build a logger from `config` and make it the default.
///
/// The previous default is closed (drained) before the new one is visible.
/// On a build error the previous default stays in place.
pub fn replace(config: LoggerConfig) -> Result<()> {
    let logger = Logger::new(config)?;
    replace_with(logger)
}

/// Make `logger` the default, closing the previous one
pub fn replace_with(logger: Logger) -> Result<()> {
    if logger.is_closed() {
        return Err(LoggerError::LoggerClosed);
    }
    let mut current = slot().write();
    current.close();
    *current = logger;
    Ok(())
}

/// Drain and close the default logger. Later records are rejected until
/// the next [`replace`].
pub fn close() {
    slot().read().close();
}

pub fn is_level_enabled(level: LogLevel) -> bool {
    slot().read().is_level_enabled(level)
}

pub fn level() -> LogLevel {
    slot().read().level()
}

/// Log at fatal level on the default logger, then exit through its hook
#[track_caller]
pub fn fatal(fields: &mut LogRecord) {
    slot().read().fatal(fields);
}

#[track_caller]
pub fn error(fields: &mut LogRecord) {
    slot().read().error(fields);
}

#[track_caller]
pub fn warn(fields: &mut LogRecord) {
    slot().read().warn(fields);
}

#[track_caller]
pub fn info(fields: &mut LogRecord) {
    slot().read().info(fields);
}

#[track_caller]
pub fn debug(fields: &mut LogRecord) {
    slot().read().debug(fields);
}

#[track_caller]
pub fn trace(fields: &mut LogRecord) {
    slot().read().trace(fields);
}

#[track_caller]
pub fn log(level: LogLevel, fields: &mut LogRecord) {
    slot().read().log(level, fields);
}
