//! Main logger implementation

use super::call_site;
use super::config::{self, LoggerConfig};
use super::error::{LoggerError, Result};
use super::formatter::RecordFormatter;
use super::log_level::LogLevel;
use super::log_record::LogRecord;
use super::metrics::LoggerMetrics;
use super::sink::{Sink, SinkSet};
use super::time_cache::TimeCache;
use super::worker::Worker;
use crate::sinks::{ConsoleSink, RotatingFileSink, RotationPolicy};
use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::io::Write;
use std::panic::Location;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Called with the running drop total each time a record is dropped
pub type OverflowCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// Called with the exit code after a fatal record has been drained
pub type ExitHook = Arc<dyn Fn(i32) + Send + Sync>;

/// Exit code passed to the exit hook after a fatal record
pub const FATAL_EXIT_CODE: i32 = 1;

/// Admission state. Producers hold the read lock while dispatching, so
/// `close` (write lock) waits for in-flight dispatches and then shuts the
/// door for everyone after it.
enum Gate {
    Async(Sender<LogRecord>),
    Sync,
    Closed,
}

/// Structured logger.
///
/// Every level method takes the caller's field map, stamps it with `level`,
/// `time` and `call`, and hands it to the queue (or writes it directly when
/// async mode is off). Records below the threshold are ignored without
/// touching the map.
///
/// # Example
///
/// ```
/// use rust_field_logger::{record, LogLevel, Logger};
///
/// let logger = Logger::builder()
///     .level(LogLevel::Debug)
///     .stdout(false)
///     .build()
///     .unwrap();
///
/// let mut fields = record! { "msg" => "service started", "port" => 8080 };
/// logger.info(&mut fields);
/// assert_eq!(fields.get("level").and_then(|v| v.as_str()), Some("INFO"));
///
/// logger.close();
/// ```
pub struct Logger {
    config: LoggerConfig,
    sinks: Arc<SinkSet>,
    gate: RwLock<Gate>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    metrics: Arc<LoggerMetrics>,
    time_cache: TimeCache,
    on_overflow: Option<OverflowCallback>,
    exit_hook: ExitHook,
}

impl Logger {
    /// Build a logger with the standard sinks for `config`
    pub fn new(config: LoggerConfig) -> Result<Self> {
        LoggerBuilder::from_config(config).build()
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use rust_field_logger::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .level(LogLevel::Debug)
    ///     .queue_size(256)
    ///     .workers(2)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(logger.level(), LogLevel::Debug);
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Synchronous stdout-only logger that cannot fail to start
    pub(crate) fn console_fallback() -> Self {
        let config = LoggerConfig {
            async_enabled: false,
            ..LoggerConfig::default()
        };
        let sinks: Vec<Box<dyn Sink>> = vec![Box::new(ConsoleSink::with_colors(config.color))];
        Self {
            sinks: Arc::new(SinkSet::new(sinks, RecordFormatter::new())),
            gate: RwLock::new(Gate::Sync),
            workers: Mutex::new(Vec::new()),
            metrics: Arc::new(LoggerMetrics::new()),
            time_cache: TimeCache::new(),
            on_overflow: None,
            exit_hook: default_exit_hook(),
            config,
        }
    }

    #[track_caller]
    pub fn fatal(&self, fields: &mut LogRecord) -> &Self {
        if self.log_at(LogLevel::Fatal, fields, Location::caller()) {
            self.close();
            (self.exit_hook)(FATAL_EXIT_CODE);
        }
        self
    }

    #[track_caller]
    pub fn error(&self, fields: &mut LogRecord) -> &Self {
        self.log_at(LogLevel::Error, fields, Location::caller());
        self
    }

    #[track_caller]
    pub fn warn(&self, fields: &mut LogRecord) -> &Self {
        self.log_at(LogLevel::Warn, fields, Location::caller());
        self
    }

    #[track_caller]
    pub fn info(&self, fields: &mut LogRecord) -> &Self {
        self.log_at(LogLevel::Info, fields, Location::caller());
        self
    }

    #[track_caller]
    pub fn debug(&self, fields: &mut LogRecord) -> &Self {
        self.log_at(LogLevel::Debug, fields, Location::caller());
        self
    }

    #[track_caller]
    pub fn trace(&self, fields: &mut LogRecord) -> &Self {
        self.log_at(LogLevel::Trace, fields, Location::caller());
        self
    }

    /// Log at a level chosen at runtime. `Fatal` takes the full fatal path.
    #[track_caller]
    pub fn log(&self, level: LogLevel, fields: &mut LogRecord) -> &Self {
        if level == LogLevel::Fatal {
            return self.fatal(fields);
        }
        self.log_at(level, fields, Location::caller());
        self
    }

    /// Stamp and dispatch; returns false when the level is filtered out
    fn log_at(&self, level: LogLevel, fields: &mut LogRecord, location: &Location<'_>) -> bool {
        if !self.is_level_enabled(level) {
            return false;
        }

        fields.insert("level", level.as_str());
        fields.insert("time", self.time_cache.formatted_now());
        fields.insert(
            "call",
            call_site::describe(location, self.config.caller_clip.as_deref()),
        );

        self.dispatch(fields, level);
        true
    }

    fn dispatch(&self, record: &LogRecord, level: LogLevel) {
        let gate = self.gate.read();
        match &*gate {
            Gate::Async(sender) => match sender.try_send(record.clone()) {
                Ok(()) => {
                    self.metrics.record_enqueued();
                }
                Err(TrySendError::Full(record)) => {
                    self.handle_overflow(record, level);
                }
                Err(TrySendError::Disconnected(_)) => {
                    // Every worker is gone
                    self.metrics.record_rejected();
                }
            },
            Gate::Sync => {
                self.sinks
                    .write_records(std::slice::from_ref(record), &self.metrics);
            }
            Gate::Closed => {
                self.metrics.record_rejected();
            }
        }
    }

    fn handle_overflow(&self, record: LogRecord, level: LogLevel) {
        if level == LogLevel::Fatal {
            self.force_write_fatal(record);
            return;
        }
        self.alert_and_drop();
    }

    /// Fatal records are never dropped: write synchronously
    fn force_write_fatal(&self, record: LogRecord) {
        self.metrics.record_fatal_forced();
        self.sinks
            .write_records(std::slice::from_ref(&record), &self.metrics);
    }

    /// Drop the record with one diagnostic line
    fn alert_and_drop(&self) {
        let dropped = self.metrics.record_dropped() + 1;
        let warning = format!(
            "[LOGGER WARNING] {}, record dropped (total dropped: {})",
            LoggerError::queue_full(self.config.queue_size),
            dropped
        );

        // A broken stdout must not take the producer down
        if self.config.stdout {
            let _ = writeln!(std::io::stdout().lock(), "{}", warning);
        } else {
            let _ = writeln!(std::io::stderr().lock(), "{}", warning);
        }

        if let Some(ref callback) = self.on_overflow {
            callback(dropped);
        }
    }

    #[inline]
    #[must_use]
    pub fn is_level_enabled(&self, level: LogLevel) -> bool {
        self.config.is_level_enabled(level)
    }

    #[inline]
    #[must_use]
    pub fn level(&self) -> LogLevel {
        self.config.level
    }

    #[must_use]
    pub fn color_enabled(&self) -> bool {
        self.config.color
    }

    /// Effective (normalized) configuration
    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// Get the logger metrics for detailed observability
    ///
    /// # Example
    ///
    /// ```
    /// use rust_field_logger::{record, Logger};
    ///
    /// let logger = Logger::builder().stdout(false).build().unwrap();
    /// logger.info(&mut record! { "msg" => "hello" });
    /// logger.close();
    ///
    /// let metrics = logger.metrics();
    /// assert_eq!(metrics.enqueued_count(), 1);
    /// assert_eq!(metrics.dropped_count(), 0);
    /// ```
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Number of attached sinks
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Flush every sink. Queued records are not waited for; use
    /// [`close`](Self::close) for that.
    pub fn flush(&self) -> Result<()> {
        self.sinks.flush()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(*self.gate.read(), Gate::Closed)
    }

    /// Stop accepting records, drain everything already queued, and wait
    /// for the workers to finish.
    ///
    /// When this returns no further write happens from this logger. Records
    /// logged afterwards are counted as rejected. Closing twice is a no-op;
    /// a concurrent second caller blocks until the first one has drained.
    pub fn close(&self) {
        // Held through the joins so a racing closer waits for the drain
        let mut workers = self.workers.lock();
        let previous = {
            let mut gate = self.gate.write();
            std::mem::replace(&mut *gate, Gate::Closed)
        };
        if matches!(previous, Gate::Closed) {
            return;
        }
        // Dropping the sender disconnects the queue once it is empty
        drop(previous);

        for handle in workers.drain(..) {
            if let Err(e) = handle.join() {
                eprintln!("[LOGGER ERROR] Log worker panicked during shutdown: {:?}", e);
            }
        }

        if let Err(e) = self.sinks.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
        }

        let dropped = self.metrics.dropped_count();
        if dropped > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger closed with {} dropped records (drop rate: {:.2}%)",
                dropped,
                self.metrics.drop_rate()
            );
        }
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.close();
    }
}

fn default_exit_hook() -> ExitHook {
    Arc::new(|code| std::process::exit(code))
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use rust_field_logger::prelude::*;
/// use std::sync::Arc;
///
/// let logger = Logger::builder()
///     .level(LogLevel::Warn)
///     .stdout(false)
///     .async_mode(true)
///     .queue_size(128)
///     .batch_size(16)
///     .on_overflow(Arc::new(|count| {
///         eprintln!("ALERT: {} records dropped", count);
///     }))
///     .build()
///     .unwrap();
/// assert!(!logger.is_level_enabled(LogLevel::Info));
/// ```
pub struct LoggerBuilder {
    config: LoggerConfig,
    sinks: Vec<Box<dyn Sink>>,
    ordered_keys: Option<Vec<String>>,
    on_overflow: Option<OverflowCallback>,
    exit_hook: Option<ExitHook>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::from_config(LoggerConfig::default())
    }

    pub fn from_config(config: LoggerConfig) -> Self {
        Self {
            config,
            sinks: Vec::new(),
            ordered_keys: None,
            on_overflow: None,
            exit_hook: None,
        }
    }

    /// Replace the whole configuration
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    /// Also write to a rotating file at `path`
    #[must_use = "builder methods return a new value"]
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.file = Some(path.into());
        self
    }

    /// Write to `/var/log/<program>.log`
    #[must_use = "builder methods return a new value"]
    pub fn file_default(self) -> Self {
        self.file(config::default_log_path())
    }

    #[must_use = "builder methods return a new value"]
    pub fn stdout(mut self, enabled: bool) -> Self {
        self.config.stdout = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn color(mut self, enabled: bool) -> Self {
        self.config.color = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn rotation(mut self, policy: RotationPolicy) -> Self {
        self.config.rotation = policy;
        self
    }

    /// Queue records for background workers (default) or write inline
    #[must_use = "builder methods return a new value"]
    pub fn async_mode(mut self, enabled: bool) -> Self {
        self.config.async_enabled = enabled;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn queue_size(mut self, size: usize) -> Self {
        self.config.queue_size = size;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn workers(mut self, count: usize) -> Self {
        self.config.workers = count;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.flush_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Strip `clip` from call-site paths instead of keeping the last
    /// three components
    #[must_use = "builder methods return a new value"]
    pub fn caller_clip(mut self, clip: impl Into<String>) -> Self {
        self.config.caller_clip = Some(clip.into());
        self
    }

    /// Attach an extra sink next to the configured ones
    #[must_use = "builder methods return a new value"]
    pub fn sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Lead rendered lines with these keys instead of the canonical ones
    #[must_use = "builder methods return a new value"]
    pub fn ordered_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ordered_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    /// Set a callback for overflow notifications
    ///
    /// The callback runs on the producer thread for every dropped record
    /// with the total number of drops so far.
    #[must_use = "builder methods return a new value"]
    pub fn on_overflow(mut self, callback: OverflowCallback) -> Self {
        self.on_overflow = Some(callback);
        self
    }

    /// Replace `std::process::exit` as the last step of a fatal record
    #[must_use = "builder methods return a new value"]
    pub fn on_fatal_exit(mut self, hook: ExitHook) -> Self {
        self.exit_hook = Some(hook);
        self
    }

    /// Build the Logger, opening sinks and starting workers
    pub fn build(self) -> Result<Logger> {
        let config = self.config.normalized()?;

        let mut sinks: Vec<Box<dyn Sink>> = Vec::new();
        if config.stdout {
            sinks.push(Box::new(ConsoleSink::with_colors(config.color)));
        }
        if let Some(ref path) = config.file {
            sinks.push(Box::new(RotatingFileSink::with_policy(
                path,
                config.rotation.clone(),
            )?));
        }
        sinks.extend(self.sinks);

        let formatter = match self.ordered_keys {
            Some(keys) => RecordFormatter::with_ordered_keys(keys),
            None => RecordFormatter::new(),
        };
        let sinks = Arc::new(SinkSet::new(sinks, formatter));
        let metrics = Arc::new(LoggerMetrics::new());

        let (gate, workers) = if config.async_enabled {
            let (sender, receiver) = bounded(config.queue_size);
            let mut handles = Vec::with_capacity(config.workers);
            for id in 0..config.workers {
                let worker = Worker::new(
                    id,
                    receiver.clone(),
                    Arc::clone(&sinks),
                    Arc::clone(&metrics),
                    config.batch_size,
                    config.flush_interval(),
                );
                // On error the sender is dropped here and started workers exit
                let handle = worker.spawn().map_err(|e| {
                    LoggerError::io_operation("starting log worker", format!("worker {}", id), e)
                })?;
                handles.push(handle);
            }
            (Gate::Async(sender), handles)
        } else {
            (Gate::Sync, Vec::new())
        };

        Ok(Logger {
            config,
            sinks,
            gate: RwLock::new(gate),
            workers: Mutex::new(workers),
            metrics,
            time_cache: TimeCache::new(),
            on_overflow: self.on_overflow,
            exit_hook: self.exit_hook.unwrap_or_else(default_exit_hook),
        })
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
