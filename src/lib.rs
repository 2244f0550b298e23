//! # Rust Field Logger
//!
//! A structured logging core: callers pass a map of named fields, the
//! logger stamps it with `level`, `time` and `call`, queues it, and a pool
//! of background workers renders it as a `{"k":v,...}` line for every sink.
//!
//! ## Features
//!
//! - **Bounded queue**: a full queue drops the record with a warning; the
//!   caller never blocks
//! - **Worker pool**: batched writes flushed by size or on a timer, fully
//!   drained on close
//! - **Stable key order**: canonical keys first, the rest sorted, `call` last
//! - **Colored console, plain files**: ANSI colors only where a sink asks
//!   for them; the rotating file sink always gets plain lines
//! - **Process-wide default**: the [`global`] module, with swap-and-drain
//!   replacement
//!
//! ## Example
//!
//! ```
//! use rust_field_logger::prelude::*;
//! use rust_field_logger::info;
//!
//! let logger = Logger::builder()
//!     .level(LogLevel::Debug)
//!     .stdout(false)
//!     .build()
//!     .unwrap();
//!
//! info!(logger, "msg" => "user signed in", "user_id" => 42);
//! logger.close();
//! ```

pub mod core;
pub mod global;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        ExitHook, FieldValue, LogLevel, LogRecord, Logger, LoggerBuilder, LoggerConfig,
        LoggerError, LoggerMetrics, OverflowCallback, RecordFormatter, Result, Sink,
    };
    pub use crate::sinks::{ConsoleSink, RotatingFileSink, RotationPolicy};
}

pub use crate::core::{
    ExitHook, FieldValue, LogLevel, LogRecord, Logger, LoggerBuilder, LoggerConfig, LoggerError,
    LoggerMetrics, OverflowCallback, RecordFormatter, Result, Sink, TimeCache, CALL_KEY,
    CANONICAL_KEYS,
};
pub use sinks::{ConsoleSink, RotatingFileSink, RotationPolicy};
