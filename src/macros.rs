//! Macros for building field maps and logging them.
//!
//! # Examples
//!
//! ```
//! use rust_field_logger::prelude::*;
//! use rust_field_logger::{info, record, warn};
//!
//! let logger = Logger::builder().stdout(false).build().unwrap();
//!
//! // Fields as `key => value` pairs
//! info!(logger, "msg" => "server started", "port" => 8080);
//!
//! // Reuse a prepared map
//! let mut fields = record! { "msg" => "disk almost full", "free_mb" => 512u64 };
//! logger.warn(&mut fields);
//!
//! // No fields at all
//! warn!(logger);
//! ```

/// Build a [`LogRecord`](crate::LogRecord) from `key => value` pairs.
///
/// Values go through `FieldValue::from`, so anything with a `From` impl
/// works: strings, integers, floats, bools, options and vectors.
///
/// # Examples
///
/// ```
/// use rust_field_logger::record;
///
/// let rec = record! { "msg" => "hello", "attempt" => 3, "ok" => true };
/// assert_eq!(rec.len(), 3);
/// assert!(record!().is_empty());
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::LogRecord::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::LogRecord::new();
        $( record.insert($key, $value); )+
        record
    }};
}

/// Log fields at a runtime level.
///
/// # Examples
///
/// ```
/// # use rust_field_logger::prelude::*;
/// # let logger = Logger::builder().stdout(false).build().unwrap();
/// use rust_field_logger::log;
/// log!(logger, LogLevel::Info, "msg" => "simple");
/// log!(logger, LogLevel::Error, "msg" => "request failed", "code" => 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $logger.log($level, &mut $crate::record!($($key => $value),*))
    };
}

/// Log fields at fatal level, then drain the logger and exit the process.
///
/// ```no_run
/// # use rust_field_logger::prelude::*;
/// # let logger = Logger::builder().build().unwrap();
/// use rust_field_logger::fatal;
/// fatal!(logger, "msg" => "cannot bind socket", "port" => 80);
/// ```
#[macro_export]
macro_rules! fatal {
    ($logger:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $logger.fatal(&mut $crate::record!($($key => $value),*))
    };
}

/// Log fields at error level.
#[macro_export]
macro_rules! error {
    ($logger:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $logger.error(&mut $crate::record!($($key => $value),*))
    };
}

/// Log fields at warn level.
#[macro_export]
macro_rules! warn {
    ($logger:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $logger.warn(&mut $crate::record!($($key => $value),*))
    };
}

/// Log fields at info level.
#[macro_export]
macro_rules! info {
    ($logger:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $logger.info(&mut $crate::record!($($key => $value),*))
    };
}

/// Log fields at debug level.
///
/// # Examples
///
/// ```
/// # use rust_field_logger::prelude::*;
/// # let logger = Logger::builder().stdout(false).level(LogLevel::Debug).build().unwrap();
/// use rust_field_logger::debug;
/// debug!(logger, "msg" => "cache miss", "key" => "user:42");
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $logger.debug(&mut $crate::record!($($key => $value),*))
    };
}

/// Log fields at trace level.
#[macro_export]
macro_rules! trace {
    ($logger:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $logger.trace(&mut $crate::record!($($key => $value),*))
    };
}
