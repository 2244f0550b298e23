//! Integration tests for the field logger
//!
//! These tests verify:
//! - Plain file output next to colored console output
//! - Threshold filtering
//! - Drain on close and rejection afterwards
//! - Per-producer ordering with a single worker
//! - Drop accounting on a tiny queue
//! - Fatal path with a mocked exit
//! - Sink failure isolation

use parking_lot::Mutex;
use rust_field_logger::core::formatter::strip_ansi;
use rust_field_logger::prelude::*;
use rust_field_logger::{error, info, record};
use std::fs;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

#[derive(Clone, Default)]
struct Capture {
    lines: Arc<Mutex<Vec<String>>>,
    colored: bool,
}

impl Capture {
    fn colored() -> Self {
        Self {
            colored: true,
            ..Self::default()
        }
    }

    fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl Sink for Capture {
    fn write_line(&mut self, line: &str) -> Result<()> {
        self.lines.lock().push(line.to_string());
        Ok(())
    }
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
    fn name(&self) -> &str {
        "capture"
    }
    fn colored(&self) -> bool {
        self.colored
    }
}

struct AlwaysFails;

impl Sink for AlwaysFails {
    fn write_line(&mut self, _line: &str) -> Result<()> {
        Err(LoggerError::sink("always-fails", "device gone"))
    }
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
    fn name(&self) -> &str {
        "always-fails"
    }
}

fn read_lines(path: &std::path::Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("Failed to read log file")
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_file_is_plain_while_console_is_colored() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("logs").join("app.log");
    let console = Capture::colored();

    let logger = Logger::builder()
        .stdout(false)
        .file(&log_file)
        .sink(console.clone())
        .build()
        .expect("Failed to build logger");

    info!(logger, "msg" => "hello", "user" => "ada", "attempt" => 2);
    logger.close();

    let file_lines = read_lines(&log_file);
    let console_lines = console.lines();
    assert_eq!(file_lines.len(), 1);
    assert_eq!(console_lines.len(), 1);

    assert!(!file_lines[0].contains('\x1b'));
    assert!(console_lines[0].contains("\x1b[92m\"INFO\"\x1b[0m"));
    assert_eq!(strip_ansi(&console_lines[0]), file_lines[0]);

    let parsed: serde_json::Value = serde_json::from_str(&file_lines[0]).expect("plain line is JSON");
    assert_eq!(parsed["msg"], "hello");
    assert_eq!(parsed["attempt"], 2);
    assert_eq!(parsed["level"], "INFO");
}

#[test]
fn test_key_order_in_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("order.log");

    let logger = Logger::builder()
        .stdout(false)
        .async_mode(false)
        .file(&log_file)
        .build()
        .expect("Failed to build logger");

    logger.warn(&mut record! {
        "zeta" => 1,
        "alpha" => 2,
        "error" => FieldValue::from_error(&std::io::Error::new(std::io::ErrorKind::Other, "disk \"full\"")),
        "msg" => "ordering",
    });
    logger.close();

    let line = &read_lines(&log_file)[0];
    let positions: Vec<usize> = ["\"time\"", "\"level\"", "\"msg\"", "\"error\"", "\"alpha\"", "\"zeta\"", "\"call\""]
        .iter()
        .map(|key| line.find(key).unwrap_or_else(|| panic!("{} missing in {}", key, line)))
        .collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted, "line was {}", line);
    assert!(line.contains(r#""error":"disk \"full\"""#), "line was {}", line);
}

#[test]
fn test_threshold_filters_records() {
    let capture = Capture::default();
    let logger = Logger::builder()
        .stdout(false)
        .level(LogLevel::Warn)
        .sink(capture.clone())
        .build()
        .expect("Failed to build logger");

    assert!(logger.is_level_enabled(LogLevel::Error));
    assert!(!logger.is_level_enabled(LogLevel::Info));

    logger.trace(&mut record! { "msg" => "t" });
    logger.debug(&mut record! { "msg" => "d" });
    logger.info(&mut record! { "msg" => "i" });
    logger.warn(&mut record! { "msg" => "w" });
    error!(logger, "msg" => "e");
    logger.close();

    let lines = capture.lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains(r#""msg":"w""#));
    assert!(lines[1].contains(r#""msg":"e""#));
}

#[test]
fn test_close_drains_and_rejects_late_records() {
    let capture = Capture::default();
    let logger = Logger::builder()
        .stdout(false)
        .workers(3)
        .batch_size(8)
        .flush_interval(Duration::from_secs(60))
        .sink(capture.clone())
        .build()
        .expect("Failed to build logger");

    for i in 0..500 {
        logger.info(&mut record! { "n" => i });
    }
    logger.close();

    let metrics = logger.metrics();
    assert_eq!(capture.lines().len() as u64, metrics.enqueued_count());
    assert_eq!(metrics.enqueued_count() + metrics.dropped_count(), 500);

    logger.info(&mut record! { "msg" => "too late" });
    assert_eq!(metrics.rejected_count(), 1);
    assert_eq!(capture.lines().len() as u64, metrics.written_count());
}

#[test]
fn test_single_worker_keeps_producer_order() {
    let capture = Capture::default();
    let logger = Arc::new(
        Logger::builder()
            .stdout(false)
            .queue_size(10_000)
            .workers(1)
            .sink(capture.clone())
            .build()
            .expect("Failed to build logger"),
    );

    let handles: Vec<_> = (0..4)
        .map(|producer| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for seq in 0..250 {
                    logger.info(&mut record! { "producer" => producer, "seq" => seq });
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("producer panicked");
    }
    logger.close();

    let mut last_seen = [-1i64; 4];
    let lines = capture.lines();
    assert_eq!(lines.len(), 1000);
    for line in &lines {
        let parsed: serde_json::Value = serde_json::from_str(line).expect("plain line is JSON");
        let producer = parsed["producer"].as_u64().unwrap() as usize;
        let seq = parsed["seq"].as_i64().unwrap();
        assert!(seq > last_seen[producer], "producer {} went back to {}", producer, seq);
        last_seen[producer] = seq;
    }
}

#[test]
fn test_tiny_queue_accounts_for_every_record() {
    let capture = Capture::default();
    let logger = Logger::builder()
        .stdout(false)
        .queue_size(2)
        .batch_size(1)
        .sink(capture.clone())
        .build()
        .expect("Failed to build logger");

    for i in 0..3 {
        logger.info(&mut record! { "n" => i });
    }
    logger.close();

    let metrics = logger.metrics();
    assert_eq!(metrics.written_count() + metrics.dropped_count(), 3);
    assert_eq!(capture.lines().len() as u64, metrics.written_count());
}

#[test]
fn test_fatal_drains_and_calls_exit_hook() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("fatal.log");
    let exit_code = Arc::new(AtomicI32::new(-1));
    let observed = Arc::clone(&exit_code);

    let logger = Logger::builder()
        .stdout(false)
        .file(&log_file)
        .on_fatal_exit(Arc::new(move |code| observed.store(code, Ordering::SeqCst)))
        .build()
        .expect("Failed to build logger");

    for i in 0..20 {
        logger.info(&mut record! { "n" => i });
    }
    logger.fatal(&mut record! { "msg" => "unrecoverable" });

    assert_eq!(exit_code.load(Ordering::SeqCst), 1);
    assert!(logger.is_closed());

    let lines = read_lines(&log_file);
    assert_eq!(lines.len(), 21);
    assert!(lines[20].contains(r#""level":"FATAL""#));
}

#[test]
fn test_failing_sink_does_not_block_others() {
    let capture = Capture::default();
    let logger = Logger::builder()
        .stdout(false)
        .sink(AlwaysFails)
        .sink(capture.clone())
        .build()
        .expect("Failed to build logger");

    for i in 0..5 {
        logger.info(&mut record! { "n" => i });
    }
    logger.close();

    assert_eq!(capture.lines().len(), 5);
    assert_eq!(logger.metrics().write_failure_count(), 5);
}

#[test]
fn test_caller_clip_applies_to_call_field() {
    let capture = Capture::default();
    let logger = Logger::builder()
        .stdout(false)
        .async_mode(false)
        .caller_clip("tests/")
        .sink(capture.clone())
        .build()
        .expect("Failed to build logger");

    let line = line!() + 1;
    logger.info(&mut record! { "msg" => "where am i" });

    let lines = capture.lines();
    let expected = format!(r#""call":"integration_tests.rs:{}""#, line);
    assert!(lines[0].ends_with(&format!("{}}}", expected)), "line was {}", lines[0]);
}

#[test]
fn test_logger_from_json_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("configured.log");
    let config_file = temp_dir.path().join("logger.json");
    fs::write(
        &config_file,
        serde_json::json!({
            "file": log_file,
            "level": "debug",
            "stdout": false,
            "queue_size": 16,
            "batch_size": 4,
            "rotation": { "max_size_mb": 1, "max_backups": 2, "compress": false }
        })
        .to_string(),
    )
    .expect("Failed to write config");

    let config = LoggerConfig::from_json_file(&config_file).expect("Failed to load config");
    let logger = Logger::new(config).expect("Failed to build logger");
    assert_eq!(logger.level(), LogLevel::Debug);
    assert_eq!(logger.config().rotation.max_backups, 2);

    logger.debug(&mut record! { "msg" => "configured" });
    logger.close();

    let lines = read_lines(&log_file);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(r#""level":"DEBUG""#));
}

#[test]
fn test_unwritable_file_fails_build() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    // A regular file where a directory is expected
    let blocker = temp_dir.path().join("not_a_dir");
    fs::write(&blocker, "x").expect("Failed to write blocker");

    let result = Logger::builder()
        .stdout(false)
        .file(blocker.join("app.log"))
        .build();
    assert!(result.is_err());
}
