//! Sink trait for rendered log lines, and the sink set shared by workers

use super::error::Result;
use super::formatter::RecordFormatter;
use super::log_record::LogRecord;
use super::metrics::LoggerMetrics;
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// A destination for rendered lines.
///
/// Sinks receive lines in the order they are written and must not reorder
/// them. Rotation or any other storage policy is the sink's own business.
pub trait Sink: Send {
    /// Append one rendered line (without trailing newline)
    fn write_line(&mut self, line: &str) -> Result<()>;

    fn flush(&mut self) -> Result<()>;

    fn name(&self) -> &str;

    /// Whether this sink wants the ANSI-colorized rendering
    fn colored(&self) -> bool {
        false
    }
}

/// All sinks of one logger, plus the formatter that feeds them
pub(crate) struct SinkSet {
    sinks: Mutex<Vec<Box<dyn Sink>>>,
    formatter: RecordFormatter,
    wants_plain: bool,
    wants_colored: bool,
}

/// One record rendered in the forms the sink set needs
struct Rendered {
    plain: Option<String>,
    colored: Option<String>,
}

impl SinkSet {
    pub(crate) fn new(sinks: Vec<Box<dyn Sink>>, formatter: RecordFormatter) -> Self {
        let wants_colored = sinks.iter().any(|sink| sink.colored());
        let wants_plain = sinks.iter().any(|sink| !sink.colored());
        Self {
            sinks: Mutex::new(sinks),
            formatter,
            wants_plain,
            wants_colored,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.sinks.lock().len()
    }

    /// Render and write a batch, then flush every sink.
    ///
    /// Rendering happens before the sink lock is taken, so several workers
    /// format in parallel and only serialize on the writes. A failing or
    /// panicking sink never affects other sinks or the other records of the
    /// batch; the failure is reported on stderr and counted.
    pub(crate) fn write_records(&self, records: &[LogRecord], metrics: &LoggerMetrics) {
        if records.is_empty() {
            return;
        }
        let rendered: Vec<Rendered> = records.iter().map(|record| self.render(record)).collect();

        let mut sinks = self.sinks.lock();
        for lines in &rendered {
            let mut has_error = false;

            for (idx, sink) in sinks.iter_mut().enumerate() {
                let line = if sink.colored() { &lines.colored } else { &lines.plain };
                let Some(line) = line.as_deref() else {
                    continue;
                };

                match catch_unwind(AssertUnwindSafe(|| sink.write_line(line))) {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        eprintln!("[LOGGER ERROR] Sink #{} ({}) failed: {}", idx, sink.name(), e);
                        has_error = true;
                    }
                    Err(panic_info) => {
                        eprintln!(
                            "[LOGGER CRITICAL] Sink #{} ({}) panicked: {}. \
                             Other sinks continue to function.",
                            idx,
                            sink.name(),
                            panic_message(&panic_info)
                        );
                        has_error = true;
                    }
                }
            }

            if has_error {
                metrics.record_write_failure();
            } else {
                metrics.record_written();
            }
        }

        Self::flush_locked(&mut sinks);
    }

    fn render(&self, record: &LogRecord) -> Rendered {
        Rendered {
            plain: self.wants_plain.then(|| self.formatter.render(record, false)),
            colored: self.wants_colored.then(|| self.formatter.render(record, true)),
        }
    }

    pub(crate) fn flush(&self) -> Result<()> {
        let mut sinks = self.sinks.lock();
        for sink in sinks.iter_mut() {
            sink.flush()?;
        }
        Ok(())
    }

    fn flush_locked(sinks: &mut [Box<dyn Sink>]) {
        for (idx, sink) in sinks.iter_mut().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| sink.flush())) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    eprintln!("[LOGGER ERROR] Sink #{} ({}) flush failed: {}", idx, sink.name(), e);
                }
                Err(panic_info) => {
                    eprintln!(
                        "[LOGGER CRITICAL] Sink #{} ({}) panicked during flush: {}",
                        idx,
                        sink.name(),
                        panic_message(&panic_info)
                    );
                }
            }
        }
    }
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
