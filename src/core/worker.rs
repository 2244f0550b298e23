//! Queue workers
//!
//! Each worker owns a private batch and ticker and shares the queue
//! receiver with its siblings. It wakes on three events:
//!
//! - a record arrives: append it, flush at `batch_size`, then drain up to
//!   `2 * batch_size` more records without blocking;
//! - the ticker fires: flush a non-empty batch;
//! - the queue disconnects (the logger dropped its sender on close): flush
//!   the batch and exit.
//!
//! A disconnected channel still yields every buffered record before it
//! reports the disconnect, so by the time a worker sees the disconnect the
//! queue is empty and no accepted record is left behind.

use super::log_record::LogRecord;
use super::metrics::LoggerMetrics;
use super::sink::SinkSet;
use crossbeam_channel::{select, tick, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub(crate) struct Worker {
    id: usize,
    receiver: Receiver<LogRecord>,
    sinks: Arc<SinkSet>,
    metrics: Arc<LoggerMetrics>,
    batch_size: usize,
    flush_interval: Duration,
}

impl Worker {
    pub(crate) fn new(
        id: usize,
        receiver: Receiver<LogRecord>,
        sinks: Arc<SinkSet>,
        metrics: Arc<LoggerMetrics>,
        batch_size: usize,
        flush_interval: Duration,
    ) -> Self {
        Self {
            id,
            receiver,
            sinks,
            metrics,
            batch_size: batch_size.max(1),
            flush_interval,
        }
    }

    pub(crate) fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("log-worker-{}", self.id))
            .spawn(move || self.run())
    }

    fn run(self) {
        let ticker = tick(self.flush_interval);
        let mut batch = Vec::with_capacity(self.batch_size);

        loop {
            select! {
                recv(self.receiver) -> msg => match msg {
                    Ok(record) => {
                        batch.push(record);
                        if batch.len() >= self.batch_size {
                            self.flush(&mut batch);
                        }
                        self.drain_available(&mut batch);
                    }
                    Err(_) => {
                        // Disconnected and empty
                        self.flush(&mut batch);
                        return;
                    }
                },
                recv(ticker) -> _ => {
                    if !batch.is_empty() {
                        self.flush(&mut batch);
                    }
                }
            }
        }
    }

    /// Pick up a burst without waiting for more input
    fn drain_available(&self, batch: &mut Vec<LogRecord>) {
        for _ in 0..self.batch_size * 2 {
            match self.receiver.try_recv() {
                Ok(record) => {
                    batch.push(record);
                    if batch.len() >= self.batch_size {
                        self.flush(batch);
                    }
                }
                Err(_) => break,
            }
        }
    }

    fn flush(&self, batch: &mut Vec<LogRecord>) {
        self.sinks.write_records(batch, &self.metrics);
        batch.clear();
    }
}
