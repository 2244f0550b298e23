//! Criterion benchmarks for rust_field_logger

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_field_logger::prelude::*;
use rust_field_logger::{record, TimeCache};
use std::sync::Arc;
use std::time::Instant;

/// Sink that throws lines away, so benchmarks measure the logger itself
struct Discard;

impl Sink for Discard {
    fn write_line(&mut self, line: &str) -> Result<()> {
        black_box(line);
        Ok(())
    }
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
    fn name(&self) -> &str {
        "discard"
    }
}

fn logger(async_enabled: bool) -> Logger {
    Logger::builder()
        .stdout(false)
        .async_mode(async_enabled)
        .queue_size(10_000)
        .sink(Discard)
        .build()
        .expect("Failed to build logger")
}

fn sample_record() -> LogRecord {
    record! {
        "msg" => "request handled",
        "method" => "GET",
        "path" => "/api/v1/users/42",
        "status" => 200,
        "latency_ms" => 12.5,
        "cached" => false,
    }
}

// ============================================================================
// Logging Performance Benchmarks
// ============================================================================

fn bench_sync_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync_logging");
    group.throughput(Throughput::Elements(1));

    let logger = logger(false);
    group.bench_function("info", |b| {
        b.iter(|| {
            logger.info(black_box(&mut sample_record()));
        });
    });

    group.finish();
}

fn bench_async_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("async_logging");
    group.throughput(Throughput::Elements(1));

    let logger = logger(true);
    group.bench_function("info", |b| {
        b.iter(|| {
            logger.info(black_box(&mut sample_record()));
        });
    });

    group.finish();
}

fn bench_level_filtering(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_filtering");

    let logger = logger(true);
    group.bench_function("filtered_debug", |b| {
        let mut fields = sample_record();
        b.iter(|| {
            logger.debug(black_box(&mut fields));
        });
    });

    group.bench_function("is_level_enabled", |b| {
        b.iter(|| black_box(logger.is_level_enabled(black_box(LogLevel::Debug))));
    });

    group.finish();
}

// ============================================================================
// Concurrent Logging Benchmarks
// ============================================================================

fn bench_concurrent_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_logging");

    for producers in [1usize, 4] {
        group.bench_with_input(BenchmarkId::new("producers", producers), &producers, |b, &producers| {
            b.iter_custom(|iters| {
                let logger = Arc::new(logger(true));
                let start = Instant::now();
                let handles: Vec<_> = (0..producers)
                    .map(|_| {
                        let logger = Arc::clone(&logger);
                        std::thread::spawn(move || {
                            for _ in 0..iters {
                                logger.info(&mut sample_record());
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
                logger.close();
                start.elapsed()
            });
        });
    }

    group.finish();
}

// ============================================================================
// Formatter Benchmarks
// ============================================================================

fn bench_formatting(c: &mut Criterion) {
    let mut group = c.benchmark_group("formatting");
    group.throughput(Throughput::Elements(1));

    let formatter = RecordFormatter::new();
    let record = sample_record()
        .with("time", "2025-01-08 10:30:45")
        .with("level", "INFO")
        .with("call", "/src/handlers/users.rs:88");

    group.bench_function("plain", |b| {
        b.iter(|| black_box(formatter.render(black_box(&record), false)));
    });

    group.bench_function("colored", |b| {
        b.iter(|| black_box(formatter.render(black_box(&record), true)));
    });

    group.finish();
}

fn bench_time_cache(c: &mut Criterion) {
    let cache = TimeCache::new();
    c.bench_function("time_cache_formatted_now", |b| {
        b.iter(|| black_box(cache.formatted_now()));
    });
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_sync_logging,
    bench_async_logging,
    bench_level_filtering,
    bench_concurrent_logging,
    bench_formatting,
    bench_time_cache
);

criterion_main!(benches);
