//! Cached timestamp formatting
//!
//! Producers stamp every record with a human-readable time. Formatting the
//! wall clock on every call is wasteful, so the string is refreshed at most
//! once per second and shared behind a read/write lock.

use chrono::{DateTime, Local, Utc};
use parking_lot::RwLock;
use std::time::{Duration, Instant};

/// Default layout: `2025-01-08 10:30:45`
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const REFRESH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct Cached {
    text: String,
    refreshed_at: Option<Instant>,
}

/// Read-mostly cache of the formatted current time
#[derive(Debug)]
pub struct TimeCache {
    format: String,
    local_time: bool,
    cached: RwLock<Cached>,
}

impl Default for TimeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeCache {
    pub fn new() -> Self {
        Self::with_format(DEFAULT_TIME_FORMAT, true)
    }

    /// Use a custom strftime layout, in local time or UTC
    pub fn with_format(format: impl Into<String>, local_time: bool) -> Self {
        Self {
            format: format.into(),
            local_time,
            cached: RwLock::new(Cached {
                text: String::new(),
                refreshed_at: None,
            }),
        }
    }

    /// Formatted current time, at most one second stale
    pub fn formatted_now(&self) -> String {
        self.formatted_at(Instant::now())
    }

    pub(crate) fn formatted_at(&self, now: Instant) -> String {
        {
            let cached = self.cached.read();
            if is_fresh(cached.refreshed_at, now) {
                return cached.text.clone();
            }
        }

        let mut cached = self.cached.write();
        // Another producer may have refreshed while we waited for the lock
        if is_fresh(cached.refreshed_at, now) {
            return cached.text.clone();
        }
        cached.text = self.format_wall_clock();
        cached.refreshed_at = Some(now);
        cached.text.clone()
    }

    fn format_wall_clock(&self) -> String {
        if self.local_time {
            let now: DateTime<Local> = Local::now();
            now.format(&self.format).to_string()
        } else {
            let now: DateTime<Utc> = Utc::now();
            now.format(&self.format).to_string()
        }
    }
}

fn is_fresh(refreshed_at: Option<Instant>, now: Instant) -> bool {
    refreshed_at.is_some_and(|at| now.saturating_duration_since(at) < REFRESH_INTERVAL)
}
