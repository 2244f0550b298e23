//! Rotating file sink
//!
//! Appends plain rendered lines to a file. When the next line would push the
//! file past its size limit, the active file is renamed to a timestamped
//! backup (`app-2025-01-08T10-30-45.123.log`), optionally gzip-compressed,
//! and old backups are pruned by count and by age.

use crate::core::{LoggerError, Result, Sink};
use chrono::{Duration as ChronoDuration, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

const MEGABYTE: u64 = 1024 * 1024;
const DEFAULT_MAX_SIZE_MB: u64 = 100;
const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";
const COMPRESS_CHUNK: usize = 64 * 1024;

/// Rotation settings for [`RotatingFileSink`]
///
/// # Examples
///
/// ```
/// use rust_field_logger::sinks::RotationPolicy;
///
/// let policy = RotationPolicy::new()
///     .with_max_size_mb(50)
///     .with_max_backups(7)
///     .with_max_age_days(14)
///     .with_compression(true);
///
/// assert_eq!(policy.max_bytes(), 50 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RotationPolicy {
    /// Size limit of the active file in megabytes; 0 means the 100 MB default
    pub max_size_mb: u64,
    /// Backups older than this many days are removed; 0 keeps them forever
    pub max_age_days: u64,
    /// Number of backups kept; 0 keeps all of them
    pub max_backups: usize,
    /// Gzip rotated backups
    pub compress: bool,
    /// Name backups with local time instead of UTC
    pub local_time: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_size_mb: DEFAULT_MAX_SIZE_MB,
            max_age_days: 90,
            max_backups: 3,
            compress: true,
            local_time: true,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size_mb(mut self, size: u64) -> Self {
        self.max_size_mb = size;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_age_days(mut self, days: u64) -> Self {
        self.max_age_days = days;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_backups(mut self, count: usize) -> Self {
        self.max_backups = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_local_time(mut self, enabled: bool) -> Self {
        self.local_time = enabled;
        self
    }

    /// Size limit in bytes
    #[must_use]
    pub fn max_bytes(&self) -> u64 {
        let mb = if self.max_size_mb == 0 {
            DEFAULT_MAX_SIZE_MB
        } else {
            self.max_size_mb
        };
        mb.saturating_mul(MEGABYTE)
    }
}

/// File sink with size-based rotation
///
/// # Examples
///
/// ```no_run
/// use rust_field_logger::sinks::{RotatingFileSink, RotationPolicy};
///
/// let sink = RotatingFileSink::with_policy(
///     "/var/log/app.log",
///     RotationPolicy::new().with_max_size_mb(10).with_max_backups(5),
/// ).unwrap();
/// ```
pub struct RotatingFileSink {
    path: PathBuf,
    policy: RotationPolicy,
    max_bytes: u64,
    writer: Option<BufWriter<File>>,
    current_size: u64,
    /// Stamp of the newest backup; the next one is always later
    last_stamp: Option<NaiveDateTime>,
}

impl RotatingFileSink {
    /// Open with the default rotation policy
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_policy(path, RotationPolicy::default())
    }

    /// Open (creating parent directories) with a custom policy
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created or opened
    pub fn with_policy<P: AsRef<Path>>(path: P, policy: RotationPolicy) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let (file, current_size) = Self::open_append(&path)?;
        let max_bytes = policy.max_bytes();

        let mut sink = Self {
            path,
            policy,
            max_bytes,
            writer: Some(BufWriter::new(file)),
            current_size,
            last_stamp: None,
        };
        sink.last_stamp = sink.existing_backups().into_iter().map(|(stamp, _)| stamp).max();
        Ok(sink)
    }

    /// Override the size limit with an exact byte count
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes.max(1);
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    fn open_append(path: &Path) -> Result<(File, u64)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::file_sink(path.display().to_string(), format!("Failed to open: {}", e))
            })?;
        let size = file
            .metadata()
            .map_err(|e| {
                LoggerError::file_sink(
                    path.display().to_string(),
                    format!("Cannot access file metadata: {}", e),
                )
            })?
            .len();
        Ok((file, size))
    }

    fn now(&self) -> NaiveDateTime {
        if self.policy.local_time {
            Local::now().naive_local()
        } else {
            Utc::now().naive_utc()
        }
    }

    /// `(stem, extension)` of the active file, extension including its dot
    fn name_parts(&self) -> (String, String) {
        let stem = self
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("app")
            .to_string();
        let ext = self
            .path
            .extension()
            .and_then(|s| s.to_str())
            .map(|e| format!(".{}", e))
            .unwrap_or_default();
        (stem, ext)
    }

    fn log_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn backup_path(&self, at: &NaiveDateTime) -> PathBuf {
        let (stem, ext) = self.name_parts();
        self.log_dir()
            .join(format!("{}-{}{}", stem, at.format(BACKUP_TIME_FORMAT), ext))
    }

    /// Timestamp encoded in a backup file name, if `name` is one of ours
    fn backup_time(&self, name: &str) -> Option<NaiveDateTime> {
        let (stem, ext) = self.name_parts();
        let rest = name.strip_prefix(&stem)?.strip_prefix('-')?;
        let rest = rest.strip_suffix(".gz").unwrap_or(rest);
        let stamp = if ext.is_empty() {
            rest
        } else {
            rest.strip_suffix(ext.as_str())?
        };
        NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT).ok()
    }

    fn should_rotate(&self, incoming: u64) -> bool {
        self.current_size > 0 && self.current_size.saturating_add(incoming) > self.max_bytes
    }

    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        // Backups sort by stamp, so a rotation in the same millisecond or
        // after the clock steps back still has to name a later file
        let mut stamp = self.now();
        if let Some(last) = self.last_stamp {
            stamp = stamp.max(last + ChronoDuration::milliseconds(1));
        }
        let mut backup = self.backup_path(&stamp);
        while backup.exists() || gz_path(&backup).exists() {
            stamp += ChronoDuration::milliseconds(1);
            backup = self.backup_path(&stamp);
        }
        self.last_stamp = Some(stamp);

        if self.path.exists() {
            fs::rename(&self.path, &backup).map_err(|e| {
                LoggerError::file_rotation(
                    self.path.display().to_string(),
                    format!("Failed to rename to '{}': {}", backup.display(), e),
                )
            })?;
        }

        let (file, size) = Self::open_append(&self.path)?;
        self.writer = Some(BufWriter::new(file));
        self.current_size = size;

        if self.policy.compress && backup.exists() {
            if let Err(e) = compress_file(&backup) {
                eprintln!("[LOGGER WARNING] Failed to compress backup: {}", e);
            }
        }
        self.prune_backups();
        Ok(())
    }

    /// Backups of this file in the log directory, with their stamps
    fn existing_backups(&self) -> Vec<(NaiveDateTime, PathBuf)> {
        let entries = match fs::read_dir(self.log_dir()) {
            Ok(entries) => entries,
            Err(e) => {
                eprintln!("[LOGGER WARNING] Cannot scan log directory for backups: {}", e);
                return Vec::new();
            }
        };

        entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name();
                let stamp = self.backup_time(name.to_str()?)?;
                Some((stamp, entry.path()))
            })
            .collect()
    }

    /// Remove backups beyond `max_backups` or older than `max_age_days`
    fn prune_backups(&self) {
        let mut backups = self.existing_backups();
        // Newest first
        backups.sort_by(|a, b| b.0.cmp(&a.0));

        let cutoff = (self.policy.max_age_days > 0).then(|| {
            let days = self.policy.max_age_days.min(100_000) as i64;
            self.now() - ChronoDuration::days(days)
        });

        for (idx, (stamp, path)) in backups.iter().enumerate() {
            let over_count = self.policy.max_backups > 0 && idx >= self.policy.max_backups;
            let too_old = cutoff.is_some_and(|c| *stamp < c);
            if over_count || too_old {
                if let Err(e) = fs::remove_file(path) {
                    eprintln!(
                        "[LOGGER WARNING] Failed to remove old backup {}: {}",
                        path.display(),
                        e
                    );
                }
            }
        }
    }

    fn reopen_after_failure(&mut self) -> Result<()> {
        if self.writer.is_none() {
            let (file, size) = Self::open_append(&self.path)?;
            self.writer = Some(BufWriter::new(file));
            self.current_size = size;
        }
        Ok(())
    }
}

fn gz_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".gz");
    PathBuf::from(name)
}

/// Gzip `path` into `path.gz` through a temporary file, removing the
/// original only once the compressed copy is complete.
fn compress_file(path: &Path) -> Result<()> {
    let gz = gz_path(path);
    let mut tmp_name = gz.clone().into_os_string();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    let input = File::open(path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to open '{}'", path.display()),
            e,
        )
    })?;
    let mut reader = BufReader::with_capacity(COMPRESS_CHUNK, input);

    let output = File::create(&tmp).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to create '{}'", tmp.display()),
            e,
        )
    })?;
    let mut encoder = flate2::write::GzEncoder::new(
        BufWriter::with_capacity(COMPRESS_CHUNK, output),
        flate2::Compression::default(),
    );

    let result = (|| -> std::io::Result<()> {
        let mut buffer = vec![0u8; COMPRESS_CHUNK];
        loop {
            let n = reader.read(&mut buffer)?;
            if n == 0 {
                break;
            }
            encoder.write_all(&buffer[..n])?;
        }
        encoder.finish()?.flush()?;
        fs::rename(&tmp, &gz)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp);
        return Err(LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress '{}'", path.display()),
            e,
        ));
    }

    if let Err(e) = fs::remove_file(path) {
        eprintln!(
            "[LOGGER WARNING] Compressed {} but could not remove the original: {}",
            path.display(),
            e
        );
    }
    Ok(())
}

impl Sink for RotatingFileSink {
    fn write_line(&mut self, line: &str) -> Result<()> {
        let incoming = line.len() as u64 + 1;

        if self.should_rotate(incoming) {
            if let Err(e) = self.rotate() {
                eprintln!("[LOGGER WARNING] Log rotation failed: {}. Continuing with current file.", e);
                self.reopen_after_failure()?;
                // Avoid retrying the rotation on every line
                self.current_size = 0;
            }
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::file_sink(self.path.display().to_string(), "writer not open"))?;

        writer
            .write_all(line.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .map_err(|e| {
                LoggerError::file_sink(
                    self.path.display().to_string(),
                    format!("Failed to write log line: {}", e),
                )
            })?;
        self.current_size += incoming;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                LoggerError::file_sink(self.path.display().to_string(), format!("Failed to flush: {}", e))
            })?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "rotating_file"
    }
}

impl Drop for RotatingFileSink {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}
