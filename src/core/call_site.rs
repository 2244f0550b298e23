//! Call-site capture and path clipping
//!
//! The public logging methods are `#[track_caller]`, so
//! [`std::panic::Location::caller`] resolves to the application line that
//! invoked them. Any wrapper placed between the caller and the logger must
//! also be `#[track_caller]`, otherwise the reported location moves into
//! the wrapper.

use std::panic::Location;

/// Number of trailing path segments kept for absolute paths
const KEPT_SEGMENTS: usize = 3;

/// Format `file:line` for a captured location and clip it for display
pub fn describe(location: &Location<'_>, clip: Option<&str>) -> String {
    clip_path(&format!("{}:{}", location.file(), location.line()), clip)
}

/// Shorten a call-site path.
///
/// With a non-empty `clip`, its first occurrence is removed. Otherwise an
/// absolute path keeps its last three segments (`/a/b/c/d/e.rs` becomes
/// `/c/d/e.rs`); shorter or relative paths are returned unchanged.
pub fn clip_path(path: &str, clip: Option<&str>) -> String {
    match clip {
        Some(clip) if !clip.is_empty() => path.replacen(clip, "", 1),
        _ => {
            if !path.starts_with('/') {
                return path.to_string();
            }
            match path.rmatch_indices('/').nth(KEPT_SEGMENTS - 1) {
                Some((pos, _)) => path[pos..].to_string(),
                None => path.to_string(),
            }
        }
    }
}
