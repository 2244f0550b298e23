//! Record formatter
//!
//! Renders a [`LogRecord`] as one brace-delimited `{"k":v,...}` line. Keys
//! are ordered canonical-first (`time, level, msg, info, error, warn, data,
//! flags`), then the remaining keys sorted lexicographically, then `call`.
//! With color enabled each value is wrapped in an ANSI start code and a
//! reset code; the colorized line is meant for terminals only.

use super::log_level::LogLevel;
use super::log_record::{FieldValue, LogRecord};
use colored::Color;
use std::fmt::Write;

/// Keys that always lead a rendered line, in this order
pub const CANONICAL_KEYS: [&str; 8] = [
    "time", "level", "msg", "info", "error", "warn", "data", "flags",
];

/// Call-site key, always rendered last
pub const CALL_KEY: &str = "call";

const ANSI_RESET: &str = "\x1b[0m";

/// Color for a non-level key; unknown keys share the "other" color
pub fn key_color(key: &str) -> Color {
    match key {
        "time" => Color::Black,
        "msg" | "info" => Color::Blue,
        "error" => Color::Red,
        "warn" => Color::Yellow,
        "data" => Color::Green,
        CALL_KEY => Color::Magenta,
        _ => Color::Cyan,
    }
}

#[derive(Debug, Clone)]
pub struct RecordFormatter {
    ordered_keys: Vec<String>,
}

impl Default for RecordFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordFormatter {
    pub fn new() -> Self {
        Self::with_ordered_keys(CANONICAL_KEYS)
    }

    /// Use a custom leading key order instead of [`CANONICAL_KEYS`]
    pub fn with_ordered_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered_keys: Vec<String> = Vec::new();
        for key in keys {
            let key = key.into();
            if key != CALL_KEY && !ordered_keys.contains(&key) {
                ordered_keys.push(key);
            }
        }
        Self { ordered_keys }
    }

    pub fn ordered_keys(&self) -> &[String] {
        &self.ordered_keys
    }

    /// Display order of the keys present in `record`
    pub fn key_order<'a>(&'a self, record: &'a LogRecord) -> Vec<&'a str> {
        let mut keys: Vec<&str> = self
            .ordered_keys
            .iter()
            .map(String::as_str)
            .filter(|k| record.contains_key(k))
            .collect();

        let mut rest: Vec<&str> = record
            .keys()
            .filter(|k| *k != CALL_KEY && !self.ordered_keys.iter().any(|o| o == k))
            .collect();
        rest.sort_unstable();
        keys.extend(rest);

        if record.contains_key(CALL_KEY) {
            keys.push(CALL_KEY);
        }
        keys
    }

    pub fn render(&self, record: &LogRecord, color: bool) -> String {
        let keys = self.key_order(record);
        let mut out = String::with_capacity(20 + keys.len() * 64);
        out.push('{');

        for (i, key) in keys.iter().enumerate() {
            let Some(value) = record.get(key) else {
                continue;
            };
            if i > 0 {
                out.push(',');
            }
            out.push_str(&quote(key));
            out.push(':');

            let rendered = render_value(value);
            if color {
                let code = value_color(key, value);
                let _ = write!(out, "\x1b[{}m{}{}", code.to_fg_str(), rendered, ANSI_RESET);
            } else {
                out.push_str(&rendered);
            }
        }

        out.push('}');
        out
    }
}

/// Render one value: errors as their quoted message, everything else as
/// JSON, falling back to the quoted display string when JSON fails.
pub fn render_value(value: &FieldValue) -> String {
    if let FieldValue::Error(message) = value {
        return serde_json::to_string(message).unwrap_or_else(|_| quote_escaped(message));
    }
    match serde_json::to_string(value) {
        Ok(json) => json,
        Err(_) => quote_escaped(&value.to_string()),
    }
}

fn value_color(key: &str, value: &FieldValue) -> Color {
    if key == "level" {
        if let Some(level) = value.as_str().and_then(|s| s.parse::<LogLevel>().ok()) {
            return level.color();
        }
    }
    key_color(key)
}

fn quote(key: &str) -> String {
    serde_json::to_string(key).unwrap_or_else(|_| quote_escaped(key))
}

/// Wrap in double quotes, escaping quotes, backslashes and control
/// characters the way JSON strings do
fn quote_escaped(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Remove ANSI SGR sequences (`ESC [ ... m`) from a rendered line
pub fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            for c in chars.by_ref() {
                if c == 'm' {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LogRecord {
        LogRecord::new()
            .with("zeta", 1)
            .with("call", "/src/main.rs:10")
            .with("msg", "hello")
            .with("alpha", true)
            .with("level", "INFO")
            .with("time", "2025-01-08 10:30:45")
    }

    #[test]
    fn test_key_order() {
        let formatter = RecordFormatter::new();
        let record = sample();
        assert_eq!(
            formatter.key_order(&record),
            vec!["time", "level", "msg", "alpha", "zeta", "call"]
        );
    }

    #[test]
    fn test_plain_render() {
        let line = RecordFormatter::new().render(&sample(), false);
        assert_eq!(
            line,
            r#"{"time":"2025-01-08 10:30:45","level":"INFO","msg":"hello","alpha":true,"zeta":1,"call":"/src/main.rs:10"}"#
        );
        assert!(serde_json::from_str::<serde_json::Value>(&line).is_ok());
    }

    #[test]
    fn test_color_render_wraps_values() {
        let formatter = RecordFormatter::new();
        let line = formatter.render(&sample(), true);

        assert!(line.contains("\"level\":\x1b[92m\"INFO\"\x1b[0m"));
        assert!(line.contains("\"msg\":\x1b[34m\"hello\"\x1b[0m"));
        assert!(line.contains("\"alpha\":\x1b[36mtrue\x1b[0m"));
        assert!(line.contains("\"call\":\x1b[35m\"/src/main.rs:10\"\x1b[0m"));
        assert_eq!(strip_ansi(&line), formatter.render(&sample(), false));
    }

    #[test]
    fn test_unknown_level_uses_other_color() {
        let record = LogRecord::new().with("level", "LOUD");
        let line = RecordFormatter::new().render(&record, true);
        assert_eq!(line, "{\"level\":\x1b[36m\"LOUD\"\x1b[0m}");
    }

    #[test]
    fn test_error_value_rendering() {
        let err = std::io::Error::new(std::io::ErrorKind::Other, "bad \"input\"");
        let record = LogRecord::new().with("error", FieldValue::from_error(&err));
        let line = RecordFormatter::new().render(&record, false);
        assert_eq!(line, r#"{"error":"bad \"input\""}"#);
    }

    #[test]
    fn test_error_control_characters_are_escaped() {
        let record = LogRecord::new().with("error", FieldValue::Error("a\x01b\x1b[31mc".to_string()));
        let line = RecordFormatter::new().render(&record, false);
        assert_eq!(line, r#"{"error":"a\u0001b\u001b[31mc"}"#);

        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["error"], "a\x01b\x1b[31mc");
        assert_eq!(quote_escaped("x\x7fy"), r#""x\u007fy""#);
    }

    #[test]
    fn test_serialization_fallback() {
        let record = LogRecord::new().with("ratio", f64::NAN);
        let line = RecordFormatter::new().render(&record, false);
        assert_eq!(line, r#"{"ratio":"NaN"}"#);
    }

    #[test]
    fn test_nested_values() {
        let value = FieldValue::from(serde_json::json!({"b": [1, 2], "a": null}));
        let record = LogRecord::new().with("data", value);
        let line = RecordFormatter::new().render(&record, false);
        assert_eq!(line, r#"{"data":{"a":null,"b":[1,2]}}"#);
    }

    #[test]
    fn test_custom_ordered_keys() {
        let formatter = RecordFormatter::with_ordered_keys(["msg", "call", "msg"]);
        assert_eq!(formatter.ordered_keys(), &["msg".to_string()]);

        let record = LogRecord::new()
            .with("call", "x:1")
            .with("time", "t")
            .with("msg", "m");
        assert_eq!(formatter.key_order(&record), vec!["msg", "time", "call"]);
    }

    #[test]
    fn test_empty_record() {
        assert_eq!(RecordFormatter::new().render(&LogRecord::new(), true), "{}");
    }
}
