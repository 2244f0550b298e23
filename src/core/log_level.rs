//! Log level definitions
//!
//! Severity is ordered from most to least severe: `Fatal` is ordinal 0 and
//! `Trace` is ordinal 5. A threshold admits every level whose ordinal is
//! lower than or equal to its own.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LogLevel {
    Fatal = 0,
    Error = 1,
    Warn = 2,
    #[default]
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Fatal,
        LogLevel::Error,
        LogLevel::Warn,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Fatal => "FATAL",
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    #[inline]
    pub fn ordinal(&self) -> u8 {
        *self as u8
    }

    /// Returns true if a record at `level` passes this threshold
    #[inline]
    pub fn admits(&self, level: LogLevel) -> bool {
        level <= *self
    }

    /// Terminal color used for the `level` value
    pub fn color(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::Fatal => BrightMagenta,
            LogLevel::Error => BrightRed,
            LogLevel::Warn => BrightYellow,
            LogLevel::Info => BrightGreen,
            LogLevel::Debug => BrightBlue,
            LogLevel::Trace => BrightBlack,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "FATAL" => Ok(LogLevel::Fatal),
            "ERROR" => Ok(LogLevel::Error),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "INFO" => Ok(LogLevel::Info),
            "DEBUG" => Ok(LogLevel::Debug),
            "TRACE" => Ok(LogLevel::Trace),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

impl TryFrom<u8> for LogLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, String> {
        LogLevel::ALL
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| format!("Invalid log level ordinal: {}", value))
    }
}

impl Serialize for LogLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Accepts either the ordinal (`3`) or the name (`"info"`)
impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Ordinal(u8),
            Name(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Ordinal(n) => LogLevel::try_from(n).map_err(serde::de::Error::custom),
            Repr::Name(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}
