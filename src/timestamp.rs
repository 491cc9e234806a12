//! Timestamp parsing for join/leave columns
//!
//! Export timestamps are locale-dependent strings. Parsing never aborts the
//! pipeline: a value that matches no known format becomes an absent bound
//! and the caller degrades that interval to zero minutes.

use chrono::{DateTime, NaiveDateTime};
use thiserror::Error;

/// Built-in datetime formats, tried in order after the configured ones
pub const DEFAULT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %p %I:%M:%S",
    "%Y-%m-%d %p %I:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
    "%Y. %m. %d. %p %I:%M:%S",
    "%Y. %m. %d. %p %I:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Cell contents exports use for "no value"
const PLACEHOLDERS: &[&str] = &["", "-", "--", "n/a", "na", "nat", "null", "none"];

/// Display format for minute-resolution timestamps in reports
pub const MINUTE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Why a single timestamp value could not be used
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampParseError {
    #[error("no timestamp value")]
    Missing,

    #[error("unrecognised timestamp: {0:?}")]
    Unrecognised(String),
}

impl TimestampParseError {
    /// Placeholders are expected; only unrecognised text is worth counting
    pub fn is_unrecognised(&self) -> bool {
        matches!(self, Self::Unrecognised(_))
    }
}

/// Parser holding the ordered list of accepted formats
#[derive(Debug, Clone)]
pub struct TimestampParser {
    formats: Vec<String>,
}

impl Default for TimestampParser {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl TimestampParser {
    /// Create a parser that tries `extra` formats before the built-ins
    pub fn new(extra: &[String]) -> Self {
        let mut formats: Vec<String> = extra.to_vec();
        formats.extend(DEFAULT_FORMATS.iter().map(|f| f.to_string()));
        Self { formats }
    }

    /// Parse one cell into a wall-clock instant
    pub fn parse(&self, raw: &str) -> Result<NaiveDateTime, TimestampParseError> {
        let trimmed = raw.trim();
        if PLACEHOLDERS.contains(&trimmed.to_ascii_lowercase().as_str()) {
            return Err(TimestampParseError::Missing);
        }

        let value = localize_meridiem(trimmed);

        for format in &self.formats {
            if let Ok(parsed) = NaiveDateTime::parse_from_str(&value, format) {
                return Ok(parsed);
            }
        }

        // Offsets are dropped: every bound is compared as local wall-clock time
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&value) {
            return Ok(parsed.naive_local());
        }

        Err(TimestampParseError::Unrecognised(trimmed.to_string()))
    }

    /// Parse one cell, mapping any failure to an absent bound
    pub fn parse_instant(&self, raw: &str) -> Option<NaiveDateTime> {
        self.parse(raw).ok()
    }
}

/// Parse with the built-in formats only
pub fn try_parse_instant(raw: &str) -> Result<NaiveDateTime, TimestampParseError> {
    TimestampParser::default().parse(raw)
}

/// Parse with the built-in formats, absent on failure
pub fn parse_instant(raw: &str) -> Option<NaiveDateTime> {
    try_parse_instant(raw).ok()
}

/// Rewrite Korean meridiem markers so `%p` can read them
fn localize_meridiem(value: &str) -> String {
    value.replace("오전", "AM").replace("오후", "PM")
}

/// Whole minutes from `start` to `end`, truncated and clamped at zero
pub fn whole_minutes(start: NaiveDateTime, end: NaiveDateTime) -> u64 {
    let seconds = (end - start).num_seconds();
    if seconds <= 0 {
        0
    } else {
        (seconds / 60) as u64
    }
}

/// Render an instant at minute resolution
pub fn format_minute(instant: &NaiveDateTime) -> String {
    instant.format(MINUTE_FORMAT).to_string()
}
