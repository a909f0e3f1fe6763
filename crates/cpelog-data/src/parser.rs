//! Line-level parsing of FileNet CPE (Liberty) log output.
//!
//! Expected shape:
//!
//! ```text
//! 2024-01-15T10:30:00.123 <token> <token> <token> - ERROR free text message
//! ```
//!
//! The three tokens between the timestamp and the `-` separator are opaque.

use std::sync::LazyLock;

use chrono::{NaiveDateTime, Timelike};
use cpelog_core::models::{LogLevel, LogRecord, TIMESTAMP_FORMAT};
use regex::Regex;

static LOG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<ts>\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3})\s+\S+\s+\S+\s+\S+\s+-\s+(?P<level>\w+)\s+(?P<msg>.*)$",
    )
    .expect("regex is valid")
});

/// The parts of a retained line, before the source file is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub timestamp: NaiveDateTime,
    pub level: LogLevel,
    pub message: String,
}

impl ParsedLine {
    pub fn into_record(self, source_file: &str) -> LogRecord {
        LogRecord {
            timestamp: self.timestamp,
            level: self.level,
            message: self.message,
            source_file: source_file.to_string(),
        }
    }
}

/// Parse one raw line.
///
/// Returns `None` when the line does not have the expected shape, its level
/// is neither `ERROR` nor `WARN` (case-insensitive), or its timestamp is not a
/// real calendar instant. None of these are errors: rotated or partially
/// written files routinely contain such lines.
pub fn parse_line(raw_line: &str) -> Option<ParsedLine> {
    let line = raw_line.trim_end_matches(['\r', '\n']);
    let caps = LOG_LINE.captures(line)?;

    let level = LogLevel::from_upper(&caps["level"].to_uppercase())?;
    let timestamp = NaiveDateTime::parse_from_str(&caps["ts"], TIMESTAMP_FORMAT).ok()?;
    // chrono encodes second 60 as a leap second; wall-clock logs never do.
    if timestamp.nanosecond() >= 1_000_000_000 {
        return None;
    }

    Some(ParsedLine {
        timestamp,
        level,
        message: caps["msg"].trim().to_string(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
