use chrono::NaiveDateTime;
use std::fmt;

/// Timestamp layout used by FileNet CPE (Liberty) log lines and by every
/// timestamp this crate writes back out.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Bucket key layout for daily time series.
pub const DAILY_BUCKET_FORMAT: &str = "%Y-%m-%d";

/// Bucket key layout for hourly time series.
pub const HOURLY_BUCKET_FORMAT: &str = "%Y-%m-%d %H:00";

/// Severity of a retained log record. Anything else is dropped by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Warn,
    Error,
}

impl LogLevel {
    /// Map an already-uppercased level word to a retained level.
    pub fn from_upper(word: &str) -> Option<Self> {
        match word {
            "WARN" => Some(Self::Warn),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single WARN/ERROR line that passed parsing and the time window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Wall-clock timestamp with millisecond precision, as written in the log.
    pub timestamp: NaiveDateTime,
    /// Retained severity.
    pub level: LogLevel,
    /// Free-text message with surrounding whitespace trimmed.
    pub message: String,
    /// File name (no directory) the line was read from.
    pub source_file: String,
}

impl LogRecord {
    /// The timestamp rendered back as `YYYY-MM-DDTHH:MM:SS.mmm`.
    pub fn timestamp_text(&self) -> String {
        format_timestamp(self.timestamp)
    }
}

/// Render a timestamp in the log-native ISO-8601 millisecond layout.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Daily bucket key, e.g. `"2024-01-15"`.
pub fn daily_bucket(ts: NaiveDateTime) -> String {
    ts.format(DAILY_BUCKET_FORMAT).to_string()
}

/// Hourly bucket key, e.g. `"2024-01-15 10:00"`.
pub fn hourly_bucket(ts: NaiveDateTime) -> String {
    ts.format(HOURLY_BUCKET_FORMAT).to_string()
}

/// Absolute `[since, until]` range used to filter records.
///
/// `since == None` means the window is unbounded in the past. A window built
/// through [`crate::time_window::resolve`] always satisfies `since <= until`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub since: Option<NaiveDateTime>,
    pub until: NaiveDateTime,
}

impl TimeWindow {
    /// Inclusive containment check on both ends.
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        if let Some(since) = self.since {
            if ts < since {
                return false;
            }
        }
        ts <= self.until
    }
}

/// Number of records observed for one family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilySummary {
    pub family: String,
    pub count: usize,
}

/// One of the earliest records of a family, kept as a representative sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleEntry {
    pub family: String,
    pub timestamp: NaiveDateTime,
    pub source_file: String,
    pub message: String,
}

/// Count for a single daily or hourly bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSeriesPoint {
    pub bucket_key: String,
    pub count: usize,
}

/// Time series restricted to one family, points ascending by bucket key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilySeries {
    pub family: String,
    pub points: Vec<TimeSeriesPoint>,
}
