//! CSV tables: raw records, family summary, examples and time series.

use std::path::Path;

use cpelog_core::error::{AnalyzerError, Result};
use cpelog_core::models::{format_timestamp, FamilySeries, LogRecord, TimeSeriesPoint};
use cpelog_data::aggregator::FamilyReport;
use serde::Serialize;

pub const RAW_ERRORS: &str = "raw_errors.csv";
pub const SUMMARY: &str = "summary.csv";
pub const EXAMPLES: &str = "examples.csv";
pub const OVERALL_DAILY: &str = "timeseries_overall_daily.csv";
pub const OVERALL_HOURLY: &str = "timeseries_overall_hourly.csv";
pub const FAMILY_DAILY: &str = "timeseries_family_daily.csv";
pub const FAMILY_HOURLY: &str = "timeseries_family_hourly.csv";

// ── Row shapes ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct RawRow<'a> {
    timestamp: String,
    level: &'a str,
    source_file: &'a str,
    message: &'a str,
}

#[derive(Serialize)]
struct SummaryRow<'a> {
    count: usize,
    family: &'a str,
}

#[derive(Serialize)]
struct ExampleRow<'a> {
    family: &'a str,
    timestamp: String,
    source_file: &'a str,
    message: &'a str,
}

#[derive(Serialize)]
struct DailyRow<'a> {
    date: &'a str,
    count: usize,
}

#[derive(Serialize)]
struct HourlyRow<'a> {
    datetime_hour: &'a str,
    count: usize,
}

#[derive(Serialize)]
struct FamilyDailyRow<'a> {
    date: &'a str,
    family: &'a str,
    count: usize,
}

#[derive(Serialize)]
struct FamilyHourlyRow<'a> {
    datetime_hour: &'a str,
    family: &'a str,
    count: usize,
}

// ── Writers ───────────────────────────────────────────────────────────────────

/// Write `header`, then one serialized record per row.
fn write_rows<T: Serialize>(
    path: &Path,
    header: &[&str],
    rows: impl IntoIterator<Item = T>,
) -> Result<()> {
    let to_error = |e: csv::Error| AnalyzerError::FileWrite {
        path: path.to_path_buf(),
        source: e.into(),
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(to_error)?;
    writer.write_record(header).map_err(to_error)?;
    for row in rows {
        writer.serialize(row).map_err(to_error)?;
    }
    writer.flush().map_err(|source| AnalyzerError::FileWrite {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_raw_errors(path: &Path, records: &[LogRecord]) -> Result<()> {
    write_rows(
        path,
        &["timestamp", "level", "source_file", "message"],
        records.iter().map(|r| RawRow {
            timestamp: r.timestamp_text(),
            level: r.level.as_str(),
            source_file: &r.source_file,
            message: &r.message,
        }),
    )
}

pub fn write_summary(path: &Path, report: &FamilyReport) -> Result<()> {
    write_rows(
        path,
        &["count", "family"],
        report.summaries.iter().map(|s| SummaryRow {
            count: s.count,
            family: &s.family,
        }),
    )
}

pub fn write_examples(path: &Path, report: &FamilyReport) -> Result<()> {
    write_rows(
        path,
        &["family", "timestamp", "source_file", "message"],
        report.examples.iter().map(|e| ExampleRow {
            family: &e.family,
            timestamp: format_timestamp(e.timestamp),
            source_file: &e.source_file,
            message: &e.message,
        }),
    )
}

pub fn write_overall_daily(path: &Path, points: &[TimeSeriesPoint]) -> Result<()> {
    write_rows(
        path,
        &["date", "count"],
        points.iter().map(|p| DailyRow {
            date: &p.bucket_key,
            count: p.count,
        }),
    )
}

pub fn write_overall_hourly(path: &Path, points: &[TimeSeriesPoint]) -> Result<()> {
    write_rows(
        path,
        &["datetime_hour", "count"],
        points.iter().map(|p| HourlyRow {
            datetime_hour: &p.bucket_key,
            count: p.count,
        }),
    )
}

/// Families in the given order, buckets ascending within each family.
pub fn write_family_daily(path: &Path, series: &[FamilySeries]) -> Result<()> {
    write_rows(
        path,
        &["date", "family", "count"],
        series.iter().flat_map(|s| {
            s.points.iter().map(move |p| FamilyDailyRow {
                date: &p.bucket_key,
                family: &s.family,
                count: p.count,
            })
        }),
    )
}

pub fn write_family_hourly(path: &Path, series: &[FamilySeries]) -> Result<()> {
    write_rows(
        path,
        &["datetime_hour", "family", "count"],
        series.iter().flat_map(|s| {
            s.points.iter().map(move |p| FamilyHourlyRow {
                datetime_hour: &p.bucket_key,
                family: &s.family,
                count: p.count,
            })
        }),
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────
