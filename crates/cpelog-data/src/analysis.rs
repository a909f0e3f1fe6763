//! Main analysis pipeline.
//!
//! Resolves the time window, discovers and ingests log files, and aggregates
//! the surviving records into an [`AnalysisResult`] for the report writers.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use cpelog_core::error::Result;
use cpelog_core::models::{format_timestamp, LogRecord};
use cpelog_core::time_window;
use tracing::info;

use crate::aggregator::{FamilyAggregator, FamilyReport};
use crate::reader::{discover_log_files, ingest};

// ── Public types ──────────────────────────────────────────────────────────────

/// Inputs for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// Directory scanned recursively for log files.
    pub dir: PathBuf,
    /// File-name glob, e.g. `"*.log"`.
    pub pattern: String,
    /// Relative start; `None` means unbounded.
    pub since: Option<String>,
    /// Relative end from now.
    pub until: String,
    /// Example rows kept per family.
    pub examples_per_family: usize,
}

/// Metadata produced alongside the analysis result.
#[derive(Debug, Clone)]
pub struct AnalysisMetadata {
    /// The instant the window was anchored to.
    pub generated_at: String,
    /// Resolved window start, if bounded.
    pub since: Option<String>,
    /// Resolved window end.
    pub until: String,
    /// Number of files matched by the pattern.
    pub files_matched: usize,
    /// Files that vanished before they could be read.
    pub files_skipped: usize,
    /// Raw lines read.
    pub lines_read: u64,
    /// WARN/ERROR records inside the window.
    pub records_kept: usize,
    /// Distinct families.
    pub families: usize,
    /// Wall-clock seconds spent reading files.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent aggregating.
    pub aggregate_time_seconds: f64,
}

/// The complete output of [`run_analysis`].
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Every ingested record, in file then line order.
    pub records: Vec<LogRecord>,
    /// Families, examples and time series.
    pub report: FamilyReport,
    pub metadata: AnalysisMetadata,
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full analysis pipeline anchored at `now`.
///
/// 1. Resolve the time window. Invalid expressions fail before any file I/O.
/// 2. Discover files. An empty file set is a configuration error.
/// 3. Ingest records in file order, then line order.
/// 4. Aggregate into families, examples and time series.
pub fn run_analysis(request: &AnalysisRequest, now: NaiveDateTime) -> Result<AnalysisResult> {
    // ── Step 1: Time window ───────────────────────────────────────────────────
    let window = time_window::resolve(request.since.as_deref(), &request.until, now)?;

    // ── Step 2: Discover files ────────────────────────────────────────────────
    let files = discover_log_files(&request.dir, &request.pattern)?;

    // ── Step 3: Ingest ────────────────────────────────────────────────────────
    let load_start = std::time::Instant::now();
    let outcome = ingest(&files, &window)?;
    let load_time_seconds = load_start.elapsed().as_secs_f64();
    info!(
        "Loaded {} records from {} files in {:.3}s",
        outcome.records.len(),
        files.len(),
        load_time_seconds
    );

    // ── Step 4: Aggregate ─────────────────────────────────────────────────────
    let aggregate_start = std::time::Instant::now();
    let report = FamilyAggregator::aggregate(&outcome.records, request.examples_per_family);
    let aggregate_time_seconds = aggregate_start.elapsed().as_secs_f64();
    info!(
        "Aggregated into {} families in {:.3}s",
        report.summaries.len(),
        aggregate_time_seconds
    );

    let metadata = AnalysisMetadata {
        generated_at: format_timestamp(now),
        since: window.since.map(format_timestamp),
        until: format_timestamp(window.until),
        files_matched: files.len(),
        files_skipped: outcome.stats.files_skipped,
        lines_read: outcome.stats.lines_read,
        records_kept: outcome.records.len(),
        families: report.summaries.len(),
        load_time_seconds,
        aggregate_time_seconds,
    };

    Ok(AnalysisResult {
        records: outcome.records,
        report,
        metadata,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
