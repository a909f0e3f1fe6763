//! Log file discovery and ingestion.
//!
//! Walks a directory tree for files whose name matches a glob pattern, then
//! reads them one after another, keeping WARN/ERROR records inside the
//! requested [`TimeWindow`].

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use cpelog_core::error::{AnalyzerError, Result};
use cpelog_core::models::{LogRecord, TimeWindow};
use glob::{MatchOptions, Pattern};
use tracing::{debug, warn};

use crate::parser::parse_line;

// ── Public types ──────────────────────────────────────────────────────────────

/// Counters collected while ingesting a file set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Files opened and read (fully or partially).
    pub files_read: usize,
    /// Files that vanished before they could be opened.
    pub files_skipped: usize,
    /// Raw lines seen across all files.
    pub lines_read: u64,
    /// Lines with the expected shape, a retained level and a valid timestamp.
    pub lines_parsed: u64,
    /// Parsed lines that also fell inside the time window.
    pub records_kept: u64,
}

impl IngestStats {
    fn absorb(&mut self, other: IngestStats) {
        self.files_read += other.files_read;
        self.files_skipped += other.files_skipped;
        self.lines_read += other.lines_read;
        self.lines_parsed += other.lines_parsed;
        self.records_kept += other.records_kept;
    }
}

/// Records in file order, then line order, plus the counters.
#[derive(Debug, Clone, Default)]
pub struct IngestOutcome {
    pub records: Vec<LogRecord>,
    pub stats: IngestStats,
}

// ── Discovery ─────────────────────────────────────────────────────────────────

/// Find all files under `dir` (recursively) whose file name matches
/// `pattern`.
///
/// Directories whose name starts with `.` are not descended into, and the
/// result is ordered by the path text (so `a-x.log` sorts before `a/b.log`).
/// A missing directory yields an empty list.
pub fn find_log_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = Pattern::new(pattern).map_err(|e| AnalyzerError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::default()
    };

    if !dir.exists() {
        warn!("Log directory does not exist: {}", dir.display());
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden_dir(entry))
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_str()
                    .map(|name| matcher.matches_with(name, options))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    Ok(files)
}

fn is_hidden_dir(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir() && entry.file_name().to_string_lossy().starts_with('.')
}

/// Like [`find_log_files`], but an empty result is a configuration error.
pub fn discover_log_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let files = find_log_files(dir, pattern)?;
    if files.is_empty() {
        return Err(AnalyzerError::NoLogFiles {
            dir: dir.to_path_buf(),
            pattern: pattern.to_string(),
        });
    }
    debug!("Found {} log files under {}", files.len(), dir.display());
    Ok(files)
}

// ── Ingestion ─────────────────────────────────────────────────────────────────

/// Read every file in order and keep the records inside `window`.
///
/// A file that disappears before it can be opened is skipped. Any other
/// failure to open a file aborts the run.
pub fn ingest(files: &[PathBuf], window: &TimeWindow) -> Result<IngestOutcome> {
    let mut outcome = IngestOutcome::default();

    for path in files {
        let (records, stats) = process_single_file(path, window)?;
        outcome.records.extend(records);
        outcome.stats.absorb(stats);
    }

    debug!(
        "Ingested {} records from {} files ({} lines read, {} skipped files)",
        outcome.stats.records_kept,
        outcome.stats.files_read,
        outcome.stats.lines_read,
        outcome.stats.files_skipped,
    );

    Ok(outcome)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn process_single_file(path: &Path, window: &TimeWindow) -> Result<(Vec<LogRecord>, IngestStats)> {
    let mut stats = IngestStats::default();

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("File vanished before reading, skipping: {}", path.display());
            stats.files_skipped = 1;
            return Ok((Vec::new(), stats));
        }
        Err(source) => {
            return Err(AnalyzerError::FileRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    stats.files_read = 1;

    let source_file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut reader = BufReader::new(file);
    let mut buf: Vec<u8> = Vec::new();
    let mut records = Vec::new();

    'chunks: loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                // Truncated or rotated underneath us; keep what was read.
                debug!("Stopped reading {}: {}", path.display(), e);
                break 'chunks;
            }
        }

        for raw in split_lines(&buf) {
            stats.lines_read += 1;

            let line = String::from_utf8_lossy(raw);
            let Some(parsed) = parse_line(&line) else {
                continue;
            };
            stats.lines_parsed += 1;

            if !window.contains(parsed.timestamp) {
                continue;
            }
            stats.records_kept += 1;
            records.push(parsed.into_record(&source_file));
        }
    }

    debug!(
        "File {}: {} lines, {} parsed, {} kept",
        path.display(),
        stats.lines_read,
        stats.lines_parsed,
        stats.records_kept,
    );

    Ok((records, stats))
}

/// Split a chunk that ends at `\n` (or at end of file) into lines, treating
/// `\r\n`, `\n` and a lone `\r` all as terminators.
fn split_lines(chunk: &[u8]) -> impl Iterator<Item = &[u8]> {
    let body = chunk.strip_suffix(b"\n").unwrap_or(chunk);
    let body = body.strip_suffix(b"\r").unwrap_or(body);
    body.split(|&b| b == b'\r')
}

// ── Tests ─────────────────────────────────────────────────────────────────────
