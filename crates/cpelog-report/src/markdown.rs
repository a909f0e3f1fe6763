//! Human-readable Markdown overview of the families and their examples.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

use cpelog_core::error::{AnalyzerError, Result};
use cpelog_core::models::{format_timestamp, ExampleEntry};
use cpelog_data::aggregator::FamilyReport;

use crate::csv_files::{FAMILY_DAILY, FAMILY_HOURLY, OVERALL_DAILY, OVERALL_HOURLY};

pub const SUMMARY_MARKDOWN: &str = "summary_markdown.md";

/// Escape a value for use inside a Markdown table cell.
fn cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Render the overview: family table, time-series file list, then up to
/// `examples_per_family` example rows per family in summary order.
pub fn render_markdown(report: &FamilyReport, examples_per_family: usize) -> String {
    let mut md = String::new();

    md.push_str("# Error overview (consolidated)\n\n");
    md.push_str("| Count | Error family |\n|-------|---------------|\n");
    for row in &report.summaries {
        let _ = writeln!(md, "| {} | {} |", row.count, cell(&row.family));
    }

    md.push_str("\n---\n\n## Time series (files)\n\n");
    for name in [OVERALL_DAILY, OVERALL_HOURLY, FAMILY_DAILY, FAMILY_HOURLY] {
        let _ = writeln!(md, "- `{}`", name);
    }
    md.push('\n');

    md.push_str("## Example entries per error family\n\n");
    let mut by_family: HashMap<&str, Vec<&ExampleEntry>> = HashMap::new();
    for example in &report.examples {
        by_family
            .entry(example.family.as_str())
            .or_default()
            .push(example);
    }

    for summary in &report.summaries {
        let _ = writeln!(md, "### {}\n", summary.family);
        md.push_str("| Timestamp | Logfile | Example message |\n|-----------|---------|------------------|\n");
        let examples = by_family
            .get(summary.family.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default();
        for example in examples.iter().take(examples_per_family.max(1)) {
            let _ = writeln!(
                md,
                "| {} | {} | {} |",
                format_timestamp(example.timestamp),
                cell(&example.source_file),
                cell(&example.message)
            );
        }
        md.push('\n');
    }

    md
}

pub fn write_markdown(path: &Path, report: &FamilyReport, examples_per_family: usize) -> Result<()> {
    std::fs::write(path, render_markdown(report, examples_per_family)).map_err(|source| {
        AnalyzerError::FileWrite {
            path: path.to_path_buf(),
            source,
        }
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
