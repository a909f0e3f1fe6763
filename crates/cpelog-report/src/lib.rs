//! Report writers for the log analyzer.
//!
//! Turns an [`AnalysisResult`] into the CSV tables and the Markdown overview
//! in an output directory. Writers only read the analysis output.

pub mod csv_files;
pub mod markdown;

use std::path::{Path, PathBuf};

use cpelog_core::error::{AnalyzerError, Result};
use cpelog_data::analysis::AnalysisResult;
use tracing::debug;

/// Write every report file into `outdir`, creating it if needed.
///
/// Returns the written paths, Markdown overview last.
pub fn write_reports(
    outdir: &Path,
    result: &AnalysisResult,
    examples_per_family: usize,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(outdir).map_err(|source| AnalyzerError::FileWrite {
        path: outdir.to_path_buf(),
        source,
    })?;

    let report = &result.report;
    let mut written = Vec::with_capacity(8);
    let mut target = |name: &str| {
        let path = outdir.join(name);
        written.push(path.clone());
        path
    };

    csv_files::write_raw_errors(&target(csv_files::RAW_ERRORS), &result.records)?;
    csv_files::write_summary(&target(csv_files::SUMMARY), report)?;
    csv_files::write_examples(&target(csv_files::EXAMPLES), report)?;
    csv_files::write_overall_daily(&target(csv_files::OVERALL_DAILY), &report.daily)?;
    csv_files::write_overall_hourly(&target(csv_files::OVERALL_HOURLY), &report.hourly)?;
    csv_files::write_family_daily(&target(csv_files::FAMILY_DAILY), &report.family_daily)?;
    csv_files::write_family_hourly(&target(csv_files::FAMILY_HOURLY), &report.family_hourly)?;
    markdown::write_markdown(
        &target(markdown::SUMMARY_MARKDOWN),
        report,
        examples_per_family,
    )?;

    debug!("Wrote {} report files to {}", written.len(), outdir.display());
    Ok(written)
}
