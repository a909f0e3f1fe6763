mod bootstrap;

use anyhow::Result;
use cpelog_core::error::AnalyzerError;
use cpelog_core::settings::Settings;
use cpelog_core::time_window::{self, now_in_timezone, validate_timezone};
use cpelog_data::analysis::{run_analysis, AnalysisRequest};
use cpelog_report::write_reports;

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("CPE log analyzer v{} starting", env!("CARGO_PKG_VERSION"));

    // Configuration errors abort before any file or cluster I/O.
    if !validate_timezone(&settings.timezone) {
        let msg = format!("unknown timezone '{}'", settings.timezone);
        return Err(AnalyzerError::Config(msg).into());
    }
    time_window::resolve(
        settings.since.as_deref(),
        &settings.until,
        now_in_timezone(&settings.timezone),
    )?;
    let kube = settings.kube_config()?;

    if let Some(kube) = kube {
        println!("[Kube] Copying files (mode: {}) …", settings.kube_copy_mode);
        let base = cpelog_kube::sync_pattern_only(&kube).await?;
        println!("[Kube] Files copied to {}", base.display());
    }

    let now = now_in_timezone(&settings.timezone);
    let request = AnalysisRequest {
        dir: settings.analysis_dir().to_path_buf(),
        pattern: settings.pattern.clone(),
        since: settings.since.clone(),
        until: settings.until.clone(),
        examples_per_family: settings.examples_per_family(),
    };

    let result = run_analysis(&request, now)?;
    tracing::info!(
        "Kept {} record(s) in {} families from {} file(s)",
        result.metadata.records_kept,
        result.metadata.families,
        result.metadata.files_matched
    );

    let written = write_reports(&settings.outdir, &result, settings.examples_per_family())?;

    println!("Analysis complete.");
    for path in &written {
        println!("- {}", path.display());
    }

    Ok(())
}
