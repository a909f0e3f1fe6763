use clap::Parser;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{AnalyzerError, Result};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// FileNet CPE log analyzer: error families, examples and time series
#[derive(Parser, Debug, Clone)]
#[command(
    name = "cpe-log-analyzer",
    about = "Consolidate FileNet CPE WARN/ERROR log lines into error families with time series",
    version
)]
pub struct Settings {
    /// Local directory for analysis (scanned recursively). With --kube-sync
    /// the --kube-local-path is analysed instead.
    pub logdir: PathBuf,

    /// File-name glob pattern
    #[arg(long, default_value = "*.log")]
    pub pattern: String,

    /// Example rows per error family (values below 1 mean 1)
    #[arg(long, default_value = "3", allow_negative_numbers = true)]
    pub examples: i64,

    /// Output directory
    #[arg(long, default_value = ".")]
    pub outdir: PathBuf,

    /// Relative start, e.g. "24h", "2d", "3h30m"
    #[arg(long)]
    pub since: Option<String>,

    /// Relative end from now, e.g. "0h" (now)
    #[arg(long, default_value = "0h")]
    pub until: String,

    /// Timezone whose wall clock defines "now" (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Logging level
    #[arg(long, default_value = "WARNING", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Before analysis, copy ONLY pattern-matching files from Kubernetes
    #[arg(long)]
    pub kube_sync: bool,

    #[arg(long)]
    pub kube_namespace: Option<String>,

    #[arg(long)]
    pub kube_pod_prefix: Option<String>,

    #[arg(long)]
    pub kube_container: Option<String>,

    #[arg(long)]
    pub kube_remote_path: Option<String>,

    #[arg(long)]
    pub kube_local_path: Option<PathBuf>,

    #[arg(long)]
    pub kube_file_pattern: Option<String>,

    /// Copy from ONE pod only (shared folder scenario)
    #[arg(long)]
    pub kube_single: bool,

    /// Use a specific pod (overrides auto-pick)
    #[arg(long)]
    pub kube_pod_name: Option<String>,

    /// No per-pod subfolder in kube-local-path
    #[arg(long)]
    pub kube_flatten: bool,

    /// Copy mode
    #[arg(long, default_value = "tar", value_parser = ["tar", "snapshot", "cp"])]
    pub kube_copy_mode: String,
}

// ── Kubernetes sync configuration ──────────────────────────────────────────────

/// How files are pulled out of a pod.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMode {
    /// Stream a gzipped tar of the matching files through `kubectl exec`.
    Tar,
    /// Copy matches into a temporary directory inside the pod, then `kubectl cp` it once.
    Snapshot,
    /// `kubectl cp` every matching file individually.
    Cp,
}

impl FromStr for CopyMode {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tar" => Ok(Self::Tar),
            "snapshot" => Ok(Self::Snapshot),
            "cp" => Ok(Self::Cp),
            other => Err(AnalyzerError::Config(format!("unknown copy mode: {}", other))),
        }
    }
}

/// Fully validated options for the Kubernetes sync step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubeSyncConfig {
    pub namespace: String,
    pub pod_prefix: String,
    pub container: String,
    pub remote_path: String,
    pub local_path: PathBuf,
    pub file_pattern: String,
    pub copy_mode: CopyMode,
    pub single: bool,
    pub pod_name: Option<String>,
    pub flatten: bool,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments and apply the `--debug` override.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os())
    }

    /// Same as [`Settings::load`] but accepts an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut settings = Settings::parse_from(args);
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Example rows per family; anything below one behaves as one.
    pub fn examples_per_family(&self) -> usize {
        usize::try_from(self.examples.max(1)).unwrap_or(usize::MAX)
    }

    /// Validate the companion `--kube-*` options.
    ///
    /// Returns `Ok(None)` when `--kube-sync` is off. Every missing option is
    /// reported at once so the user can fix the command line in one go.
    pub fn kube_config(&self) -> Result<Option<KubeSyncConfig>> {
        if !self.kube_sync {
            return Ok(None);
        }

        let local_path = self
            .kube_local_path
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty());
        let required: [(&str, bool); 6] = [
            ("--kube-namespace", is_set(&self.kube_namespace)),
            ("--kube-pod-prefix", is_set(&self.kube_pod_prefix)),
            ("--kube-container", is_set(&self.kube_container)),
            ("--kube-remote-path", is_set(&self.kube_remote_path)),
            ("--kube-local-path", local_path.is_some()),
            ("--kube-file-pattern", is_set(&self.kube_file_pattern)),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, present)| !present)
            .map(|(flag, _)| *flag)
            .collect();
        if !missing.is_empty() {
            return Err(AnalyzerError::Config(format!(
                "--kube-sync requires: {}",
                missing.join(", ")
            )));
        }

        Ok(Some(KubeSyncConfig {
            namespace: self.kube_namespace.clone().unwrap_or_default(),
            pod_prefix: self.kube_pod_prefix.clone().unwrap_or_default(),
            container: self.kube_container.clone().unwrap_or_default(),
            remote_path: self.kube_remote_path.clone().unwrap_or_default(),
            local_path: local_path.cloned().unwrap_or_default(),
            file_pattern: self.kube_file_pattern.clone().unwrap_or_default(),
            copy_mode: self.kube_copy_mode.parse()?,
            single: self.kube_single,
            pod_name: self.kube_pod_name.clone().filter(|p| !p.is_empty()),
            flatten: self.kube_flatten,
        }))
    }

    /// Directory that is scanned for log files.
    pub fn analysis_dir(&self) -> &Path {
        match &self.kube_local_path {
            Some(local) if self.kube_sync => local,
            _ => &self.logdir,
        }
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const KUBE_ARGS: &[&str] = &[
        "cpe-log-analyzer",
        "./logs",
        "--kube-sync",
        "--kube-namespace",
        "ecm",
        "--kube-pod-prefix",
        "cpe-",
        "--kube-container",
        "cpe",
        "--kube-remote-path",
        "/opt/ibm/wlp/usr/servers/defaultServer/logs",
        "--kube-local-path",
        "./pulled",
        "--kube-file-pattern",
        "messages*.log",
    ];

    // ── defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["cpe-log-analyzer", "/var/logs"]);

        assert_eq!(settings.logdir, PathBuf::from("/var/logs"));
        assert_eq!(settings.pattern, "*.log");
        assert_eq!(settings.examples, 3);
        assert_eq!(settings.outdir, PathBuf::from("."));
        assert!(settings.since.is_none());
        assert_eq!(settings.until, "0h");
        assert_eq!(settings.timezone, "auto");
        assert_eq!(settings.log_level, "WARNING");
        assert!(settings.log_file.is_none());
        assert!(!settings.debug);
        assert!(!settings.kube_sync);
        assert_eq!(settings.kube_copy_mode, "tar");
    }

    #[test]
    fn test_settings_logdir_is_required() {
        assert!(Settings::try_parse_from(["cpe-log-analyzer"]).is_err());
    }

    #[test]
    fn test_settings_cli_window() {
        let settings = Settings::parse_from([
            "cpe-log-analyzer",
            "logs",
            "--since",
            "2d6h",
            "--until",
            "1h",
        ]);
        assert_eq!(settings.since.as_deref(), Some("2d6h"));
        assert_eq!(settings.until, "1h");
    }

    #[test]
    fn test_settings_rejects_unknown_copy_mode() {
        let parsed = Settings::try_parse_from([
            "cpe-log-analyzer",
            "logs",
            "--kube-copy-mode",
            "rsync",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_debug_flag_overrides_log_level() {
        let settings = Settings::load_from_args(["cpe-log-analyzer", "logs", "--debug"]);
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_examples_per_family_has_floor_of_one() {
        let settings = Settings::parse_from(["cpe-log-analyzer", "logs", "--examples", "0"]);
        assert_eq!(settings.examples_per_family(), 1);
        let settings = Settings::parse_from(["cpe-log-analyzer", "logs", "--examples", "5"]);
        assert_eq!(settings.examples_per_family(), 5);
    }

    #[test]
    fn test_negative_examples_are_accepted_and_clamped() {
        let settings = Settings::try_parse_from(["cpe-log-analyzer", "logs", "--examples", "-1"])
            .expect("negative example count parses");
        assert_eq!(settings.examples, -1);
        assert_eq!(settings.examples_per_family(), 1);
    }

    // ── kube_config ───────────────────────────────────────────────────────────

    #[test]
    fn test_kube_config_absent_without_flag() {
        let settings = Settings::parse_from(["cpe-log-analyzer", "logs"]);
        assert_eq!(settings.kube_config().unwrap(), None);
        assert_eq!(settings.analysis_dir(), Path::new("logs"));
    }

    #[test]
    fn test_kube_config_complete() {
        let settings = Settings::parse_from(KUBE_ARGS);
        let cfg = settings.kube_config().unwrap().unwrap();
        assert_eq!(cfg.namespace, "ecm");
        assert_eq!(cfg.pod_prefix, "cpe-");
        assert_eq!(cfg.container, "cpe");
        assert_eq!(cfg.local_path, PathBuf::from("./pulled"));
        assert_eq!(cfg.file_pattern, "messages*.log");
        assert_eq!(cfg.copy_mode, CopyMode::Tar);
        assert!(!cfg.single);
        assert!(cfg.pod_name.is_none());
        assert_eq!(settings.analysis_dir(), Path::new("./pulled"));
    }

    #[test]
    fn test_kube_config_reports_all_missing_options() {
        let settings = Settings::parse_from([
            "cpe-log-analyzer",
            "logs",
            "--kube-sync",
            "--kube-namespace",
            "ecm",
            "--kube-container",
            "cpe",
        ]);
        let err = settings.kube_config().unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, AnalyzerError::Config(_)));
        assert!(msg.contains("--kube-sync requires:"));
        assert!(msg.contains("--kube-pod-prefix"));
        assert!(msg.contains("--kube-remote-path"));
        assert!(msg.contains("--kube-local-path"));
        assert!(msg.contains("--kube-file-pattern"));
        assert!(!msg.contains("--kube-namespace"));
        assert!(!msg.contains("--kube-container"));
    }

    #[test]
    fn test_kube_config_empty_value_counts_as_missing() {
        let mut args: Vec<&str> = KUBE_ARGS.to_vec();
        let idx = args.iter().position(|a| *a == "ecm").unwrap();
        args[idx] = "";
        let settings = Settings::parse_from(args);
        let msg = settings.kube_config().unwrap_err().to_string();
        assert!(msg.contains("--kube-namespace"));
    }

    #[test]
    fn test_kube_config_single_pod_and_mode() {
        let mut args: Vec<&str> = KUBE_ARGS.to_vec();
        args.extend([
            "--kube-single",
            "--kube-pod-name",
            "cpe-0",
            "--kube-copy-mode",
            "snapshot",
            "--kube-flatten",
        ]);
        let cfg = Settings::parse_from(args).kube_config().unwrap().unwrap();
        assert!(cfg.single);
        assert!(cfg.flatten);
        assert_eq!(cfg.pod_name.as_deref(), Some("cpe-0"));
        assert_eq!(cfg.copy_mode, CopyMode::Snapshot);
    }

    #[test]
    fn test_copy_mode_from_str() {
        assert_eq!("cp".parse::<CopyMode>().unwrap(), CopyMode::Cp);
        assert!("scp".parse::<CopyMode>().is_err());
    }
}
