use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the log analyzer.
///
/// Only configuration and I/O problems surface as errors. Lines that do not
/// parse, carry an unsupported level, or fall outside the time window are
/// filtered silently and never reach this type.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// A relative time expression such as `"2d6h"` could not be parsed.
    #[error("Invalid relative time expression: '{0}'")]
    InvalidRelativeTime(String),

    /// The resolved window starts after it ends.
    #[error("Invalid time window: since ({since}) > until ({until})")]
    InvalidTimeWindow { since: String, until: String },

    /// The recursive scan found no file matching the pattern.
    #[error("No log files in '{dir}' for pattern '{pattern}' (recursive)")]
    NoLogFiles { dir: PathBuf, pattern: String },

    /// The file-name glob could not be compiled.
    #[error("Invalid file pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A report file could not be created or written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No pod with the requested prefix is in the `Running` phase.
    #[error("No running pods found with prefix '{prefix}' in namespace '{namespace}'")]
    NoRunningPods { prefix: String, namespace: String },

    /// An explicitly requested pod is not among the running pods.
    #[error("Pod '{pod}' is not running or does not match prefix '{prefix}'")]
    PodNotRunning { pod: String, prefix: String },

    /// An external command (`kubectl`, `tar`) exited unsuccessfully.
    #[error("Command failed: {command}: {detail}")]
    CommandFailed { command: String, detail: String },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the analyzer crates.
pub type Result<T> = std::result::Result<T, AnalyzerError>;
