//! `kubectl` argument builders and process helpers.
//!
//! Builders are pure so they can be tested without a cluster; [`run`] and
//! [`pipe_into`] do the actual spawning.

use std::path::Path;
use std::process::{Output, Stdio};

use cpelog_core::error::{AnalyzerError, Result};
use cpelog_core::settings::KubeSyncConfig;
use tokio::process::Command;
use tracing::debug;

/// Quote `s` for a POSIX shell by wrapping it in single quotes.
pub fn sh_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r#"'"'"'"#))
}

/// `kubectl exec` arguments running `script` through `sh -lc` in the container.
pub fn exec_args(cfg: &KubeSyncConfig, pod: &str, script: &str) -> Vec<String> {
    vec![
        "exec".into(),
        "-n".into(),
        cfg.namespace.clone(),
        "-c".into(),
        cfg.container.clone(),
        pod.into(),
        "--".into(),
        "sh".into(),
        "-lc".into(),
        script.into(),
    ]
}

/// `kubectl cp` arguments copying `remote` out of `pod` to `local`.
pub fn cp_args(cfg: &KubeSyncConfig, pod: &str, remote: &str, local: &Path) -> Vec<String> {
    vec![
        "cp".into(),
        "-n".into(),
        cfg.namespace.clone(),
        "--container".into(),
        cfg.container.clone(),
        format!("{}:{}", pod, remote),
        local.to_string_lossy().into_owned(),
    ]
}

/// NUL-separated list of matching files, relative to `remote_path`.
pub fn find_script(remote_path: &str, pattern: &str) -> String {
    format!(
        "cd {} && find . -type f -name {} -print0",
        sh_quote(remote_path),
        sh_quote(pattern)
    )
}

/// Gzipped tar of the matching files written to stdout.
pub fn tar_script(remote_path: &str, pattern: &str) -> String {
    format!(
        "cd {} && find . -type f -name {} -print0 | tar --null -T - -czf -",
        sh_quote(remote_path),
        sh_quote(pattern)
    )
}

/// Copy each file's bytes into a fresh tree under `snap_dir`.
pub fn snapshot_script(remote_path: &str, rel_files: &[String], snap_dir: &str) -> String {
    let snap = snap_dir.trim_end_matches('/');
    let base = remote_path.trim_end_matches('/');

    let mut steps: Vec<String> = rel_files
        .iter()
        .map(|rel| {
            let subdir = match Path::new(rel).parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_string_lossy().into_owned(),
                _ => ".".to_string(),
            };
            format!("mkdir -p {}/{}", sh_quote(snap), sh_quote(&subdir))
        })
        .collect();
    steps.extend(rel_files.iter().map(|rel| {
        format!(
            "cat {} > {}",
            sh_quote(&format!("{}/{}", base, rel)),
            sh_quote(&format!("{}/{}", snap, rel))
        )
    }));
    steps.join(" && ")
}

/// Split `find -print0` output into paths without the leading `./`.
pub fn parse_find_output(stdout: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(stdout)
        .split('\0')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| p.strip_prefix("./").unwrap_or(p).to_string())
        .collect()
}

fn describe(program: &str, args: &[String]) -> String {
    format!("{} {}", program, args.join(" "))
}

/// Run `program args…` to completion, failing on a non-zero exit status.
pub async fn run(program: &str, args: &[String]) -> Result<Output> {
    debug!("Running: {}", describe(program, args));
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| AnalyzerError::CommandFailed {
            command: describe(program, args),
            detail: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(AnalyzerError::CommandFailed {
            command: describe(program, args),
            detail: format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(output)
}

/// Stream the stdout of `producer` into the stdin of `consumer`, like a
/// shell pipe, and fail if either side exits unsuccessfully.
pub async fn pipe_into(
    producer: (&str, &[String]),
    consumer: (&str, &[String]),
) -> Result<()> {
    let (prod_prog, prod_args) = producer;
    let (cons_prog, cons_args) = consumer;
    let spawn_error = |program: &str, args: &[String], e: std::io::Error| {
        AnalyzerError::CommandFailed {
            command: describe(program, args),
            detail: e.to_string(),
        }
    };

    debug!(
        "Running: {} | {}",
        describe(prod_prog, prod_args),
        describe(cons_prog, cons_args)
    );

    let mut source = Command::new(prod_prog)
        .args(prod_args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|e| spawn_error(prod_prog, prod_args, e))?;
    let mut sink = Command::new(cons_prog)
        .args(cons_args)
        .stdin(Stdio::piped())
        .spawn()
        .map_err(|e| spawn_error(cons_prog, cons_args, e))?;

    if let (Some(mut out), Some(mut input)) = (source.stdout.take(), sink.stdin.take()) {
        tokio::io::copy(&mut out, &mut input).await?;
        // Dropping stdin signals EOF to the consumer.
    }

    for (program, args, status) in [
        (prod_prog, prod_args, source.wait().await?),
        (cons_prog, cons_args, sink.wait().await?),
    ] {
        if !status.success() {
            return Err(AnalyzerError::CommandFailed {
                command: describe(program, args),
                detail: status.to_string(),
            });
        }
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
