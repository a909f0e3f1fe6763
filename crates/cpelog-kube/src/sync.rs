//! Copy pattern-matching log files out of running pods.

use std::path::{Path, PathBuf};

use cpelog_core::error::{AnalyzerError, Result};
use cpelog_core::settings::{CopyMode, KubeSyncConfig};
use tracing::warn;
use walkdir::WalkDir;

use crate::command::{self, cp_args, exec_args, find_script, snapshot_script, tar_script};
use crate::pods::{list_running_pods, select_pods};

const SNAPSHOT_PREFIX: &str = "/tmp/filenet-log-snap-";

/// Local directory that receives the files of `pod`.
pub fn pod_destination(cfg: &KubeSyncConfig, pod: &str) -> PathBuf {
    if cfg.flatten {
        cfg.local_path.clone()
    } else {
        cfg.local_path.join(pod)
    }
}

fn remote_join(base: &str, rel: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), rel)
}

async fn ensure_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| AnalyzerError::FileWrite {
            path: path.to_path_buf(),
            source,
        })
}

/// The `[Kube]` lines printed before copying starts.
pub fn progress_header(cfg: &KubeSyncConfig, pods: &[String]) -> Vec<String> {
    vec![
        format!("[Kube] Pods to use: {}", pods.join(", ")),
        format!("[Kube] Remote base dir: {}", cfg.remote_path),
        format!("[Kube] Pattern to copy (only matches): {}", cfg.file_pattern),
        format!(
            "[Kube] Local base: {}{}",
            cfg.local_path.display(),
            if cfg.flatten { "" } else { "/<pod>/" }
        ),
    ]
}

/// Copy the files matching the configured pattern from the selected pods
/// into the local path, one pod at a time. Progress goes to stdout. Returns
/// the local base directory.
pub async fn sync_pattern_only(cfg: &KubeSyncConfig) -> Result<PathBuf> {
    let running = list_running_pods(&cfg.namespace, &cfg.pod_prefix).await?;
    let pods = select_pods(running, cfg)?;

    for line in progress_header(cfg, &pods) {
        println!("{}", line);
    }
    ensure_dir(&cfg.local_path).await?;

    for pod in &pods {
        let dest = pod_destination(cfg, pod);
        ensure_dir(&dest).await?;

        match cfg.copy_mode {
            CopyMode::Tar => tar_stream(cfg, pod, &dest).await?,
            CopyMode::Snapshot | CopyMode::Cp => {
                let rel_files = remote_find_files(cfg, pod).await?;
                if rel_files.is_empty() {
                    println!("[Kube] No matching files found in pod {}.", pod);
                } else if cfg.copy_mode == CopyMode::Snapshot {
                    snapshot_then_copy(cfg, pod, &rel_files, &dest).await?;
                } else {
                    copy_each(cfg, pod, &rel_files, &dest).await?;
                }
            }
        }
    }

    Ok(cfg.local_path.clone())
}

/// Stream a gzipped tar of the matches through `kubectl exec` into a local
/// `tar -xzf -`.
async fn tar_stream(cfg: &KubeSyncConfig, pod: &str, dest: &Path) -> Result<()> {
    let remote = exec_args(cfg, pod, &tar_script(&cfg.remote_path, &cfg.file_pattern));
    let local = vec![
        "-xzf".to_string(),
        "-".to_string(),
        "-C".to_string(),
        dest.to_string_lossy().into_owned(),
    ];
    command::pipe_into(("kubectl", &remote), ("tar", &local)).await
}

/// Matching files in the pod, relative to the remote base path.
pub async fn remote_find_files(cfg: &KubeSyncConfig, pod: &str) -> Result<Vec<String>> {
    let args = exec_args(cfg, pod, &find_script(&cfg.remote_path, &cfg.file_pattern));
    let output = command::run("kubectl", &args).await?;
    Ok(command::parse_find_output(&output.stdout))
}

async fn snapshot_then_copy(
    cfg: &KubeSyncConfig,
    pod: &str,
    rel_files: &[String],
    dest: &Path,
) -> Result<()> {
    let snap_dir = format!("{}{}", SNAPSHOT_PREFIX, chrono::Utc::now().timestamp());

    let script = snapshot_script(&cfg.remote_path, rel_files, &snap_dir);
    command::run("kubectl", &exec_args(cfg, pod, &script)).await?;

    ensure_dir(dest).await?;
    command::run("kubectl", &cp_args(cfg, pod, &snap_dir, dest)).await?;

    let cleanup = format!("rm -rf {}", command::sh_quote(&snap_dir));
    command::run("kubectl", &exec_args(cfg, pod, &cleanup)).await?;

    let snap_name = snap_dir.trim_start_matches("/tmp/");
    lift_snapshot(dest, snap_name)
}

/// Move everything under `base/<snap_name>/` one level up into `base`, then
/// remove the emptied snapshot directory. A missing snapshot directory is
/// not an error.
pub fn lift_snapshot(base: &Path, snap_name: &str) -> Result<()> {
    let snap_root = base.join(snap_name);
    if !snap_root.is_dir() {
        return Ok(());
    }

    for entry in WalkDir::new(&snap_root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let Ok(rel) = entry.path().strip_prefix(&snap_root) else {
            continue;
        };
        let target = base.join(rel);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|source| AnalyzerError::FileWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::rename(entry.path(), &target).map_err(|source| AnalyzerError::FileWrite {
            path: target.clone(),
            source,
        })?;
    }

    if let Err(e) = std::fs::remove_dir_all(&snap_root) {
        warn!("Could not remove {}: {}", snap_root.display(), e);
    }
    Ok(())
}

/// `kubectl cp` each file; a failed copy is logged and the rest continue.
async fn copy_each(
    cfg: &KubeSyncConfig,
    pod: &str,
    rel_files: &[String],
    dest: &Path,
) -> Result<()> {
    for rel in rel_files {
        let remote_full = remote_join(&cfg.remote_path, rel);
        let local_full = dest.join(rel);
        if let Some(parent) = local_full.parent() {
            ensure_dir(parent).await?;
        }
        if let Err(e) = command::run("kubectl", &cp_args(cfg, pod, &remote_full, &local_full)).await
        {
            warn!(
                "[Kube] ERROR copying {}:{} -> {}: {}",
                pod,
                remote_full,
                local_full.display(),
                e
            );
        }
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
