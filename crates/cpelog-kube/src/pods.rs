//! Running-pod discovery and selection.

use cpelog_core::error::{AnalyzerError, Result};
use cpelog_core::settings::KubeSyncConfig;
use serde::Deserialize;
use tracing::debug;

use crate::command;

const RUNNING: &str = "Running";

// ── `kubectl get pods -o json` shape ──────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct PodList {
    #[serde(default)]
    items: Vec<PodItem>,
}

#[derive(Debug, Default, Deserialize)]
struct PodItem {
    #[serde(default)]
    metadata: PodMetadata,
    #[serde(default)]
    status: PodStatus,
}

#[derive(Debug, Default, Deserialize)]
struct PodMetadata {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct PodStatus {
    #[serde(default)]
    phase: String,
}

/// Names of the pods in a pod-list document that start with `prefix` and
/// are in phase `Running`, in document order. Pods without a name are
/// dropped since they cannot be addressed.
pub fn parse_running_pods(json: &str, prefix: &str) -> Result<Vec<String>> {
    let list: PodList = serde_json::from_str(json)?;
    Ok(list
        .items
        .into_iter()
        .filter(|item| {
            !item.metadata.name.is_empty()
                && item.metadata.name.starts_with(prefix)
                && item.status.phase == RUNNING
        })
        .map(|item| item.metadata.name)
        .collect())
}

/// Query the cluster for running pods matching `prefix` in `namespace`.
pub async fn list_running_pods(namespace: &str, prefix: &str) -> Result<Vec<String>> {
    let args: Vec<String> = ["get", "pods", "-n", namespace, "-o", "json"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let output = command::run("kubectl", &args).await?;
    let pods = parse_running_pods(&String::from_utf8_lossy(&output.stdout), prefix)?;
    debug!("{} running pod(s) match prefix {:?}", pods.len(), prefix);
    Ok(pods)
}

/// Narrow the running pods down to the ones to copy from.
///
/// With `single`, an explicit `pod_name` must be among `running`; without
/// one the first running pod is used. Otherwise every running pod is kept.
pub fn select_pods(running: Vec<String>, cfg: &KubeSyncConfig) -> Result<Vec<String>> {
    if running.is_empty() {
        return Err(AnalyzerError::NoRunningPods {
            prefix: cfg.pod_prefix.clone(),
            namespace: cfg.namespace.clone(),
        });
    }
    if !cfg.single {
        return Ok(running);
    }

    match &cfg.pod_name {
        Some(name) if running.iter().any(|p| p == name) => Ok(vec![name.clone()]),
        Some(name) => Err(AnalyzerError::PodNotRunning {
            pod: name.clone(),
            prefix: cfg.pod_prefix.clone(),
        }),
        None => Ok(running.into_iter().take(1).collect()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
