//! Optional JSON export of discovery runs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

/// Writes `value` as pretty JSON to `{dir}/{kind}-{run_id}.json`.
pub async fn export_run<T: Serialize>(dir: &Path, kind: &str, run_id: Uuid, value: &T) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating results directory {}", dir.display()))?;

    let path = dir.join(format!("{kind}-{run_id}.json"));
    let body = serde_json::to_vec_pretty(value).context("serializing discovery results")?;
    tokio::fs::write(&path, body)
        .await
        .with_context(|| format!("writing {}", path.display()))?;

    info!(path = %path.display(), "discovery results exported");
    Ok(path)
}

/// Export when a results directory is configured; failures are logged only.
pub async fn maybe_export<T: Serialize>(dir: Option<&Path>, kind: &str, run_id: Uuid, value: &T) {
    let Some(dir) = dir else { return };
    if let Err(e) = export_run(dir, kind, run_id, value).await {
        warn!(error = ?e, kind, "failed to export discovery results");
    }
}
