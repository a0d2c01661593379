//! Download handler: fetch a paper and save it to disk.

use crate::config::expand_tilde;
use crate::display::download_file_name;
use crate::error::Result;
use crate::state::VaultState;
use anyhow::Context as _;
use rmcp::schemars;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DownloadRequest {
    /// File id as shown in search results
    pub file_id: String,
    /// Directory to save into (default: current directory)
    #[serde(default)]
    pub output_dir: Option<String>,
}

/// Fetch `id` through the session cache and write it into `dir`.
///
/// The file is named after the catalog entry's display name, or after the id
/// when the entry is unknown. Returns the written path.
pub async fn save_paper(state: &VaultState, id: &str, dir: &Path) -> Result<PathBuf> {
    let id = id.trim();
    let catalog = state.catalog().await;
    let file_name = match catalog.find(id) {
        Some(entry) => download_file_name(&entry.name, id),
        None => {
            tracing::debug!("File id {} is not in the catalog", id);
            download_file_name("", id)
        }
    };

    let blob = state
        .fetch(id)
        .await
        .with_context(|| format!("Failed to fetch file {}", id))?;

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, blob.as_slice())
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!("Saved {} ({} bytes)", path.display(), blob.len());
    Ok(path)
}

pub async fn handle_download(
    state: &VaultState,
    request: DownloadRequest,
) -> std::result::Result<String, String> {
    if request.file_id.trim().is_empty() {
        return Err("file_id must not be empty".to_string());
    }

    let dir = request
        .output_dir
        .as_deref()
        .map_or_else(|| PathBuf::from("."), |d| PathBuf::from(expand_tilde(d).as_ref()));

    let path = save_paper(state, &request.file_id, &dir)
        .await
        .map_err(|e| format!("{:#}", e))?;

    Ok(format!("Downloaded to {}\n", path.display()))
}
