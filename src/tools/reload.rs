//! Catalog refresh handler.

use crate::state::VaultState;
use rmcp::schemars;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct ReloadRequest {
    /// Also drop downloaded files kept in memory (default: false)
    #[serde(default)]
    pub clear_cache: bool,
}

/// Re-read the catalog from its data source and report the new totals.
pub async fn handle_reload(
    state: &VaultState,
    request: ReloadRequest,
) -> Result<String, String> {
    match state.refresh().await {
        Ok(Some(_)) => {
            let stats = state.catalog().await.stats();
            let mut msg = format!(
                "Catalog reloaded: {} papers ({} unique files).\n",
                stats.total, stats.unique_names
            );
            if request.clear_cache {
                state.clear_cache().await;
                msg.push_str("Cleared cached downloads.\n");
            }
            Ok(msg)
        }
        Ok(None) => Err("No catalog source is configured; nothing to reload.".to_string()),
        Err(e) => Err(format!(
            "Failed to reload catalog: {}. Still serving the previous {} papers.",
            e,
            state.catalog().await.len()
        )),
    }
}
