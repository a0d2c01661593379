//! Catalog summary handler.

use crate::state::VaultState;

pub async fn handle_stats(state: &VaultState) -> String {
    let stats = state.catalog().await.stats();
    if stats.total == 0 {
        return "The catalog is empty. Check the configured catalog path.".to_string();
    }
    format!(
        "Total papers: {}\nUnique files: {}\n",
        stats.total, stats.unique_names
    )
}
