//! Ranked catalog search handler.

use crate::display::prepare_display_name;
use crate::search::{QueryProfile, RankedResult, rank};
use crate::state::VaultState;
use rmcp::schemars;
use serde::Deserialize;
use std::fmt::Write as _;

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchRequest {
    /// Free-text query, e.g. "a/l physics 2021 sinhala marking scheme"
    pub query: String,
    /// Maximum number of results to return (default: configured limit, 30)
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Run a search against the current catalog snapshot.
pub async fn handle_search(state: &VaultState, request: SearchRequest) -> Result<String, String> {
    let limit = request.limit.unwrap_or_else(|| state.default_limit());
    if limit == 0 {
        return Err("limit must be at least 1".to_string());
    }

    let catalog = state.catalog().await;
    if catalog.is_empty() {
        return Err("The catalog is empty. Check the configured catalog path.".to_string());
    }

    if request.query.trim().is_empty() {
        let stats = catalog.stats();
        return Ok(format!(
            "Enter a query to search {} papers ({} unique files).\n",
            stats.total, stats.unique_names
        ));
    }

    let results = rank(&request.query, catalog.entries(), limit, state.vocabulary());
    if results.is_empty() {
        let mut msg = format!("No results found for '{}'.\n\n", request.query);
        msg.push_str("Search tips:\n");
        if QueryProfile::new(&request.query, state.vocabulary())
            .attributes()
            .is_empty()
        {
            msg.push_str("• No subject, year, medium, level or document type was recognized\n");
        }
        msg.push_str("• Start with the subject, e.g. 'physics' or 'combined maths'\n");
        msg.push_str("• Add a year (2015) and a medium (sinhala, tamil, english)\n");
        msg.push_str("• 'A/L', 'a l' and 'advanced level' are treated the same\n");
        return Ok(msg);
    }

    Ok(format_search_results(&results, &request.query, catalog.len()))
}

/// Format ranked results into a readable listing.
pub fn format_search_results(results: &[RankedResult<'_>], query: &str, total: usize) -> String {
    let mut output = format!(
        "Search results for '{}' ({} of {} papers):\n\n",
        query,
        results.len(),
        total
    );

    for (idx, result) in results.iter().enumerate() {
        let _ = writeln!(
            output,
            "{}. {} - relevance: {:.1}%",
            idx + 1,
            prepare_display_name(&result.entry.name),
            result.display_score
        );
        let _ = writeln!(output, "   id: {}", result.entry.id);
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, CatalogEntry};
    use crate::error::FetchError;
    use crate::fetch::BlobFetcher;
    use crate::search::Vocabulary;
    use assert2::{check, let_assert};
    use std::sync::Arc;

    struct NoFetch;

    #[async_trait::async_trait]
    impl BlobFetcher for NoFetch {
        async fn fetch_content(&self, _id: &str) -> Result<Vec<u8>, FetchError> {
            Err(FetchError::Auth("disabled".to_string()))
        }
    }

    fn state(entries: Vec<CatalogEntry>) -> VaultState {
        VaultState::new(
            Catalog::new(entries),
            Vocabulary::default(),
            30,
            Arc::new(NoFetch),
            1,
        )
    }

    fn request(query: &str, limit: Option<usize>) -> SearchRequest {
        SearchRequest {
            query: query.to_string(),
            limit,
        }
    }

    #[tokio::test]
    async fn test_results_use_display_names() {
        let state = state(vec![
            CatalogEntry::new("&lt;div&gt;Physics_2021-Paper.pdf&lt;/div&gt;", "p21"),
            CatalogEntry::new("Chemistry_2021.pdf", "c21"),
        ]);

        let_assert!(Ok(text) = handle_search(&state, request("physics 2021", None)).await);
        check!(text.contains("1. Physics 2021 Paper.pdf - relevance: 100.0%"));
        check!(text.contains("   id: p21"));
        check!(!text.contains("div"));
    }

    #[tokio::test]
    async fn test_no_results_gives_tips() {
        let state = state(vec![CatalogEntry::new("Chemistry_2021.pdf", "c21")]);
        let_assert!(Ok(text) = handle_search(&state, request("zzzz", None)).await);
        check!(text.starts_with("No results found for 'zzzz'"));
        check!(text.contains("No subject, year, medium, level or document type was recognized"));
    }

    #[tokio::test]
    async fn test_blank_query_reports_catalog_size() {
        let state = state(vec![CatalogEntry::new("Chemistry_2021.pdf", "c21")]);
        let_assert!(Ok(text) = handle_search(&state, request("   ", None)).await);
        check!(text.contains("1 papers"));
    }

    #[tokio::test]
    async fn test_zero_limit_and_empty_catalog_are_errors() {
        let state = state(vec![CatalogEntry::new("Chemistry_2021.pdf", "c21")]);
        check!(handle_search(&state, request("chemistry", Some(0))).await.is_err());

        state.replace_catalog(Catalog::default()).await;
        check!(handle_search(&state, request("chemistry", None)).await.is_err());
    }
}
