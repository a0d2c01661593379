//! Candidate selection and ordering over a whole catalog.

use super::attributes::Vocabulary;
use super::scoring::{QueryProfile, ScoredCandidate};
use crate::catalog::CatalogEntry;
use serde::Serialize;
use std::sync::LazyLock;
use std::time::Instant;

/// Result limit used when the caller does not ask for one.
pub const DEFAULT_LIMIT: usize = 30;

static DEFAULT_VOCABULARY: LazyLock<Vocabulary> = LazyLock::new(Vocabulary::default);

/// A returned entry with its score rescaled against the best result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult<'a> {
    pub entry: &'a CatalogEntry,
    /// Internal additive score.
    pub raw_score: f64,
    /// `raw_score` as a percentage of the top result, one decimal place.
    pub display_score: f64,
}

/// Rank `catalog` against `query` using the given vocabularies.
///
/// Entries failing the inclusion rule are dropped, the rest sorted by score
/// descending (ties keep catalog order), truncated to `limit` and rescaled so
/// the first result shows `100.0`. A blank query or empty catalog yields no
/// results rather than an error.
pub fn rank<'a>(
    query: &str,
    catalog: &'a [CatalogEntry],
    limit: usize,
    vocabulary: &Vocabulary,
) -> Vec<RankedResult<'a>> {
    if query.trim().is_empty() || catalog.is_empty() || limit == 0 {
        return Vec::new();
    }

    let start = Instant::now();
    let profile = QueryProfile::new(query, vocabulary);

    let mut candidates = score_all(&profile, catalog);
    let retained = candidates.len();

    // Stable sort: equal scores stay in catalog order.
    candidates.sort_by(|a, b| b.raw_score.total_cmp(&a.raw_score));
    candidates.truncate(limit);

    let max = candidates
        .iter()
        .map(|c| c.raw_score)
        .fold(0.0_f64, f64::max);
    let max = if max == 0.0 { 1.0 } else { max };

    let results: Vec<_> = candidates
        .into_iter()
        .map(|c| RankedResult {
            entry: c.entry,
            raw_score: c.raw_score,
            display_score: (c.raw_score / max * 1000.0).round() / 10.0,
        })
        .collect();

    tracing::debug!(
        "Ranked '{}': {} scored, {} retained, {} returned in {:?}",
        profile.normalized(),
        catalog.len(),
        retained,
        results.len(),
        start.elapsed()
    );

    results
}

/// Rank with the built-in vocabularies.
///
/// `limit` defaults to [`DEFAULT_LIMIT`].
pub fn search<'a>(
    query: &str,
    catalog: &'a [CatalogEntry],
    limit: Option<usize>,
) -> Vec<RankedResult<'a>> {
    rank(
        query,
        catalog,
        limit.unwrap_or(DEFAULT_LIMIT),
        &DEFAULT_VOCABULARY,
    )
}

/// Catalogs smaller than this are scored on the calling thread.
pub const PARALLEL_MIN_ENTRIES: usize = 2048;

/// Score every entry and keep the ones passing the inclusion rule, in catalog order.
fn score_all<'a>(profile: &QueryProfile<'_>, catalog: &'a [CatalogEntry]) -> Vec<ScoredCandidate<'a>> {
    #[cfg(feature = "parallel")]
    if catalog.len() >= PARALLEL_MIN_ENTRIES {
        return score_parallel(profile, catalog);
    }

    score_sequential(profile, catalog)
}

fn score_sequential<'a>(
    profile: &QueryProfile<'_>,
    catalog: &'a [CatalogEntry],
) -> Vec<ScoredCandidate<'a>> {
    catalog
        .iter()
        .map(|entry| profile.score(entry))
        .filter(|candidate| profile.retains(candidate))
        .collect()
}

#[cfg(feature = "parallel")]
fn score_parallel<'a>(
    profile: &QueryProfile<'_>,
    catalog: &'a [CatalogEntry],
) -> Vec<ScoredCandidate<'a>> {
    use rayon::prelude::*;

    catalog
        .par_iter()
        .map(|entry| profile.score(entry))
        .filter(|candidate| profile.retains(candidate))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    fn catalog(names: &[&str]) -> Vec<CatalogEntry> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| CatalogEntry::new(*name, format!("id-{i}")))
            .collect()
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\t\n")]
    fn test_blank_query_is_empty(#[case] query: &str) {
        let entries = catalog(&["Physics_2021_Paper.pdf"]);
        check!(search(query, &entries, None).is_empty());
    }

    #[test]
    fn test_empty_catalog_is_empty() {
        check!(search("physics", &[], None).is_empty());
    }

    #[test]
    fn test_zero_limit_is_empty() {
        let entries = catalog(&["Physics_2021_Paper.pdf"]);
        check!(search("physics", &entries, Some(0)).is_empty());
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let entries = catalog(&[
            "Physics_2021_Paper.pdf",
            "Physics_2021_Paper.pdf",
            "Physics_2021_Paper.pdf",
        ]);
        let results = search("physics 2021", &entries, None);

        let ids: Vec<&str> = results.iter().map(|r| r.entry.id.as_str()).collect();
        check!(ids == ["id-0", "id-1", "id-2"]);
        check!(results.iter().all(|r| r.display_score == 100.0));
    }

    #[test]
    fn test_truncates_and_rescales() {
        let names: Vec<String> = (0..100)
            .map(|i| format!("Physics_{}_Paper.pdf", 1950 + i))
            .collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let entries = catalog(&refs);

        let results = search("physics 2021", &entries, Some(30));

        check!(results.len() == 30);
        check!(results[0].display_score == 100.0);
        check!(results[0].entry.name == "Physics_2021_Paper.pdf");
        check!(
            results
                .windows(2)
                .all(|w| w[0].display_score >= w[1].display_score)
        );
        check!(results.iter().all(|r| (0.0..=100.0).contains(&r.display_score)));
    }

    #[test]
    fn test_display_score_has_one_decimal() {
        let entries = catalog(&["Physics_2021_Paper.pdf", "Physics_2017_Paper.pdf"]);
        let results = search("physics 2021", &entries, None);

        for result in &results {
            let tenths = result.display_score * 10.0;
            check!((tenths - tenths.round()).abs() < 1e-9);
        }
    }

    fn large_catalog() -> Vec<CatalogEntry> {
        let subjects = ["Physics", "Chemistry", "Biology", "Combined_Maths"];
        let mediums = ["Sinhala", "Tamil", "English"];
        (0..PARALLEL_MIN_ENTRIES + 500)
            .map(|i| {
                let name = format!(
                    "{}_{}_{}_Paper.pdf",
                    subjects[i % subjects.len()],
                    2000 + i % 25,
                    mediums[i % mediums.len()]
                );
                CatalogEntry::new(name, format!("id-{i}"))
            })
            .collect()
    }

    #[test]
    fn test_large_catalog_ranks_matching_entries_first() {
        let entries = large_catalog();
        let results = search("physics 2012 sinhala", &entries, Some(10));

        check!(results.len() == 10);
        check!(results[0].entry.name == "Physics_2012_Sinhala_Paper.pdf");
        check!(results[0].display_score == 100.0);
        check!(
            results
                .windows(2)
                .all(|w| w[0].display_score >= w[1].display_score)
        );
    }

    #[test]
    fn test_sequential_scoring_keeps_catalog_order() {
        let entries = large_catalog();
        let vocabulary = Vocabulary::default();
        let profile = QueryProfile::new("chemistry 2003", &vocabulary);

        let scored = score_sequential(&profile, &entries);
        check!(!scored.is_empty());
        check!(scored.len() < entries.len());

        let positions: Vec<usize> = scored
            .iter()
            .map(|c| entries.iter().position(|e| std::ptr::eq(e, c.entry)).unwrap())
            .collect();
        check!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_and_sequential_scoring_agree() {
        let entries = large_catalog();
        let vocabulary = Vocabulary::default();
        let profile = QueryProfile::new("a/l combined maths 2010 tamil", &vocabulary);

        let summary = |scored: Vec<ScoredCandidate<'_>>| -> Vec<(String, f64)> {
            scored
                .into_iter()
                .map(|c| (c.entry.id.clone(), c.raw_score))
                .collect()
        };

        check!(
            summary(score_parallel(&profile, &entries))
                == summary(score_sequential(&profile, &entries))
        );
    }
}
