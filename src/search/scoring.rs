//! Search relevance scoring.
//!
//! A score is the sum of seven components held at disjoint magnitudes, so that
//! higher-priority facets dominate any realistic combination of lower ones:
//!
//! | Component     | Scale    |
//! |---------------|----------|
//! | subject       | 10000    |
//! | year          | 1000     |
//! | medium        | 100      |
//! | document type | 10       |
//! | level         | 5        |
//! | word overlap  | 1 / word |
//! | fuzzy         | 0..=1    |
//!
//! The separation is additive, not lexicographic. Several partially matched
//! lower tiers can add up close to one step of a higher tier, and word overlap
//! is unbounded, so the ordering is an approximation of strict priority. That
//! approximation is the ranking users observe and is kept as is.

use super::attributes::{AttributeSet, Vocabulary, extract};
use super::normalize::{normalize, words};
use crate::catalog::CatalogEntry;
use ahash::AHashSet;
use serde::Serialize;
use std::collections::BTreeSet;

pub const SUBJECT_WEIGHT: f64 = 10_000.0;
pub const YEAR_WEIGHT: f64 = 1_000.0;
/// Points lost per year of distance between query and entry years.
pub const YEAR_STEP: f64 = 100.0;
pub const MEDIUM_WEIGHT: f64 = 100.0;
pub const DOC_TYPE_WEIGHT: f64 = 10.0;
pub const LEVEL_WEIGHT: f64 = 5.0;

/// Totals at or below this are dropped unless a queried subject matched.
pub const INCLUSION_THRESHOLD: f64 = 5.0;

/// Per-component breakdown of a candidate's score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ComponentScores {
    pub subject: f64,
    pub year: f64,
    pub medium: f64,
    pub doc_type: f64,
    pub level: f64,
    pub word_overlap: f64,
    pub fuzzy: f64,
}

impl ComponentScores {
    pub fn total(&self) -> f64 {
        self.subject
            + self.year
            + self.medium
            + self.doc_type
            + self.level
            + self.word_overlap
            + self.fuzzy
    }
}

/// One catalog entry with its score for the current query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate<'a> {
    pub entry: &'a CatalogEntry,
    pub raw_score: f64,
    pub components: ComponentScores,
}

/// A query prepared once and scored against many entries.
///
/// Normalization, attribute extraction and tokenization of the query side are
/// done up front so ranking a catalog only pays for the entry side.
#[derive(Debug, Clone)]
pub struct QueryProfile<'v> {
    normalized: String,
    sorted_tokens: String,
    words: AHashSet<String>,
    attributes: AttributeSet,
    vocabulary: &'v Vocabulary,
}

impl<'v> QueryProfile<'v> {
    pub fn new(query: &str, vocabulary: &'v Vocabulary) -> Self {
        let normalized = normalize(query);
        let attributes = extract(&normalized, vocabulary);
        let words = words(&normalized).map(str::to_string).collect();
        let sorted_tokens = sorted_tokens(&normalized);

        Self {
            normalized,
            sorted_tokens,
            words,
            attributes,
            vocabulary,
        }
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub const fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// Score a single catalog entry against this query.
    pub fn score<'a>(&self, entry: &'a CatalogEntry) -> ScoredCandidate<'a> {
        let normalized = normalize(&entry.name);
        let attributes = extract(&normalized, self.vocabulary);
        let query = &self.attributes;

        let entry_words: AHashSet<&str> = words(&normalized).collect();
        let overlap = entry_words
            .iter()
            .filter(|w| self.words.contains(**w))
            .count();

        let components = ComponentScores {
            subject: ratio_score(SUBJECT_WEIGHT, &query.subjects, &attributes.subjects),
            year: year_score(&query.years, &attributes.years),
            medium: ratio_score(MEDIUM_WEIGHT, &query.mediums, &attributes.mediums),
            doc_type: ratio_score(DOC_TYPE_WEIGHT, &query.doc_types, &attributes.doc_types),
            level: ratio_score(LEVEL_WEIGHT, &query.levels, &attributes.levels),
            word_overlap: overlap as f64,
            fuzzy: token_sort_ratio(&self.sorted_tokens, &sorted_tokens(&normalized)),
        };

        ScoredCandidate {
            entry,
            raw_score: components.total(),
            components,
        }
    }

    /// Whether a scored candidate is relevant enough to be returned.
    ///
    /// A query naming a subject keeps every entry matching that subject even
    /// when all other components are weak.
    pub fn retains(&self, candidate: &ScoredCandidate<'_>) -> bool {
        candidate.raw_score > INCLUSION_THRESHOLD
            || (!self.attributes.subjects.is_empty() && candidate.components.subject > 0.0)
    }
}

/// Score one entry for a raw query string.
///
/// Convenience wrapper over [`QueryProfile`]; prefer building the profile once
/// when scoring many entries.
pub fn score<'a>(query: &str, entry: &'a CatalogEntry, vocabulary: &Vocabulary) -> ScoredCandidate<'a> {
    QueryProfile::new(query, vocabulary).score(entry)
}

/// `weight × matched / queried`, or zero when the query names nothing in the facet.
fn ratio_score(weight: f64, query: &BTreeSet<String>, entry: &BTreeSet<String>) -> f64 {
    if query.is_empty() {
        return 0.0;
    }
    let matched = query.intersection(entry).count();
    weight * (matched as f64 / query.len() as f64)
}

/// Full weight for an exact year, decaying by [`YEAR_STEP`] per year of distance
/// between the closest query/entry pair.
fn year_score(query: &BTreeSet<i32>, entry: &BTreeSet<i32>) -> f64 {
    let closest = query
        .iter()
        .flat_map(|q| entry.iter().map(move |e| (e - q).abs()))
        .min();

    match closest {
        Some(0) => YEAR_WEIGHT,
        Some(distance) => YEAR_STEP.mul_add(-f64::from(distance), YEAR_WEIGHT).max(0.0),
        None => 0.0,
    }
}

fn sorted_tokens(normalized: &str) -> String {
    let mut tokens: Vec<&str> = words(normalized).collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Normalized edit similarity of two token-sorted strings, in `[0, 1]`.
fn token_sort_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    rapidfuzz::fuzz::ratio(a.chars(), b.chars()).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    fn entry(name: &str) -> CatalogEntry {
        CatalogEntry::new(name, "id")
    }

    #[rstest]
    #[case("physics 2021", "Physics_2021_Paper.pdf", 1_000.0)]
    #[case("physics 2021", "Physics_2019_Paper.pdf", 800.0)]
    #[case("physics 2021", "Physics_2031_Paper.pdf", 0.0)]
    #[case("physics 2021", "Physics_Paper.pdf", 0.0)]
    #[case("physics", "Physics_2019_Paper.pdf", 0.0)]
    #[case("2010 2020", "Chemistry 2018", 800.0)]
    fn test_year_component(#[case] query: &str, #[case] name: &str, #[case] expected: f64) {
        let vocab = Vocabulary::default();
        let e = entry(name);
        check!(score(query, &e, &vocab).components.year == expected);
    }

    #[test]
    fn test_facet_ratios() {
        let vocab = Vocabulary::default();
        let e = entry("A/L Combined Maths 2019 Sinhala Marking Scheme");
        let scored = score("combined maths physics sinhala english marking al", &e, &vocab);

        check!(scored.components.subject == SUBJECT_WEIGHT * (2.0 / 3.0));
        check!(scored.components.medium == MEDIUM_WEIGHT / 2.0);
        check!(scored.components.doc_type == DOC_TYPE_WEIGHT);
        check!(scored.components.level == LEVEL_WEIGHT);
    }

    #[test]
    fn test_word_overlap_counts_distinct_words() {
        let vocab = Vocabulary::default();
        let e = entry("royal college physics physics notes");
        let scored = score("royal physics term test", &e, &vocab);
        check!(scored.components.word_overlap == 2.0);
    }

    #[test]
    fn test_fuzzy_is_token_order_insensitive() {
        let vocab = Vocabulary::default();
        let e = entry("2021 physics");
        let scored = score("Physics-2021", &e, &vocab);
        check!(scored.components.fuzzy == 1.0);
    }

    #[test]
    fn test_fuzzy_is_bounded() {
        let vocab = Vocabulary::default();
        let e = entry("zzzz");
        let fuzzy = score("physics", &e, &vocab).components.fuzzy;
        check!((0.0..=1.0).contains(&fuzzy));
    }

    #[test]
    fn test_total_is_sum_of_components() {
        let vocab = Vocabulary::default();
        let e = entry("Physics_2021_Paper.pdf");
        let scored = score("physics 2021", &e, &vocab);
        check!(scored.raw_score == scored.components.total());
        check!(scored.raw_score > SUBJECT_WEIGHT + YEAR_WEIGHT);
    }

    #[test]
    fn test_subject_query_retains_weak_subject_match() {
        let vocab = Vocabulary::default();
        let profile = QueryProfile::new("physics chemistry biology zoology", &vocab);
        let e = entry("zoology");
        let scored = profile.score(&e);
        check!(scored.components.subject == SUBJECT_WEIGHT / 4.0);
        check!(profile.retains(&scored));
    }

    #[test]
    fn test_unrelated_entry_is_dropped() {
        let vocab = Vocabulary::default();
        let profile = QueryProfile::new("physics", &vocab);
        let e = entry("Chemistry notes");
        check!(!profile.retains(&profile.score(&e)));
    }

    #[test]
    fn test_empty_name_scores_zero() {
        let vocab = Vocabulary::default();
        let e = entry("");
        let scored = score("physics 2021", &e, &vocab);
        check!(scored.raw_score == 0.0);
    }
}
