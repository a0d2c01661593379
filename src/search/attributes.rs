//! Facet vocabularies and attribute extraction.
//!
//! Extraction is a plain set intersection between the words of a normalized
//! string and each fixed vocabulary. Years are the only facet pulled out by
//! pattern instead of lookup.

use super::normalize::{normalize, words};
use crate::error::ConfigError;
use ahash::AHashSet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Four-digit years in the 1900s and 2000s.
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}\b").unwrap());

pub const DEFAULT_SUBJECTS: &[&str] = &[
    "physics",
    "chemistry",
    "biology",
    "zoology",
    "botany",
    "mathematics",
    "maths",
    "math",
    "combined",
    "ict",
    "science",
    "technology",
    "engineering",
    "agriculture",
    "accounting",
    "economics",
    "business",
    "commerce",
    "geography",
    "history",
    "logic",
    "political",
    "buddhism",
    "christianity",
    "islam",
    "hinduism",
    "literature",
    "art",
    "music",
    "dancing",
    "drama",
    "health",
    "civics",
];

pub const DEFAULT_MEDIUMS: &[&str] = &["sinhala", "tamil", "english"];

pub const DEFAULT_LEVELS: &[&str] = &["al", "ol", "grade"];

pub const DEFAULT_DOC_TYPES: &[&str] = &["marking", "scheme", "paper", "pastpaper", "past"];

/// Reference vocabularies for the categorical facets.
///
/// Loaded from configuration (or the defaults above) once at start-up and
/// shared read-only by every search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub subjects: BTreeSet<String>,
    pub mediums: BTreeSet<String>,
    pub levels: BTreeSet<String>,
    pub doc_types: BTreeSet<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            subjects: owned_set(DEFAULT_SUBJECTS),
            mediums: owned_set(DEFAULT_MEDIUMS),
            levels: owned_set(DEFAULT_LEVELS),
            doc_types: owned_set(DEFAULT_DOC_TYPES),
        }
    }
}

fn owned_set(tokens: &[&str]) -> BTreeSet<String> {
    tokens.iter().map(|t| (*t).to_string()).collect()
}

impl Vocabulary {
    /// Check every facet list is non-empty and holds only single normalized words.
    ///
    /// A token that normalization would rewrite (uppercase, punctuation, an
    /// abbreviation spelling) could never be produced by extraction, so it is
    /// rejected instead of silently never matching.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (facet, tokens) in self.facets() {
            if tokens.is_empty() {
                return Err(ConfigError::EmptyVocabulary { facet });
            }
            for token in tokens {
                if token.is_empty()
                    || token.contains(char::is_whitespace)
                    || normalize(token) != *token
                {
                    return Err(ConfigError::InvalidToken {
                        facet,
                        token: token.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn facets(&self) -> [(&'static str, &BTreeSet<String>); 4] {
        [
            ("subjects", &self.subjects),
            ("mediums", &self.mediums),
            ("levels", &self.levels),
            ("doc_types", &self.doc_types),
        ]
    }
}

/// Structured facets pulled out of one normalized string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttributeSet {
    pub years: BTreeSet<i32>,
    pub subjects: BTreeSet<String>,
    pub mediums: BTreeSet<String>,
    pub levels: BTreeSet<String>,
    pub doc_types: BTreeSet<String>,
}

impl AttributeSet {
    /// Whether no facet was recognized at all.
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
            && self.subjects.is_empty()
            && self.mediums.is_empty()
            && self.levels.is_empty()
            && self.doc_types.is_empty()
    }
}

/// Extract the facet attributes of already-normalized text.
pub fn extract(normalized: &str, vocabulary: &Vocabulary) -> AttributeSet {
    let years = YEAR
        .find_iter(normalized)
        .filter_map(|m| m.as_str().parse().ok())
        .collect();

    let tokens: AHashSet<&str> = words(normalized).collect();

    AttributeSet {
        years,
        subjects: intersect(&tokens, &vocabulary.subjects),
        mediums: intersect(&tokens, &vocabulary.mediums),
        levels: intersect(&tokens, &vocabulary.levels),
        doc_types: intersect(&tokens, &vocabulary.doc_types),
    }
}

fn intersect(tokens: &AHashSet<&str>, vocabulary: &BTreeSet<String>) -> BTreeSet<String> {
    vocabulary
        .iter()
        .filter(|entry| tokens.contains(entry.as_str()))
        .cloned()
        .collect()
}
