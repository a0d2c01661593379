//! Text canonicalization shared by queries and catalog names.

use regex::Regex;
use std::sync::LazyLock;

/// Punctuation that separates words in file names and queries.
pub(crate) const SEPARATORS: &[char] = &['_', '-', '.', ',', ';', ':', '(', ')', '[', ']', '{', '}'];

/// Spellings of the advanced level, collapsed to `al`.
static ADVANCED_LEVEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:a/l|a\s+l|advanced?\s+level)\b").unwrap());

/// Spellings of the ordinary level, collapsed to `ol`.
static ORDINARY_LEVEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:o/l|o\s+l|ordinary\s+level)\b").unwrap());

/// Canonicalize text for matching.
///
/// Lowercases, rewrites level abbreviations (`A/L`, `advanced level`, `O L`, ...)
/// to the `al`/`ol` tokens, turns separator punctuation into spaces and collapses
/// whitespace. The abbreviation rewrite runs once more on the collapsed text so
/// that forms like `a-l` only revealed by separator removal are folded too; this
/// keeps the function idempotent.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let lowered = text.to_lowercase();
    let rewritten = rewrite_levels(&lowered);

    let spaced: String = rewritten
        .chars()
        .map(|c| if SEPARATORS.contains(&c) { ' ' } else { c })
        .collect();
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");

    rewrite_levels(&collapsed)
}

fn rewrite_levels(text: &str) -> String {
    let advanced = ADVANCED_LEVEL.replace_all(text, "al");
    ORDINARY_LEVEL.replace_all(&advanced, "ol").into_owned()
}

/// Split normalized text into its whitespace-delimited words.
pub(crate) fn words(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split_whitespace()
}
