//! Display-name cleanup for catalog entries.
//!
//! Catalog names come from an upstream export that has HTML-escaped some of
//! them several times over and injected `<div>` fragments into others. The
//! sanitizer peels a bounded number of escaping layers, removes tag-like
//! fragments in every encoding seen in the wild, and finally re-scans the
//! result so that no markup, literal or encoded, can reach a renderer.

use crate::search::normalize::SEPARATORS;
use regex::Regex;
use std::sync::LazyLock;

/// Number of HTML-unescaping passes applied to a raw name.
const UNESCAPE_PASSES: usize = 4;

/// Numeric `<` entities left behind once the unescape passes are exhausted.
static LT_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)&(?:amp;)*#(?:0*60|x0*3c)(?:;|\b)").unwrap());

/// Opening or closing `div` tags: raw, entity-escaped (once or twice) or `<`-escaped,
/// with or without attributes and a closing delimiter.
static DIV_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:<|&lt;|&amp;lt;|\\u003c)\s*/?\s*div\b(?:[^<>]*?(?:>|&gt;|&amp;gt;|\\u003e))?",
    )
    .unwrap()
});

/// Any tag-like fragment wrapped in `&lt;...&gt;`.
static ENTITY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)&(?:amp;)*lt;.*?&(?:amp;)*gt;").unwrap());

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^<>]*>").unwrap());

/// Stray angle brackets and anything that decodes to one.
static RESIDUAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[<>]|&(?:amp;)*(?:lt|gt)(?:;|\b)|&(?:amp;)*#(?:0*6[02]|x0*3[ce])(?:;|\b)|\\u003[ce]")
        .unwrap()
});

/// Clean a raw catalog name for display.
///
/// Total over all inputs. The result never contains an angle bracket nor an
/// entity that decodes to one.
pub fn sanitize(raw: &str) -> String {
    let mut text = raw.to_string();
    for _ in 0..UNESCAPE_PASSES {
        let decoded = html_escape::decode_html_entities(&text).into_owned();
        if decoded == text {
            break;
        }
        text = decoded;
    }

    let text = LT_NUMERIC.replace_all(&text, "");
    let text = DIV_FRAGMENT.replace_all(&text, "");
    let text = ENTITY_TAG.replace_all(&text, "");
    let text = HTML_TAG.replace_all(&text, "");
    let mut text = RESIDUAL.replace_all(&text, "").into_owned();

    // Removing one fragment can splice the halves of another back together.
    for _ in 0..UNESCAPE_PASSES {
        if is_markup_free(&text) {
            break;
        }
        let decoded = html_escape::decode_html_entities(&text);
        text = RESIDUAL.replace_all(&decoded, "").into_owned();
    }
    if !is_markup_free(&text) {
        tracing::warn!("Name still contains markup after sanitizing, dropping escape characters");
        text.retain(|c| !matches!(c, '<' | '>' | '&' | '\\'));
    }

    text.trim().to_string()
}

/// Whether `text` is free of angle brackets, literal or one entity-decode away.
pub fn is_markup_free(text: &str) -> bool {
    if text.contains(['<', '>']) || RESIDUAL.is_match(text) {
        return false;
    }
    !html_escape::decode_html_entities(text).contains(['<', '>'])
}

/// Sanitize a name and turn word separators into spaces for presentation.
pub fn prepare_display_name(raw: &str) -> String {
    let clean = sanitize(raw);
    let spaced = clean.replace(['_', '-'], " ");
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// File name to save downloaded content under.
///
/// Uses the sanitized catalog name with path separators and control characters
/// removed, falling back to the file id when nothing usable remains.
pub fn download_file_name(raw_name: &str, id: &str) -> String {
    let clean: String = sanitize(raw_name)
        .chars()
        .filter(|c| !c.is_control() && !matches!(c, '/' | '\\' | ':'))
        .collect();
    let clean = clean.trim().trim_matches('.');

    if clean.is_empty() {
        let fallback: String = id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || SEPARATORS.contains(c))
            .collect();
        if fallback.is_empty() {
            "download".to_string()
        } else {
            fallback
        }
    } else {
        clean.to_string()
    }
}
