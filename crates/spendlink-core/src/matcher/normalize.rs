//! Text normalization for transaction descriptions and account names
//!
//! Produces the canonical token sequence every later matcher stage works on.
//! The output is pure and deterministic: it is part of the decision cache key.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::placeholder::is_placeholder;
use super::types::NormalizedText;

/// ISO dates and long digit runs (card numbers, references)
static NUMERIC_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}|\d{4,}").expect("valid regex"));

/// Card-network and bank boilerplate that appears in most descriptions.
/// Longer phrases first so they win over their prefixes.
static BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:google pay|apple pay|compras en|compra en|con la tarjeta|tarjeta)\b")
        .expect("valid regex")
});

/// Anything that is not a lowercase ASCII letter or whitespace
static NON_LETTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z\s]").expect("valid regex"));

/// Spanish function words plus wallet brand fragments
const STOP_WORDS: &[&str] = &[
    "a", "al", "con", "de", "del", "e", "el", "en", "la", "las", "lo", "los", "o", "para", "por",
    "se", "su", "sus", "un", "una", "unas", "unos", "y", "google", "pay", "apple",
];

/// Normalize free text into de-duplicated canonical tokens.
///
/// Placeholders (see [`is_placeholder`]) normalize to the empty result, both
/// on input and when the cleaned text itself collapses to a placeholder.
pub fn normalize(text: &str) -> NormalizedText {
    if text.trim().is_empty() || is_placeholder(text) {
        return NormalizedText::default();
    }

    let folded: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();

    let without_numbers = NUMERIC_NOISE.replace_all(&folded, " ");
    let without_boilerplate = BOILERPLATE.replace_all(&without_numbers, " ");
    let letters_only = NON_LETTERS.replace_all(&without_boilerplate, " ");

    let mut seen = HashSet::new();
    let tokens: Vec<String> = letters_only
        .split_whitespace()
        .filter(|t| t.len() > 1)
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .filter(|t| !STOP_WORDS.contains(t))
        .filter(|t| seen.insert(t.to_string()))
        .map(str::to_string)
        .collect();

    let normalized_text = tokens.join(" ");
    if is_placeholder(&normalized_text) {
        return NormalizedText::default();
    }

    NormalizedText {
        normalized_text,
        tokens,
    }
}

/// Normalize an optional field; `None` yields the empty result
pub fn normalize_opt(text: Option<&str>) -> NormalizedText {
    text.map(normalize).unwrap_or_default()
}
