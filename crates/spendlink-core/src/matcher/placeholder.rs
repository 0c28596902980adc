//! Detection of "no information" values
//!
//! Bank exports and ledgers fill empty counterparty fields with strings like
//! `"(unknown)"` or `"Sin nombre"`. These must never be searched for or
//! matched against, so every stage of the matcher checks them here first.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonical forms that carry no identifying information
const PLACEHOLDERS: &[&str] = &["", "no name", "sin nombre", "unknown", "desconocido"];

/// Characters stripped before comparing against [`PLACEHOLDERS`]
const WRAPPING_CHARS: &[char] = &[
    '(', ')', '[', ']', '{', '}', '<', '>', '"', '\'', '`', '«', '»', '“', '”', '‘', '’',
];

/// Returns true when `text` is empty or one of the known placeholder values.
///
/// Comparison ignores case, diacritics, surrounding brackets/quotes and
/// repeated whitespace, so `"  Sin Nombre  "` and `"(UNKNOWN)"` both count.
pub fn is_placeholder(text: &str) -> bool {
    let folded: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| !WRAPPING_CHARS.contains(c))
        .collect::<String>()
        .to_lowercase();

    let collapsed = folded.split_whitespace().collect::<Vec<_>>().join(" ");
    PLACEHOLDERS.contains(&collapsed.as_str())
}

/// Convenience for optional fields: `None` is a placeholder too
pub fn is_placeholder_opt(text: Option<&str>) -> bool {
    text.map(is_placeholder).unwrap_or(true)
}
