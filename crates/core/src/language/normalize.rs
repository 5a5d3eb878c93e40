//! Canonical keys for duplicate detection.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Reduce a word to its deduplication key.
///
/// Decomposes to NFD and drops combining marks, lower-cases, then collapses
/// whitespace runs to a single space and trims the ends. Whitespace-only
/// input yields an empty key.
pub fn normalize(word: &str) -> String {
    let stripped: String = word
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
