//! Surface-level pronunciation heuristics for Spanish words.
//!
//! Syllables are estimated from vowel runs and difficulty is a count of
//! complexity features. Neither is a linguistic analysis; both only need to
//! be stable enough to sort generator output into tiers.

use std::collections::HashSet;

use unicode_normalization::UnicodeNormalization;

lazy_static::lazy_static! {
    /// Vowel nuclei, including accented vowels and ü.
    static ref VOWELS: HashSet<char> = {
        "aeiouáéíóúü".chars().collect()
    };

    /// Vowels carrying a written accent (ü is not counted).
    static ref ACCENTED_VOWELS: HashSet<char> = {
        "áéíóú".chars().collect()
    };

    /// Onset clusters of stop/fricative + liquid.
    static ref CONSONANT_CLUSTERS: HashSet<(char, char)> = {
        ["bl", "br", "cl", "cr", "dr", "fl", "fr", "gl", "gr", "pl", "pr", "tr"]
            .iter()
            .map(|c| {
                let mut it = c.chars();
                (it.next().unwrap_or_default(), it.next().unwrap_or_default())
            })
            .collect()
    };
}

/// Upper bound of [`difficulty_score`].
pub const MAX_SCORE: u32 = 7;

/// Measurements used by the tier classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordFeatures {
    /// Length in characters
    pub length: usize,
    pub syllables: usize,
    pub score: u32,
    pub has_accent: bool,
}

/// Measure a word. Surrounding whitespace is ignored.
pub fn analyze(word: &str) -> WordFeatures {
    let chars = lower_chars(word.trim());
    WordFeatures {
        length: chars.len(),
        syllables: count_syllables(&chars),
        score: score_chars(&chars),
        has_accent: chars.iter().any(|c| ACCENTED_VOWELS.contains(c)),
    }
}

/// Estimate the number of syllables in a word (never less than 1).
pub fn syllable_count(word: &str) -> usize {
    count_syllables(&lower_chars(word))
}

/// Composite pronunciation difficulty in `0..=MAX_SCORE`.
///
/// One point each for: length >= 7, three or more syllables, a consonant
/// cluster, a digraph (rr, ll, ch, qu, gu before e/i), an accented vowel,
/// ñ, and x or z.
pub fn difficulty_score(word: &str) -> u32 {
    score_chars(&lower_chars(word))
}

/// Composed (NFC) lower-case characters, so `e` + U+0301 counts as `é`.
fn lower_chars(word: &str) -> Vec<char> {
    word.nfc().collect::<String>().to_lowercase().chars().collect()
}

/// `gu` directly followed by `e` or `i` (guerra, guitarra).
fn is_soft_gu(chars: &[char], i: usize) -> bool {
    chars[i] == 'g'
        && chars.get(i + 1) == Some(&'u')
        && matches!(chars.get(i + 2), Some('e') | Some('i'))
}

fn count_syllables(chars: &[char]) -> usize {
    // qu and gu+e/i collapse to a consonant placeholder so the silent u
    // does not open a nucleus.
    let mut collapsed = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        if (chars[i] == 'q' && chars.get(i + 1) == Some(&'u')) || is_soft_gu(chars, i) {
            collapsed.push('q');
            i += 2;
            continue;
        }
        collapsed.push(chars[i]);
        i += 1;
    }

    let mut runs = 0;
    let mut in_run = false;
    for c in &collapsed {
        let vowel = VOWELS.contains(c);
        if vowel && !in_run {
            runs += 1;
        }
        in_run = vowel;
    }
    runs.max(1)
}

fn has_cluster(chars: &[char]) -> bool {
    chars
        .windows(2)
        .any(|w| CONSONANT_CLUSTERS.contains(&(w[0], w[1])))
}

fn has_digraph(chars: &[char]) -> bool {
    chars.windows(2).enumerate().any(|(i, w)| {
        matches!((w[0], w[1]), ('r', 'r') | ('l', 'l') | ('c', 'h') | ('q', 'u'))
            || is_soft_gu(chars, i)
    })
}

fn score_chars(chars: &[char]) -> u32 {
    let features = [
        chars.len() >= 7,
        count_syllables(chars) >= 3,
        has_cluster(chars),
        has_digraph(chars),
        chars.iter().any(|c| ACCENTED_VOWELS.contains(c)),
        chars.contains(&'ñ'),
        chars.iter().any(|&c| c == 'x' || c == 'z'),
    ];
    features.iter().filter(|&&f| f).count() as u32
}
