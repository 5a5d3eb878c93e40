//! Turn free-text generator output into a candidate list.

/// Strip a leading enumeration like `1.`, `2)`, `3 -` or `10 `.
///
/// Digits must be followed by at least one of `)`, `.`, `-` or whitespace,
/// so a word that merely starts with a digit is left alone.
fn strip_numbering(line: &str) -> &str {
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return line;
    }
    let rest = &line[digits..];
    let after = rest.trim_start_matches(|c: char| matches!(c, ')' | '.' | '-') || c.is_whitespace());
    if after.len() == rest.len() {
        line
    } else {
        after
    }
}

/// Strip a leading bullet (`-`, `•`, `*`).
fn strip_bullet(line: &str) -> &str {
    match line.strip_prefix(['-', '•', '*']) {
        Some(rest) => rest.trim_start(),
        None => line,
    }
}

/// Strip quotes and sentence punctuation from the edges of a word.
fn strip_punct(word: &str) -> &str {
    word.trim_matches(|c: char| ".,;:!?¡¿\"'«»“”".contains(c))
}

/// Parse generator text, one candidate per line.
///
/// Handles `\n` and `\r\n` line endings and drops empty lines. Candidate
/// order is preserved.
pub fn parse_candidates(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| strip_numbering(line.trim()).trim())
        .map(|line| strip_punct(strip_bullet(line)).trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
