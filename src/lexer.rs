//! Splitting a command string into argument words.

/// Split a command string into whitespace-delimited words.
///
/// Runs of spaces or tabs produce no empty words. Each word passes through
/// the crate's single quoting rule, see [`strip_quotes`]; a word that ends up
/// empty after stripping (a bare `""`) is dropped as well, so the returned
/// vector only ever contains non-empty strings.
pub fn split_words(input: &str) -> Vec<String> {
    input
        .split_whitespace()
        .map(strip_quotes)
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

/// The crate's only quoting rule: a word whose first and last characters are
/// both `"` has exactly that surrounding pair removed. Applied uniformly to
/// every word of every command; there is no other quote or escape handling,
/// and quotes do not join words across whitespace.
pub fn strip_quotes(word: &str) -> &str {
    let bytes = word.as_bytes();
    if bytes.len() >= 2 && bytes[0] == b'"' && bytes[bytes.len() - 1] == b'"' {
        &word[1..word.len() - 1]
    } else {
        word
    }
}
