//! Word-level text helpers shared by submission, search and rendering.

use std::collections::HashSet;

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Keep the first `max_words` words, appending `...` when words were dropped.
///
/// Text within the budget is returned unchanged (including its whitespace).
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let mut words = text.split_whitespace();
    let kept: Vec<&str> = words.by_ref().take(max_words).collect();
    if words.next().is_none() {
        return text.to_string();
    }
    format!("{}...", kept.join(" "))
}

/// Lowercase search tokens: runs of alphanumerics and underscores.
pub fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

/// Distinct tokens, in first-seen order.
pub fn distinct_tokens(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens(text)
        .filter(|token| seen.insert(token.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{distinct_tokens, truncate_words, word_count};
    use pretty_assertions::assert_eq;

    #[test]
    fn truncate_words_handles_limits() {
        assert_eq!(truncate_words("one two three", 3), "one two three");
        assert_eq!(truncate_words("one  two\nthree four", 2), "one two...");
        assert_eq!(truncate_words("", 2), "");
        assert_eq!(word_count("one two..."), 2);
    }

    #[test]
    fn tokens_split_on_punctuation_and_keep_underscores() {
        assert_eq!(
            distinct_tokens("Fixed the DB: error_solved, db again!"),
            vec!["fixed", "the", "db", "error_solved", "again"]
        );
    }
}
