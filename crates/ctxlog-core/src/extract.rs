//! Marker-based phrase extraction.
//!
//! Extraction is driven by a declarative table of (category, markers) pairs.
//! Each marker hit yields the marker plus the text that follows it, up to the
//! next sentence boundary or a fixed word window, whichever comes first.

use crate::error::ContextError;
use crate::record::{ExtractedPhrase, PhraseCategory};
use ctxlog_config::ExtractionConfig;
use regex::Regex;

/// Markers for a single phrase category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSet {
    pub category: PhraseCategory,
    pub markers: Vec<String>,
}

/// Declarative marker table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerTable {
    pub sets: Vec<MarkerSet>,
    /// Words kept after a marker when no sentence boundary comes first.
    pub trailing_words: usize,
}

impl MarkerTable {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let sets = [
            (PhraseCategory::Decision, &config.decision_markers),
            (PhraseCategory::Problem, &config.problem_markers),
            (PhraseCategory::Solution, &config.solution_markers),
        ]
        .into_iter()
        .map(|(category, markers)| MarkerSet {
            category,
            markers: markers.clone(),
        })
        .collect();
        Self {
            sets,
            trailing_words: config.trailing_words,
        }
    }
}

impl Default for MarkerTable {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

/// Compiled form of a `MarkerTable`. Holds no state between calls.
#[derive(Debug, Clone)]
pub struct PhraseExtractor {
    patterns: Vec<(PhraseCategory, Regex)>,
    trailing_words: usize,
}

impl PhraseExtractor {
    /// Compile the table into one case-insensitive pattern per category.
    pub fn new(table: &MarkerTable) -> Result<Self, ContextError> {
        let mut patterns = Vec::new();
        for set in &table.sets {
            let alternatives: Vec<String> = set
                .markers
                .iter()
                .map(|marker| marker.trim())
                .filter(|marker| !marker.is_empty())
                .map(marker_pattern)
                .collect();
            if alternatives.is_empty() {
                continue;
            }
            let pattern = format!("(?i)(?:{})", alternatives.join("|"));
            let regex = Regex::new(&pattern).map_err(|err| ContextError::Pattern(err.to_string()))?;
            patterns.push((set.category, regex));
        }
        Ok(Self {
            patterns,
            trailing_words: table.trailing_words,
        })
    }

    /// Extract tagged phrases in order of first occurrence.
    pub fn extract(&self, text: &str) -> Vec<ExtractedPhrase> {
        let mut hits: Vec<(usize, PhraseCategory, String)> = Vec::new();
        for (category, regex) in &self.patterns {
            for found in regex.find_iter(text) {
                let tail = &text[found.end()..];
                let end = found.end() + phrase_end(tail, self.trailing_words);
                let phrase = text[found.start()..end]
                    .trim_end_matches(|c: char| c.is_whitespace() || c == ',')
                    .to_string();
                hits.push((found.start(), *category, phrase));
            }
        }
        hits.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        hits.into_iter()
            .map(|(_, category, phrase)| ExtractedPhrase { category, phrase })
            .collect()
    }
}

/// Escape a marker and anchor its alphanumeric edges on word boundaries.
fn marker_pattern(marker: &str) -> String {
    let starts_word = marker.chars().next().is_some_and(char::is_alphanumeric);
    let ends_word = marker.chars().last().is_some_and(char::is_alphanumeric);
    format!(
        "{}{}{}",
        if starts_word { r"\b" } else { "" },
        regex::escape(marker),
        if ends_word { r"\b" } else { "" }
    )
}

/// Byte offset in `tail` where the phrase stops: a sentence boundary or the
/// start of the word past the window.
fn phrase_end(tail: &str, max_words: usize) -> usize {
    let mut words = 0;
    let mut in_word = false;
    let mut chars = tail.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\n' | ';' => return idx,
            '.' | '!' | '?' => {
                // "v1.2" and "e.g" keep going; a terminator needs whitespace or end of text.
                if chars.peek().is_none_or(|(_, next)| next.is_whitespace()) {
                    return idx;
                }
            }
            _ => {}
        }
        if ch.is_whitespace() {
            in_word = false;
        } else if !in_word {
            in_word = true;
            words += 1;
            if words > max_words {
                return idx;
            }
        }
    }
    tail.len()
}

#[cfg(test)]
mod tests {
    use super::{MarkerSet, MarkerTable, PhraseExtractor};
    use crate::record::{ExtractedPhrase, PhraseCategory};
    use pretty_assertions::assert_eq;

    fn extractor() -> PhraseExtractor {
        PhraseExtractor::new(&MarkerTable::default()).expect("extractor")
    }

    fn phrase(category: PhraseCategory, phrase: &str) -> ExtractedPhrase {
        ExtractedPhrase {
            category,
            phrase: phrase.to_string(),
        }
    }

    #[test]
    fn decision_phrase_runs_to_sentence_end() {
        let phrases = extractor().extract("We decided to use Postgres for storage. Then lunch.");
        assert_eq!(
            phrases,
            vec![phrase(
                PhraseCategory::Decision,
                "decided to use Postgres for storage"
            )]
        );
    }

    #[test]
    fn no_markers_yields_nothing() {
        assert!(extractor().extract("Refactored the parser module.").is_empty());
        assert!(extractor().extract("").is_empty());
    }

    #[test]
    fn matches_are_case_insensitive_and_ordered() {
        let phrases =
            extractor().extract("ERROR: disk full; Fixed by cleaning tmp\nworking now for real");
        assert_eq!(
            phrases,
            vec![
                phrase(PhraseCategory::Problem, "ERROR: disk full"),
                phrase(PhraseCategory::Solution, "Fixed by cleaning tmp"),
                phrase(PhraseCategory::Solution, "working now for real"),
            ]
        );
    }

    #[test]
    fn repeated_category_matches_are_all_kept() {
        let phrases = extractor().extract("Bug: flaky test. Later, bug: race in cache.");
        assert_eq!(
            phrases,
            vec![
                phrase(PhraseCategory::Problem, "Bug: flaky test"),
                phrase(PhraseCategory::Problem, "bug: race in cache"),
            ]
        );
    }

    #[test]
    fn trailing_span_is_capped_by_word_window() {
        let phrases = extractor().extract("going to a b c d e f g h i j k l m n o p");
        assert_eq!(
            phrases,
            vec![phrase(PhraseCategory::Decision, "going to a b c d e f g h i j k l")]
        );
    }

    #[test]
    fn markers_respect_word_boundaries() {
        assert!(
            extractor()
                .extract("an ongoing toil, going towards it")
                .is_empty()
        );
    }

    #[test]
    fn inner_dots_do_not_end_phrase() {
        let phrases = extractor().extract("chose to pin serde v1.0.226 for now. Done");
        assert_eq!(
            phrases,
            vec![phrase(
                PhraseCategory::Decision,
                "chose to pin serde v1.0.226 for now"
            )]
        );
    }

    #[test]
    fn custom_table_is_honoured() {
        let table = MarkerTable {
            sets: vec![MarkerSet {
                category: PhraseCategory::Solution,
                markers: vec!["workaround:".to_string(), "  ".to_string()],
            }],
            trailing_words: 2,
        };
        let extractor = PhraseExtractor::new(&table).expect("extractor");
        assert_eq!(
            extractor.extract("Workaround: pin the old version"),
            vec![phrase(PhraseCategory::Solution, "Workaround: pin the")]
        );
        assert!(extractor.extract("decided to stop").is_empty());
    }
}
