//! Configuration schema for ctxlog.

use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default number of records each store keeps before evicting the oldest.
pub const DEFAULT_CAPACITY: usize = 50;

/// Directory under the user's home that holds ctxlog state and config.
pub const DEFAULT_HOME_DIR: &str = ".ctxlog";

/// Directory name for the persisted store documents.
pub const DEFAULT_STORAGE_DIR: &str = "context_storage";

/// Event types ctxlog documents as significant. The list is advisory: callers
/// may record any event type.
pub const RECOGNIZED_EVENT_TYPES: &[&str] = &[
    "error_solved",
    "build_configuration_changed",
    "new_feature_implemented",
    "deployment_completed",
    "preference_learned",
    "project_setup",
    "debugging_session",
    "optimization_applied",
];

/// Root config for the context engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ContextConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub summaries: SummaryConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub digest: DigestConfig,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub input: InputConfig,
}

impl ContextConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> ContextConfigBuilder {
        ContextConfigBuilder::new()
    }

    /// Storage root from config, or the per-user default location.
    pub fn storage_root(&self) -> PathBuf {
        match self.storage.root.as_deref() {
            Some(root) => PathBuf::from(root),
            None => default_storage_root(),
        }
    }
}

/// Builder for assembling a `ContextConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct ContextConfigBuilder {
    config: ContextConfig,
}

impl ContextConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: ContextConfig::default(),
        }
    }

    /// Replace the storage configuration.
    pub fn storage(mut self, storage: StorageConfig) -> Self {
        self.config.storage = storage;
        self
    }

    /// Replace the summary truncation configuration.
    pub fn summaries(mut self, summaries: SummaryConfig) -> Self {
        self.config.summaries = summaries;
        self
    }

    /// Replace the phrase extraction configuration.
    pub fn extraction(mut self, extraction: ExtractionConfig) -> Self {
        self.config.extraction = extraction;
        self
    }

    /// Replace the search configuration.
    pub fn search(mut self, search: SearchConfig) -> Self {
        self.config.search = search;
        self
    }

    /// Replace the digest configuration.
    pub fn digest(mut self, digest: DigestConfig) -> Self {
        self.config.digest = digest;
        self
    }

    /// Replace the event configuration.
    pub fn events(mut self, events: EventsConfig) -> Self {
        self.config.events = events;
        self
    }

    /// Replace the input limits.
    pub fn input(mut self, input: InputConfig) -> Self {
        self.config.input = input;
        self
    }

    /// Finalize and return the built `ContextConfig`.
    pub fn build(self) -> ContextConfig {
        self.config
    }
}

/// Where and how much history is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Storage directory; defaults to `~/.ctxlog/context_storage`.
    #[serde(default)]
    pub root: Option<String>,
    /// Maximum records per store.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: None,
            capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

/// Word budgets for session summaries and hierarchical summary levels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryConfig {
    /// Word cap applied when the caller gives no `max_words`.
    #[serde(default = "default_max_words")]
    pub default_max_words: usize,
    /// Word cap for the brief summary level.
    #[serde(default = "default_brief_words")]
    pub brief_words: usize,
    /// Word cap for the detailed summary level.
    #[serde(default = "default_detailed_words")]
    pub detailed_words: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            default_max_words: default_max_words(),
            brief_words: default_brief_words(),
            detailed_words: default_detailed_words(),
        }
    }
}

fn default_max_words() -> usize {
    100
}

fn default_brief_words() -> usize {
    50
}

fn default_detailed_words() -> usize {
    200
}

/// Marker table driving phrase extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionConfig {
    /// Words kept after a marker when no sentence boundary comes first.
    #[serde(default = "default_trailing_words")]
    pub trailing_words: usize,
    #[serde(default = "default_decision_markers")]
    pub decision_markers: Vec<String>,
    #[serde(default = "default_problem_markers")]
    pub problem_markers: Vec<String>,
    #[serde(default = "default_solution_markers")]
    pub solution_markers: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            trailing_words: default_trailing_words(),
            decision_markers: default_decision_markers(),
            problem_markers: default_problem_markers(),
            solution_markers: default_solution_markers(),
        }
    }
}

fn default_trailing_words() -> usize {
    12
}

fn default_decision_markers() -> Vec<String> {
    to_strings(&["decided to", "chose to", "will use", "going to"])
}

fn default_problem_markers() -> Vec<String> {
    to_strings(&["error:", "issue:", "problem:", "bug:", "failed to"])
}

fn default_solution_markers() -> Vec<String> {
    to_strings(&["solved by", "fixed by", "resolved by", "working now"])
}

/// Ranking knobs for relevance search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchConfig {
    #[serde(default = "default_search_limit")]
    pub default_limit: usize,
    /// Score added when a query token matches a tag.
    #[serde(default = "default_tag_weight")]
    pub tag_weight: u32,
    /// Score added when a query token matches the record text.
    #[serde(default = "default_text_weight")]
    pub text_weight: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_search_limit(),
            tag_weight: default_tag_weight(),
            text_weight: default_text_weight(),
        }
    }
}

fn default_search_limit() -> usize {
    5
}

fn default_tag_weight() -> u32 {
    2
}

fn default_text_weight() -> u32 {
    1
}

/// Digest rendering options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DigestConfig {
    /// Number of hits shown in the relevant-to-task digest.
    #[serde(default = "default_relevant_limit")]
    pub relevant_limit: usize,
    /// Word cap for record previews in digests.
    #[serde(default = "default_preview_words")]
    pub preview_words: usize,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            relevant_limit: default_relevant_limit(),
            preview_words: default_preview_words(),
        }
    }
}

fn default_relevant_limit() -> usize {
    3
}

fn default_preview_words() -> usize {
    60
}

/// Event type catalogue and defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventsConfig {
    /// Documented event types; others are accepted but flagged.
    #[serde(default = "default_known_types")]
    pub known_types: Vec<String>,
    /// Project label used when the caller gives none.
    #[serde(default = "default_project")]
    pub default_project: String,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            known_types: default_known_types(),
            default_project: default_project(),
        }
    }
}

impl EventsConfig {
    /// Whether the event type is in the documented catalogue.
    pub fn is_recognized(&self, event_type: &str) -> bool {
        self.known_types.iter().any(|known| known == event_type)
    }
}

fn default_known_types() -> Vec<String> {
    to_strings(RECOGNIZED_EVENT_TYPES)
}

fn default_project() -> String {
    "project".to_string()
}

/// Limits applied to caller input before anything is stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputConfig {
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,
    #[serde(default = "default_max_tags")]
    pub max_tags: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            max_text_chars: default_max_text_chars(),
            max_tags: default_max_tags(),
        }
    }
}

fn default_max_text_chars() -> usize {
    20_000
}

fn default_max_tags() -> usize {
    16
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// Default storage root under the home directory, falling back to the cwd.
pub fn default_storage_root() -> PathBuf {
    let base = UserDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    base.join(DEFAULT_HOME_DIR).join(DEFAULT_STORAGE_DIR)
}

#[cfg(test)]
mod tests {
    use super::{ContextConfig, DEFAULT_CAPACITY, EventsConfig, StorageConfig};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn defaults_match_documented_values() {
        let config = ContextConfig::default();
        assert_eq!(config.storage.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.summaries.default_max_words, 100);
        assert_eq!(config.search.default_limit, 5);
        assert_eq!(config.search.tag_weight, 2);
        assert_eq!(config.digest.relevant_limit, 3);
        assert_eq!(config.extraction.decision_markers.len(), 4);
    }

    #[test]
    fn storage_root_prefers_configured_path() {
        let config = ContextConfig::builder()
            .storage(StorageConfig {
                root: Some("/tmp/ctxlog-test".to_string()),
                ..StorageConfig::default()
            })
            .build();
        assert_eq!(config.storage_root(), PathBuf::from("/tmp/ctxlog-test"));
    }

    #[test]
    fn event_catalogue_is_advisory() {
        let events = EventsConfig::default();
        assert!(events.is_recognized("error_solved"));
        assert!(!events.is_recognized("lunch_break"));
    }
}
