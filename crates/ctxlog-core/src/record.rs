//! Record types persisted by the four context stores.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Identifies one of the independent record stores.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Sessions,
    Events,
    Summaries,
    Decisions,
}

impl StoreKind {
    /// All stores in search tie-break order.
    pub const ALL: [StoreKind; 4] = [
        StoreKind::Sessions,
        StoreKind::Events,
        StoreKind::Summaries,
        StoreKind::Decisions,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StoreKind::Sessions => "sessions",
            StoreKind::Events => "events",
            StoreKind::Summaries => "summaries",
            StoreKind::Decisions => "decisions",
        }
    }

    /// Singular label used when rendering a record of this kind.
    pub fn record_label(self) -> &'static str {
        match self {
            StoreKind::Sessions => "session",
            StoreKind::Events => "event",
            StoreKind::Summaries => "summary",
            StoreKind::Decisions => "decision",
        }
    }

    /// Backing document name under the storage root.
    pub fn file_name(self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of an extracted phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhraseCategory {
    Decision,
    Problem,
    Solution,
}

impl PhraseCategory {
    /// Tag name added to records carrying a phrase of this category.
    pub fn as_str(self) -> &'static str {
        match self {
            PhraseCategory::Decision => "decision",
            PhraseCategory::Problem => "problem",
            PhraseCategory::Solution => "solution",
        }
    }
}

impl fmt::Display for PhraseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// A marker-anchored phrase found in caller text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedPhrase {
    pub category: PhraseCategory,
    pub phrase: String,
}

impl fmt::Display for ExtractedPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.phrase)
    }
}

/// Insertion identity assigned by a store. Never changes after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    /// Per-store insertion sequence; later inserts have higher values.
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
}

/// Behaviour shared by every record kind a `BoundedStore` can hold.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: StoreKind;

    fn stamp(&self) -> Stamp;

    /// Free text used for search and previews.
    fn text(&self) -> &str;

    fn tags(&self) -> &BTreeSet<String>;

    fn into_stored(self) -> StoredRecord;
}

/// A caller-submitted session summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(flatten)]
    pub stamp: Stamp,
    /// Summary text after word truncation.
    pub text: String,
    /// Original text, kept only when truncation dropped words.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub extracted_phrases: Vec<ExtractedPhrase>,
    /// Words in `text`.
    pub word_count: usize,
}

/// A significant development event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(flatten)]
    pub stamp: Stamp,
    /// Free-form event type, normalized to lowercase.
    pub event_type: String,
    pub project: String,
    /// Event details.
    pub text: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub extracted_phrases: Vec<ExtractedPhrase>,
}

/// Hierarchical summary holding several detail levels of the same content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    #[serde(flatten)]
    pub stamp: Stamp,
    /// Level 1: a short brief.
    pub brief: String,
    /// Level 2: a longer excerpt.
    pub detailed: String,
    /// Words in the submitted content.
    pub source_word_count: usize,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub extracted_phrases: Vec<ExtractedPhrase>,
}

/// Key phrases lifted out of a hierarchical summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    #[serde(flatten)]
    pub stamp: Stamp,
    /// Sequence number of the summary record these phrases came from.
    pub source_seq: u64,
    pub source_timestamp: DateTime<Utc>,
    pub phrases: Vec<ExtractedPhrase>,
    /// Phrases rendered one per line as `CATEGORY: phrase`.
    pub text: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl Record for SessionRecord {
    const KIND: StoreKind = StoreKind::Sessions;

    fn stamp(&self) -> Stamp {
        self.stamp
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    fn into_stored(self) -> StoredRecord {
        StoredRecord::Session(self)
    }
}

impl Record for EventRecord {
    const KIND: StoreKind = StoreKind::Events;

    fn stamp(&self) -> Stamp {
        self.stamp
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    fn into_stored(self) -> StoredRecord {
        StoredRecord::Event(self)
    }
}

impl Record for SummaryRecord {
    const KIND: StoreKind = StoreKind::Summaries;

    fn stamp(&self) -> Stamp {
        self.stamp
    }

    fn text(&self) -> &str {
        &self.brief
    }

    fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    fn into_stored(self) -> StoredRecord {
        StoredRecord::Summary(self)
    }
}

impl Record for DecisionRecord {
    const KIND: StoreKind = StoreKind::Decisions;

    fn stamp(&self) -> Stamp {
        self.stamp
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    fn into_stored(self) -> StoredRecord {
        StoredRecord::Decision(self)
    }
}

/// A record from any store, used where results cross store boundaries.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredRecord {
    Session(SessionRecord),
    Event(EventRecord),
    Summary(SummaryRecord),
    Decision(DecisionRecord),
}

impl StoredRecord {
    pub fn kind(&self) -> StoreKind {
        match self {
            StoredRecord::Session(_) => StoreKind::Sessions,
            StoredRecord::Event(_) => StoreKind::Events,
            StoredRecord::Summary(_) => StoreKind::Summaries,
            StoredRecord::Decision(_) => StoreKind::Decisions,
        }
    }

    pub fn stamp(&self) -> Stamp {
        match self {
            StoredRecord::Session(record) => record.stamp,
            StoredRecord::Event(record) => record.stamp,
            StoredRecord::Summary(record) => record.stamp,
            StoredRecord::Decision(record) => record.stamp,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            StoredRecord::Session(record) => record.text(),
            StoredRecord::Event(record) => record.text(),
            StoredRecord::Summary(record) => record.text(),
            StoredRecord::Decision(record) => record.text(),
        }
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        match self {
            StoredRecord::Session(record) => record.tags(),
            StoredRecord::Event(record) => record.tags(),
            StoredRecord::Summary(record) => record.tags(),
            StoredRecord::Decision(record) => record.tags(),
        }
    }

    pub fn phrase_count(&self) -> usize {
        match self {
            StoredRecord::Session(record) => record.extracted_phrases.len(),
            StoredRecord::Event(record) => record.extracted_phrases.len(),
            StoredRecord::Summary(record) => record.extracted_phrases.len(),
            StoredRecord::Decision(record) => record.phrases.len(),
        }
    }
}

/// Merge caller tags with the categories of extracted phrases.
pub(crate) fn tag_set<I, S>(caller_tags: I, phrases: &[ExtractedPhrase]) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tags: BTreeSet<String> = caller_tags
        .into_iter()
        .map(|tag| tag.as_ref().trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect();
    tags.extend(
        phrases
            .iter()
            .map(|phrase| phrase.category.as_str().to_string()),
    );
    tags
}
