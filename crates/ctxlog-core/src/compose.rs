//! Human-readable digests over stored records.
//!
//! Everything here is presentation: the composer receives records that were
//! already selected and ordered, and never touches a store.

use crate::record::{StoredRecord, StoreKind};
use crate::search::SearchHit;
use crate::text::tokens;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::fmt;
use std::path::PathBuf;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

const DEBUGGING_KEYWORDS: &[&str] = &["error", "bug", "debug", "fix", "problem", "crash", "fail"];
const BUILDING_KEYWORDS: &[&str] = &["build", "compile", "deploy", "configur", "release"];
const FEATURE_KEYWORDS: &[&str] = &["feature", "implement", "add", "new"];

/// Coarse classification of a task description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFocus {
    Debugging,
    Building,
    FeatureDevelopment,
    General,
}

impl TaskFocus {
    /// Classify by keyword prefix; the first matching focus wins.
    pub fn classify(task: &str) -> Self {
        let words: Vec<String> = tokens(task).collect();
        let hits = |keywords: &[&str]| {
            words
                .iter()
                .any(|word| keywords.iter().any(|keyword| word.starts_with(keyword)))
        };
        if hits(DEBUGGING_KEYWORDS) {
            TaskFocus::Debugging
        } else if hits(BUILDING_KEYWORDS) {
            TaskFocus::Building
        } else if hits(FEATURE_KEYWORDS) {
            TaskFocus::FeatureDevelopment
        } else {
            TaskFocus::General
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskFocus::Debugging => "DEBUGGING",
            TaskFocus::Building => "BUILDING",
            TaskFocus::FeatureDevelopment => "FEATURE_DEVELOPMENT",
            TaskFocus::General => "GENERAL",
        }
    }
}

impl fmt::Display for TaskFocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Aggregate counts across the four stores.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextStats {
    pub sessions: usize,
    pub events: usize,
    pub summaries: usize,
    pub decisions: usize,
    /// Key phrases across session records.
    pub session_phrases: usize,
    /// Words across session records.
    pub session_words: usize,
    pub storage_root: PathBuf,
    pub capacity: usize,
}

impl ContextStats {
    pub fn total_records(&self) -> usize {
        self.sessions + self.events + self.summaries + self.decisions
    }

    pub fn average_words(&self) -> f64 {
        if self.sessions == 0 {
            0.0
        } else {
            self.session_words as f64 / self.sessions as f64
        }
    }
}

impl fmt::Display for ContextStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== CONTEXT STATISTICS ===")?;
        writeln!(f, "Session summaries: {}", self.sessions)?;
        writeln!(f, "Total key phrases extracted: {}", self.session_phrases)?;
        writeln!(f, "Significant events: {}", self.events)?;
        writeln!(f, "Hierarchical summaries: {}", self.summaries)?;
        writeln!(f, "Decision records: {}", self.decisions)?;
        writeln!(f, "Total words in summaries: {}", self.session_words)?;
        writeln!(f, "Average words per summary: {:.1}", self.average_words())?;
        writeln!(f, "Storage location: {}", self.storage_root.display())?;
        write!(
            f,
            "Storage method: Local JSON files ({} records per store)",
            self.capacity
        )
    }
}

/// Renders records into digest text.
#[derive(Debug, Clone, Copy)]
pub struct Composer {
    preview_words: usize,
}

impl Composer {
    pub fn new(preview_words: usize) -> Self {
        Self { preview_words }
    }

    /// Digest of the latest sessions and events, newest first.
    pub fn recent_digest(&self, mut records: Vec<StoredRecord>) -> String {
        records.sort_by_key(|record| {
            let stamp = record.stamp();
            (Reverse(stamp.timestamp), Reverse(stamp.seq), record.kind())
        });
        let mut out = String::from("=== SESSION CONTEXT ===\n");
        if records.is_empty() {
            out.push_str("\nNo sessions or events recorded yet.\n");
        }
        for (idx, record) in records.iter().enumerate() {
            out.push('\n');
            self.render_entry(&mut out, idx + 1, record, None);
        }
        out.push_str("\n=== END CONTEXT ===");
        out
    }

    /// Digest of search hits relevant to a task.
    pub fn relevant_digest(&self, focus: TaskFocus, hits: &[SearchHit]) -> String {
        if hits.is_empty() {
            return "No relevant context found".to_string();
        }
        let mut out = format!("=== RELEVANT CONTEXT ({focus}) ===\n");
        for (idx, hit) in hits.iter().enumerate() {
            out.push('\n');
            self.render_entry(&mut out, idx + 1, &hit.record, Some(hit.score));
        }
        out.truncate(out.trim_end().len());
        out
    }

    pub fn search_results(&self, query: &str, hits: &[SearchHit]) -> String {
        if hits.is_empty() {
            return format!("No context found matching '{query}'");
        }
        let mut out = format!("=== SEARCH RESULTS for '{query}' ===\n");
        for (idx, hit) in hits.iter().enumerate() {
            out.push('\n');
            self.render_entry(&mut out, idx + 1, &hit.record, Some(hit.score));
        }
        out.truncate(out.trim_end().len());
        out
    }

    fn render_entry(&self, out: &mut String, index: usize, record: &StoredRecord, score: Option<u32>) {
        let stamp = record.stamp();
        out.push_str(&format!(
            "{index}. [{}] ({})",
            format_timestamp(stamp.timestamp),
            record.kind().record_label()
        ));
        if let Some(score) = score {
            out.push_str(&format!(" [relevance: {score}]"));
        }
        out.push_str(&format!("\n   {}\n", self.headline(record)));
        if !record.tags().is_empty() {
            let tags: Vec<&str> = record.tags().iter().map(String::as_str).collect();
            out.push_str(&format!("   Tags: {}\n", tags.join(", ")));
        }
        let phrases = record.phrase_count();
        if phrases > 0 && record.kind() != StoreKind::Decisions {
            out.push_str(&format!("   Key insights: {phrases} items\n"));
        }
    }

    fn headline(&self, record: &StoredRecord) -> String {
        match record {
            StoredRecord::Event(event) => format!(
                "{} ({}): {}",
                event.event_type,
                event.project,
                preview(&event.text, self.preview_words)
            ),
            StoredRecord::Decision(decision) => {
                let phrases: Vec<String> = decision.phrases.iter().map(ToString::to_string).collect();
                preview(&phrases.join("; "), self.preview_words)
            }
            other => preview(other.text(), self.preview_words),
        }
    }
}

/// First `max_words` words on one line, with `...` when cut.
pub fn preview(text: &str, max_words: usize) -> String {
    let mut words = text.split_whitespace();
    let kept: Vec<&str> = words.by_ref().take(max_words).collect();
    let mut line = kept.join(" ");
    if words.next().is_some() {
        line.push_str("...");
    }
    line
}

pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}
