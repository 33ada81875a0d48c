//! The context engine: owns the stores and exposes every operation.

use crate::clock::{Clock, SystemClock};
use crate::compose::{Composer, ContextStats, TaskFocus};
use crate::error::ContextError;
use crate::extract::{MarkerTable, PhraseExtractor};
use crate::record::{
    DecisionRecord, EventRecord, ExtractedPhrase, Record, SessionRecord, StoreKind, StoredRecord,
    SummaryRecord, tag_set,
};
use crate::retention::{self, RetentionReport, RetentionTarget};
use crate::search::{self, Query, Scope, SearchHit, SearchWeights};
use crate::store::{BoundedStore, StoreWarning};
use crate::text::{truncate_words, word_count};
use ctxlog_config::ContextConfig;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Confirmation for a stored session summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReceipt {
    pub record: SessionRecord,
    /// Whether words were dropped to honour the word limit.
    pub truncated: bool,
    pub evicted: usize,
}

impl fmt::Display for SessionReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Session summary saved ({} words, {} key phrases)",
            self.record.word_count,
            self.record.extracted_phrases.len()
        )
    }
}

/// Confirmation for a recorded event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventReceipt {
    pub record: EventRecord,
    /// Whether the event type is on the recognized list.
    pub recognized: bool,
}

impl fmt::Display for EventReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Recorded {} event for {}",
            self.record.event_type, self.record.project
        )?;
        if !self.recognized {
            write!(
                f,
                " (note: '{}' is not a recognized event type)",
                self.record.event_type
            )?;
        }
        Ok(())
    }
}

/// Confirmation for a hierarchical summary.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelsReceipt {
    pub summary: SummaryRecord,
    /// Present when the text held at least one key phrase.
    pub decision: Option<DecisionRecord>,
}

impl fmt::Display for LevelsReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Context saved at multiple levels (summary + {} key phrases)",
            self.summary.extracted_phrases.len()
        )
    }
}

/// Local context log over four bounded stores.
pub struct ContextEngine {
    config: ContextConfig,
    root: PathBuf,
    clock: Arc<dyn Clock>,
    extractor: PhraseExtractor,
    composer: Composer,
    weights: SearchWeights,
    sessions: BoundedStore<SessionRecord>,
    events: BoundedStore<EventRecord>,
    summaries: BoundedStore<SummaryRecord>,
    decisions: BoundedStore<DecisionRecord>,
    warnings: Mutex<Vec<StoreWarning>>,
}

impl fmt::Debug for ContextEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextEngine")
            .field("root", &self.root)
            .field("capacity", &self.config.storage.capacity)
            .finish_non_exhaustive()
    }
}

impl ContextEngine {
    /// Open (or create) a context log under `root` using wall-clock time.
    pub fn open(root: impl AsRef<Path>, config: ContextConfig) -> Result<Self, ContextError> {
        Self::with_clock(root, config, Arc::new(SystemClock))
    }

    /// Open a context log with an explicit time source.
    pub fn with_clock(
        root: impl AsRef<Path>,
        config: ContextConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ContextError> {
        config
            .validate()
            .map_err(|err| ContextError::validation(err.to_string()))?;
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        let extractor = PhraseExtractor::new(&MarkerTable::from_config(&config.extraction))?;
        let capacity = config.storage.capacity;
        let now = clock.now();
        let mut warnings = Vec::new();
        let (sessions, warning) = BoundedStore::<SessionRecord>::open(&root, capacity, now)?;
        warnings.extend(warning);
        let (events, warning) = BoundedStore::<EventRecord>::open(&root, capacity, now)?;
        warnings.extend(warning);
        let (summaries, warning) = BoundedStore::<SummaryRecord>::open(&root, capacity, now)?;
        warnings.extend(warning);
        let (decisions, warning) = BoundedStore::<DecisionRecord>::open(&root, capacity, now)?;
        warnings.extend(warning);

        info!(
            "context engine ready (root={}, capacity={capacity}, warnings={})",
            root.display(),
            warnings.len()
        );
        Ok(Self {
            composer: Composer::new(config.digest.preview_words),
            weights: SearchWeights::from(&config.search),
            config,
            root,
            clock,
            extractor,
            sessions,
            events,
            summaries,
            decisions,
            warnings: Mutex::new(warnings),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn sessions(&self) -> &BoundedStore<SessionRecord> {
        &self.sessions
    }

    pub fn events(&self) -> &BoundedStore<EventRecord> {
        &self.events
    }

    pub fn summaries(&self) -> &BoundedStore<SummaryRecord> {
        &self.summaries
    }

    pub fn decisions(&self) -> &BoundedStore<DecisionRecord> {
        &self.decisions
    }

    /// Drain storage warnings not yet shown to a caller.
    pub fn take_warnings(&self) -> Vec<StoreWarning> {
        std::mem::take(&mut *self.warnings.lock())
    }

    /// Extract key phrases without storing anything.
    pub fn extract(&self, text: &str) -> Vec<ExtractedPhrase> {
        self.extractor.extract(text)
    }

    /// Store a session summary, truncated to `max_words` (or the configured
    /// default). Phrases are extracted from the full text.
    pub fn submit_session_summary(
        &self,
        text: &str,
        tags: &[String],
        max_words: Option<usize>,
    ) -> Result<SessionReceipt, ContextError> {
        let text = self.checked_text("summary text", text)?;
        self.check_tags(tags)?;
        let max_words = max_words.unwrap_or(self.config.summaries.default_max_words);
        if max_words == 0 {
            return Err(ContextError::validation("max_words must be at least 1"));
        }

        let phrases = self.extractor.extract(text);
        let truncated = word_count(text) > max_words;
        let stored_text = truncate_words(text, max_words);
        let tags = tag_set(tags, &phrases);
        let outcome = self.sessions.append_with(self.clock.now(), |stamp| SessionRecord {
            stamp,
            word_count: word_count(&stored_text),
            text: stored_text,
            full_text: truncated.then(|| text.to_string()),
            tags,
            extracted_phrases: phrases,
        })?;
        debug!(
            "session summary stored (seq={}, truncated={truncated})",
            outcome.record.stamp.seq
        );
        Ok(SessionReceipt {
            record: outcome.record,
            truncated,
            evicted: outcome.evicted,
        })
    }

    /// Record a significant event. Unrecognized types are stored and flagged.
    pub fn record_event(
        &self,
        event_type: &str,
        details: &str,
        project: Option<&str>,
    ) -> Result<EventReceipt, ContextError> {
        let event_type = event_type.trim().to_lowercase();
        if event_type.is_empty() {
            return Err(ContextError::validation("event type must not be empty"));
        }
        let details = self.checked_text("event details", details)?;
        let project = project
            .map(str::trim)
            .filter(|project| !project.is_empty())
            .unwrap_or(self.config.events.default_project.as_str())
            .to_string();
        let recognized = self.config.events.is_recognized(&event_type);
        if !recognized {
            debug!("recording unrecognized event type '{event_type}'");
        }

        let phrases = self.extractor.extract(details);
        let tags = tag_set([event_type.as_str()], &phrases);
        let outcome = self.events.append_with(self.clock.now(), |stamp| EventRecord {
            stamp,
            event_type,
            project,
            text: details.to_string(),
            tags,
            extracted_phrases: phrases,
        })?;
        Ok(EventReceipt {
            record: outcome.record,
            recognized,
        })
    }

    /// Store a brief and a detailed level of `text`, plus a decision record
    /// when key phrases were found. A failed decision write restores the
    /// summaries store as it was, including any record the summary evicted.
    pub fn save_multi_level_summary(&self, text: &str) -> Result<LevelsReceipt, ContextError> {
        let text = self.checked_text("summary text", text)?;
        let levels = &self.config.summaries;
        let phrases = self.extractor.extract(text);
        let tags = tag_set(std::iter::empty::<&str>(), &phrases);

        let before = self.summaries.snapshot();
        let summary = self
            .summaries
            .append_with(self.clock.now(), |stamp| SummaryRecord {
                stamp,
                brief: truncate_words(text, levels.brief_words),
                detailed: truncate_words(text, levels.detailed_words),
                source_word_count: word_count(text),
                tags: tags.clone(),
                extracted_phrases: phrases.clone(),
            })?
            .record;
        if phrases.is_empty() {
            return Ok(LevelsReceipt {
                summary,
                decision: None,
            });
        }

        let rendered: Vec<String> = phrases.iter().map(ToString::to_string).collect();
        let appended = self.decisions.append_with(self.clock.now(), |stamp| DecisionRecord {
            stamp,
            source_seq: summary.stamp.seq,
            source_timestamp: summary.stamp.timestamp,
            phrases,
            text: rendered.join("\n"),
            tags,
        });
        match appended {
            Ok(outcome) => Ok(LevelsReceipt {
                summary,
                decision: Some(outcome.record),
            }),
            Err(err) => {
                warn!(
                    "decision write failed, restoring summaries without {} ({err})",
                    summary.stamp.seq
                );
                if let Err(undo) = self.summaries.replace_all(before) {
                    warn!("could not restore summaries: {undo}");
                }
                Err(err)
            }
        }
    }

    /// Ranked records matching `query` within `scope`.
    pub fn search(
        &self,
        query: &str,
        scope: Scope,
        limit: Option<usize>,
    ) -> Result<Vec<SearchHit>, ContextError> {
        let limit = limit.unwrap_or(self.config.search.default_limit);
        if limit == 0 {
            return Err(ContextError::validation("limit must be at least 1"));
        }
        let query = Query::parse(query)?;
        let candidates = scope
            .stores()
            .iter()
            .flat_map(|kind| self.records_of(*kind));
        let hits = search::rank(candidates, &query, self.weights, limit);
        debug!(
            "search finished (query='{}', scope={scope}, hits={})",
            query.raw(),
            hits.len()
        );
        Ok(hits)
    }

    /// Digest of the `count` most recent sessions and events.
    pub fn recent_digest(&self, count: usize) -> Result<String, ContextError> {
        if count == 0 {
            return Err(ContextError::validation("session count must be at least 1"));
        }
        let mut records: Vec<StoredRecord> = self
            .sessions
            .list(Some(count))
            .into_iter()
            .map(Record::into_stored)
            .collect();
        records.extend(self.events.list(Some(count)).into_iter().map(Record::into_stored));
        Ok(self.composer.recent_digest(records))
    }

    /// Digest of the records most relevant to a task description.
    pub fn relevant_digest(&self, task: &str) -> Result<String, ContextError> {
        let task = self.checked_text("task description", task)?;
        let focus = TaskFocus::classify(task);
        let hits = self.search(task, Scope::All, Some(self.config.digest.relevant_limit))?;
        Ok(self.composer.relevant_digest(focus, &hits))
    }

    pub fn stats(&self) -> ContextStats {
        let sessions = self.sessions.snapshot();
        ContextStats {
            sessions: sessions.len(),
            events: self.events.len(),
            summaries: self.summaries.len(),
            decisions: self.decisions.len(),
            session_phrases: sessions.iter().map(|s| s.extracted_phrases.len()).sum(),
            session_words: sessions.iter().map(|s| s.word_count).sum(),
            storage_root: self.root.clone(),
            capacity: self.config.storage.capacity,
        }
    }

    /// Remove records older than `days` from every store.
    pub fn clear_older_than(&self, days: u64) -> Result<RetentionReport, ContextError> {
        let targets: [&dyn RetentionTarget; 4] =
            [&self.sessions, &self.events, &self.summaries, &self.decisions];
        retention::sweep(&targets, self.clock.now(), days)
    }

    fn records_of(&self, kind: StoreKind) -> Vec<StoredRecord> {
        match kind {
            StoreKind::Sessions => stored(self.sessions.snapshot()),
            StoreKind::Events => stored(self.events.snapshot()),
            StoreKind::Summaries => stored(self.summaries.snapshot()),
            StoreKind::Decisions => stored(self.decisions.snapshot()),
        }
    }

    fn checked_text<'a>(&self, field: &str, text: &'a str) -> Result<&'a str, ContextError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ContextError::validation(format!("{field} must not be empty")));
        }
        let chars = trimmed.chars().count();
        let max = self.config.input.max_text_chars;
        if chars > max {
            return Err(ContextError::validation(format!(
                "{field} is {chars} characters, limit is {max}"
            )));
        }
        Ok(trimmed)
    }

    fn check_tags(&self, tags: &[String]) -> Result<(), ContextError> {
        let max = self.config.input.max_tags;
        if tags.len() > max {
            return Err(ContextError::validation(format!(
                "{} tags given, limit is {max}",
                tags.len()
            )));
        }
        Ok(())
    }
}

fn stored<R: Record>(records: Vec<R>) -> Vec<StoredRecord> {
    records.into_iter().map(Record::into_stored).collect()
}

#[cfg(test)]
mod tests {
    use super::ContextEngine;
    use crate::clock::ManualClock;
    use crate::error::ContextError;
    use crate::record::{PhraseCategory, StoreKind};
    use crate::search::Scope;
    use chrono::{TimeDelta, TimeZone, Utc};
    use ctxlog_config::ContextConfig;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::{TempDir, tempdir};

    fn engine() -> (TempDir, ManualClock, ContextEngine) {
        let root = tempdir().expect("root");
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 9, 1, 10, 0, 0).unwrap());
        let engine = ContextEngine::with_clock(
            root.path(),
            ContextConfig::default(),
            Arc::new(clock.clone()),
        )
        .expect("engine");
        (root, clock, engine)
    }

    #[test]
    fn session_summary_is_truncated_and_tagged() {
        let (_root, _clock, engine) = engine();
        let receipt = engine
            .submit_session_summary(
                "We decided to use Postgres for storage because joins matter",
                &["backend".to_string()],
                Some(5),
            )
            .expect("submit");
        assert!(receipt.truncated);
        assert_eq!(receipt.record.text, "We decided to use Postgres...");
        assert_eq!(receipt.record.word_count, 5);
        assert_eq!(receipt.record.extracted_phrases.len(), 1);
        assert!(receipt.record.full_text.is_some());
        assert!(receipt.record.tags.contains("decision"));
        assert!(receipt.record.tags.contains("backend"));
        assert_eq!(
            receipt.to_string(),
            "Session summary saved (5 words, 1 key phrases)"
        );
    }

    #[test]
    fn invalid_input_leaves_stores_untouched() {
        let (_root, _clock, engine) = engine();
        assert!(matches!(
            engine.submit_session_summary("   ", &[], None),
            Err(ContextError::Validation(_))
        ));
        assert!(engine.submit_session_summary("ok", &[], Some(0)).is_err());
        let many: Vec<String> = (0..17).map(|idx| format!("t{idx}")).collect();
        assert!(engine.submit_session_summary("ok", &many, None).is_err());
        assert!(engine.record_event("  ", "details", None).is_err());
        assert!(engine.search("database", Scope::All, Some(0)).is_err());
        assert!(engine.recent_digest(0).is_err());
        assert_eq!(engine.stats().total_records(), 0);
    }

    #[test]
    fn unrecognized_event_type_is_stored_and_noted() {
        let (_root, _clock, engine) = engine();
        let receipt = engine
            .record_event(" Release_Party ", "cake in the lobby", Some("web"))
            .expect("event");
        assert!(!receipt.recognized);
        assert_eq!(receipt.record.event_type, "release_party");
        assert_eq!(
            receipt.to_string(),
            "Recorded release_party event for web (note: 'release_party' is not a recognized event type)"
        );

        let known = engine
            .record_event("error_solved", "Fixed by bumping the pool size", None)
            .expect("event");
        assert!(known.recognized);
        assert_eq!(known.to_string(), "Recorded error_solved event for project");
        assert!(known.record.tags.contains("error_solved"));
        assert!(known.record.tags.contains("solution"));
    }

    #[test]
    fn multi_level_summary_writes_decisions() {
        let (_root, _clock, engine) = engine();
        let receipt = engine
            .save_multi_level_summary("Bug: cache misses. We chose to shard by tenant.")
            .expect("levels");
        let decision = receipt.decision.expect("decision");
        assert_eq!(decision.source_seq, receipt.summary.stamp.seq);
        assert_eq!(decision.phrases[0].category, PhraseCategory::Problem);
        assert_eq!(
            decision.text,
            "PROBLEM: Bug: cache misses\nDECISION: chose to shard by tenant"
        );

        let plain = engine
            .save_multi_level_summary("Nothing notable happened")
            .expect("levels");
        assert!(plain.decision.is_none());
        assert_eq!(
            plain.to_string(),
            "Context saved at multiple levels (summary + 0 key phrases)"
        );
        let stats = engine.stats();
        assert_eq!((stats.summaries, stats.decisions), (2, 1));
    }

    #[test]
    fn retention_uses_engine_clock() {
        let (_root, clock, engine) = engine();
        engine.submit_session_summary("old note", &[], None).expect("submit");
        clock.advance(TimeDelta::days(10));
        engine
            .record_event("project_setup", "fresh clone", None)
            .expect("event");

        let report = engine.clear_older_than(5).expect("sweep");
        assert_eq!(report.removed_from(StoreKind::Sessions), 1);
        assert_eq!(report.total(), 1);
        assert_eq!(engine.stats().events, 1);
    }
}
