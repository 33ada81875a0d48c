//! Lexical relevance scoring and ranking across stores.

use crate::error::ContextError;
use crate::record::{StoreKind, StoredRecord};
use crate::text::{distinct_tokens, tokens};
use ctxlog_config::SearchConfig;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Which stores a search covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Sessions,
    Events,
    Summaries,
    Decisions,
    All,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Sessions => "sessions",
            Scope::Events => "events",
            Scope::Summaries => "summaries",
            Scope::Decisions => "decisions",
            Scope::All => "all",
        }
    }

    /// Stores covered, in tie-break order.
    pub fn stores(self) -> &'static [StoreKind] {
        match self {
            Scope::Sessions => &[StoreKind::Sessions],
            Scope::Events => &[StoreKind::Events],
            Scope::Summaries => &[StoreKind::Summaries],
            Scope::Decisions => &[StoreKind::Decisions],
            Scope::All => &StoreKind::ALL,
        }
    }
}

impl FromStr for Scope {
    type Err = ContextError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sessions" => Ok(Scope::Sessions),
            "events" => Ok(Scope::Events),
            "summaries" => Ok(Scope::Summaries),
            "decisions" => Ok(Scope::Decisions),
            "all" => Ok(Scope::All),
            _ => Err(ContextError::InvalidScope(value.to_string())),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Points awarded per matching query token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWeights {
    pub tag: u32,
    pub text: u32,
}

impl Default for SearchWeights {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for SearchWeights {
    fn from(config: &SearchConfig) -> Self {
        Self {
            tag: config.tag_weight,
            text: config.text_weight,
        }
    }
}

/// Tokenized, de-duplicated search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    raw: String,
    tokens: Vec<String>,
}

impl Query {
    /// Fails when the query contains no searchable terms.
    pub fn parse(raw: &str) -> Result<Self, ContextError> {
        let tokens = distinct_tokens(raw);
        if tokens.is_empty() {
            return Err(ContextError::validation(
                "search query must contain at least one word",
            ));
        }
        Ok(Self {
            raw: raw.trim().to_string(),
            tokens,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

/// A scored record.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub record: StoredRecord,
    pub score: u32,
}

/// Score one record: tag matches and text matches add up per query token.
pub fn score(record: &StoredRecord, query: &Query, weights: SearchWeights) -> u32 {
    let tag_tokens: HashSet<String> = record
        .tags()
        .iter()
        .flat_map(|tag| tokens(tag))
        .collect();
    let text_tokens: HashSet<String> = tokens(record.text()).collect();
    query
        .tokens()
        .iter()
        .map(|token| {
            let mut points = 0;
            if tag_tokens.contains(token) {
                points += weights.tag;
            }
            if text_tokens.contains(token) {
                points += weights.text;
            }
            points
        })
        .sum()
}

/// Score, drop non-matches, order and cap.
///
/// Ordering is score, then timestamp, then insertion sequence (all
/// descending), then store order.
pub fn rank<I>(candidates: I, query: &Query, weights: SearchWeights, limit: usize) -> Vec<SearchHit>
where
    I: IntoIterator<Item = StoredRecord>,
{
    let mut hits: Vec<SearchHit> = candidates
        .into_iter()
        .filter_map(|record| {
            let score = score(&record, query, weights);
            (score > 0).then_some(SearchHit { record, score })
        })
        .collect();
    hits.sort_by_key(|hit| {
        let stamp = hit.record.stamp();
        (
            Reverse(hit.score),
            Reverse(stamp.timestamp),
            Reverse(stamp.seq),
            hit.record.kind(),
        )
    });
    hits.truncate(limit);
    hits
}
