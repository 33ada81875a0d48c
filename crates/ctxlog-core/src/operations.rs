//! String-returning entry points for command-line and tool callers.
//!
//! Each operation renders its outcome as text. Pending storage warnings are
//! prefixed to whatever the operation returns, and errors come back as
//! `Error: ...` lines rather than failures.

use crate::engine::ContextEngine;
use crate::error::ContextError;
use crate::search::Scope;
use log::debug;
use std::fmt::Display;

pub struct ContextOperations {
    engine: ContextEngine,
}

impl ContextOperations {
    pub fn new(engine: ContextEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &ContextEngine {
        &self.engine
    }

    pub fn submit_session_summary(
        &self,
        text: &str,
        tags: &[String],
        max_words: Option<usize>,
    ) -> String {
        self.respond(self.engine.submit_session_summary(text, tags, max_words))
    }

    pub fn record_event(&self, event_type: &str, details: &str, project: Option<&str>) -> String {
        self.respond(self.engine.record_event(event_type, details, project))
    }

    pub fn recent_context(&self, sessions_back: usize) -> String {
        self.respond(self.engine.recent_digest(sessions_back))
    }

    pub fn relevant_context(&self, task: &str) -> String {
        self.respond(self.engine.relevant_digest(task))
    }

    /// `scope` is one of sessions, events, summaries, decisions or all.
    pub fn search(&self, query: &str, scope: &str, limit: Option<usize>) -> String {
        let rendered = scope.parse::<Scope>().and_then(|scope| {
            let hits = self.engine.search(query, scope, limit)?;
            Ok(self.engine.composer().search_results(query.trim(), &hits))
        });
        self.respond(rendered)
    }

    pub fn save_multi_level_summary(&self, text: &str) -> String {
        self.respond(self.engine.save_multi_level_summary(text))
    }

    pub fn stats(&self) -> String {
        self.respond(Ok::<_, ContextError>(self.engine.stats()))
    }

    pub fn cleanup(&self, days_old: u64) -> String {
        self.respond(self.engine.clear_older_than(days_old))
    }

    fn respond<T: Display>(&self, result: Result<T, ContextError>) -> String {
        let mut out = String::new();
        for warning in self.engine.take_warnings() {
            out.push_str(&format!("WARNING: {warning}\n"));
        }
        match result {
            Ok(value) => {
                out.push_str(&value.to_string());
            }
            Err(err) => {
                debug!("operation failed: {err}");
                out.push_str(&format!("Error: {err}"));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::ContextOperations;
    use crate::engine::ContextEngine;
    use ctxlog_config::ContextConfig;
    use tempfile::tempdir;

    #[test]
    fn errors_render_as_text() {
        let root = tempdir().expect("root");
        let ops = ContextOperations::new(
            ContextEngine::open(root.path(), ContextConfig::default()).expect("engine"),
        );
        assert!(ops.search("x", "galaxy", None).starts_with("Error: invalid scope 'galaxy'"));
        assert!(ops.submit_session_summary("", &[], None).starts_with("Error: invalid input"));
        assert_eq!(ops.search("nothing", "all", None), "No context found matching 'nothing'");
        assert!(ops.stats().starts_with("=== CONTEXT STATISTICS ==="));
        assert_eq!(ops.cleanup(30), "No entries older than 30 days found");
    }
}
