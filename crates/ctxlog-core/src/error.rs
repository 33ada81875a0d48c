//! Error types for context engine operations.

use thiserror::Error;

/// Errors returned by the context engine and its stores.
#[derive(Debug, Error)]
pub enum ContextError {
    /// Caller input was rejected before any state changed.
    #[error("invalid input: {0}")]
    Validation(String),
    /// Search scope name is not one of the known scopes.
    #[error("invalid scope '{0}' (expected sessions, events, summaries, decisions or all)")]
    InvalidScope(String),
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Extraction marker compilation error.
    #[error("pattern error: {0}")]
    Pattern(String),
}

impl ContextError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
