//! Failures while loading a ctxlog config stack.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file, or the directory a lookup starts from, is unreadable.
    #[error("cannot read ctxlog config {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A layer is not well-formed JSON5.
    #[error("ctxlog config layer {layer} is not valid JSON5: {source}")]
    ParseFailed { layer: String, source: json5::Error },
    /// The merged document does not fit the config model.
    #[error("ctxlog config does not match the expected shape: {0}")]
    DecodeFailed(#[from] serde_json::Error),
    /// One setting has the wrong type or an out-of-range value.
    #[error("invalid ctxlog setting {path}: {message}")]
    InvalidField { path: String, message: String },
    /// Settings that are fine alone but conflict together.
    #[error("inconsistent ctxlog config: {0}")]
    Invalid(String),
}
