//! Error types for highlighting runs
//!
//! Two failure kinds matter during a run: a pattern that does not compile
//! (skip the pattern) and a node the walk cannot rewrite (skip the node).
//! Everything else is configuration or input loading.

use dom::DomError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HighlightError>;

#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("Invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("Traversal error: {0}")]
    Traversal(#[from] DomError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid filing data: {0}")]
    Filing(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
