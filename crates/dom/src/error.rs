//! Error types for DOM operations
//!
//! Simple, flat error hierarchy. No over-engineering.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DomError>;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(u32),

    #[error("Invalid node type: expected {expected}, got {actual}")]
    InvalidNodeType { expected: String, actual: String },

    #[error("Node {0} is detached from the tree")]
    Detached(u32),

    #[error("Node {child} is not a child of {parent}")]
    NotAChild { parent: u32, child: u32 },

    #[error("HTML parse error at byte {offset}: {message}")]
    HtmlParse { offset: usize, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
