//! Error types for schedule-engine operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// User input failed task validation (title, duration, deadline, ...).
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid grid configuration: {0}")]
    InvalidGrid(String),

    #[error("Invalid datetime '{input}': {reason}")]
    InvalidDatetime { input: String, reason: String },

    /// A calendar cell key could not be parsed.
    #[error("Invalid cell key: {0}")]
    InvalidCell(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Placement rejected by `OverlapPolicy::Reject`.
    #[error("Block {block} overlaps block {with}")]
    Overlap { block: String, with: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        EngineError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
