//! Engine error types

use thiserror::Error;

/// Errors surfaced by engine infrastructure (stores, decoding, internal
/// invariants). Assignment failures have their own typed enum in the engine
/// crate; these are the plumbing-level failures.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid time value: {0}")]
    InvalidTime(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
