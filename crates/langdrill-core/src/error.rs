//! Error types shared across the workspace.
//!
//! Content and store errors are defined here so the engine can classify
//! failures (and the server can pick a status code) without string matching.

use thiserror::Error;

use crate::model::ExerciseKind;

/// Ways provider output can fail the per-exercise schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaViolation {
    /// The payload did not have the expected shape.
    #[error("malformed {exercise} content: {message}")]
    Shape {
        exercise: ExerciseKind,
        message: String,
    },

    /// Fewer items than the schema minimum.
    #[error("expected at least {min} items, got {found}")]
    TooFewItems { found: usize, min: usize },

    /// A required string field was empty.
    #[error("item {index}: field `{field}` is empty")]
    EmptyField { index: usize, field: &'static str },

    /// Blank markers, answers, and the requested blank count disagree.
    #[error("item {index}: {markers} blank marker(s) and {answers} answer(s), expected {expected}")]
    BlankMismatch {
        index: usize,
        markers: usize,
        answers: usize,
        expected: usize,
    },

    /// Content was produced for a different exercise than requested.
    #[error("content is for {found}, expected {expected}")]
    ExerciseMismatch {
        expected: ExerciseKind,
        found: ExerciseKind,
    },
}

/// Errors that can occur while producing practice content.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The provider did not answer in time.
    #[error("content generation timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    /// A network error occurred.
    #[error("transport error: {0}")]
    Transport(String),

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The response could not be decoded into JSON content.
    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// The content decoded but violates the exercise schema.
    #[error("schema violation: {0}")]
    Schema(#[from] SchemaViolation),
}

impl ContentError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ContentError::Timeout { .. })
    }
}

/// Errors raised by a progress store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached or opened.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A read or write failed.
    #[error("store query failed: {0}")]
    Query(String),

    /// A persisted row could not be decoded.
    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Errors surfaced by [`DrillEngine`](crate::engine::DrillEngine) operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The request was rejected before touching any state.
    #[error("invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// An invalid configuration value.
#[derive(Debug, Clone, Error)]
#[error("invalid configuration: {message}")]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
