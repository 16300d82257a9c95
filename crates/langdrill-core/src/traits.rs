//! Core trait definitions for content providers and progress stores.
//!
//! These async traits are implemented by the `langdrill-providers` and
//! `langdrill-store` crates respectively.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::content::ExerciseContent;
use crate::error::{ContentError, StoreError};
use crate::model::{Attempt, ExerciseKind, Progress};
use crate::params::GenerationParams;

// ---------------------------------------------------------------------------
// Content provider trait
// ---------------------------------------------------------------------------

/// Turns generation parameters into schema-valid practice items.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Human-readable provider name (e.g. "openai").
    fn name(&self) -> &str;

    /// Produce one batch of content. Implementations must return either
    /// content that passes [`ExerciseContent::validate`] or an error.
    async fn generate(&self, request: &ContentRequest) -> Result<ExerciseContent, ContentError>;
}

/// Request for one batch of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRequest {
    pub params: GenerationParams,
    /// Free-form client options passed through from the request body.
    #[serde(default)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl ContentRequest {
    pub fn new(params: GenerationParams) -> Self {
        Self {
            params,
            options: serde_json::Map::new(),
        }
    }

    pub fn exercise(&self) -> ExerciseKind {
        self.params.exercise()
    }
}

// ---------------------------------------------------------------------------
// Progress store trait
// ---------------------------------------------------------------------------

/// Durable storage for attempts and per-(user, exercise) progress.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Fetch the record for `(user_id, exercise)`, creating a fresh level-1
    /// record on first touch.
    async fn load_or_init(
        &self,
        user_id: &str,
        exercise: ExerciseKind,
    ) -> Result<Progress, StoreError>;

    /// Fetch the record without creating it.
    async fn get(&self, user_id: &str, exercise: ExerciseKind)
        -> Result<Option<Progress>, StoreError>;

    /// Every record the user has, ordered by exercise.
    async fn list_progress(&self, user_id: &str) -> Result<Vec<Progress>, StoreError>;

    /// Append `attempt` and overwrite the progress row in one unit.
    async fn commit_attempt(&self, attempt: &Attempt, progress: &Progress)
        -> Result<(), StoreError>;

    /// Attempts for `(user_id, exercise)`, oldest first.
    async fn list_attempts(
        &self,
        user_id: &str,
        exercise: ExerciseKind,
    ) -> Result<Vec<Attempt>, StoreError>;
}
