//! Request orchestration around the skill tracker.
//!
//! The engine owns the read-modify-write sequence for attempts (serialized
//! per `(user, exercise)` key) and the bounded call into the content
//! provider for the next batch.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::content::ExerciseContent;
use crate::error::{ContentError, EngineError};
use crate::locks::KeyedLocks;
use crate::model::{Attempt, ExerciseKind, Progress, MAX_LEVEL, MIN_LEVEL};
use crate::params::{derive_params, GenerationParams};
use crate::tracker::{SkillTracker, Transition};
use crate::traits::{ContentProvider, ContentRequest, ProgressStore};

/// Configuration for the drill engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on one content provider call.
    pub generation_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            generation_timeout: Duration::from_secs(30),
        }
    }
}

/// One attempt as submitted by a client, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct AttemptSubmission {
    pub user_id: String,
    pub exercise: ExerciseKind,
    #[serde(default)]
    pub item_id: Option<String>,
    pub correct: bool,
    #[serde(default)]
    pub latency_ms: Option<i64>,
    #[serde(default)]
    pub difficulty_level: Option<i64>,
}

impl AttemptSubmission {
    /// Validate and turn into an immutable [`Attempt`] stamped `now`.
    fn into_attempt(self, now: chrono::DateTime<Utc>) -> Result<Attempt, EngineError> {
        validate_user_id(&self.user_id)?;

        let latency_ms = match self.latency_ms {
            Some(ms) if ms < 0 => {
                return Err(EngineError::Validation(format!(
                    "latency_ms must be non-negative, got {ms}"
                )))
            }
            Some(ms) => Some(ms as u64),
            None => None,
        };

        let difficulty_level = match self.difficulty_level {
            Some(level) if !(i64::from(MIN_LEVEL)..=i64::from(MAX_LEVEL)).contains(&level) => {
                return Err(EngineError::Validation(format!(
                    "difficulty_level must be between {MIN_LEVEL} and {MAX_LEVEL}, got {level}"
                )))
            }
            Some(level) => Some(level as u8),
            None => None,
        };

        Ok(Attempt {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            exercise: self.exercise,
            item_id: self.item_id,
            correct: self.correct,
            latency_ms,
            difficulty_level,
            ts: now,
        })
    }
}

/// A generated batch plus the level it was generated for.
#[derive(Debug, Clone)]
pub struct NextBatch {
    pub level: u8,
    pub params: GenerationParams,
    pub provider: String,
    pub content: ExerciseContent,
}

/// The central drill engine.
pub struct DrillEngine {
    store: Arc<dyn ProgressStore>,
    provider: Arc<dyn ContentProvider>,
    tracker: SkillTracker,
    locks: KeyedLocks<(String, ExerciseKind)>,
    config: EngineConfig,
}

impl DrillEngine {
    pub fn new(
        store: Arc<dyn ProgressStore>,
        provider: Arc<dyn ContentProvider>,
        tracker: SkillTracker,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            provider,
            tracker,
            locks: KeyedLocks::new(),
            config,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Record one attempt and return the updated progress.
    #[instrument(skip(self, submission), fields(user_id = %submission.user_id, exercise = %submission.exercise))]
    pub async fn record_attempt(
        &self,
        submission: AttemptSubmission,
    ) -> Result<Progress, EngineError> {
        let attempt = submission.into_attempt(Utc::now())?;

        let _guard = self
            .locks
            .lock(&(attempt.user_id.clone(), attempt.exercise))
            .await;

        let mut progress = self
            .store
            .load_or_init(&attempt.user_id, attempt.exercise)
            .await?;
        let transition =
            self.tracker
                .record_attempt(&mut progress, attempt.correct, attempt.latency_ms, attempt.ts);

        match transition {
            Transition::Unchanged => tracing::debug!(
                level = progress.level,
                streak = progress.streak,
                ema_accuracy = progress.ema_accuracy,
                "attempt recorded"
            ),
            _ => tracing::info!(
                %transition,
                ema_accuracy = progress.ema_accuracy,
                ema_latency_ms = progress.ema_latency_ms,
                "level changed"
            ),
        }

        self.store.commit_attempt(&attempt, &progress).await?;
        Ok(progress)
    }

    /// All progress records for a user.
    pub async fn progress(&self, user_id: &str) -> Result<Vec<Progress>, EngineError> {
        validate_user_id(user_id)?;
        Ok(self.store.list_progress(user_id).await?)
    }

    /// Generate the next batch at the user's current level.
    #[instrument(skip(self, options), fields(provider = %self.provider.name()))]
    pub async fn next_batch(
        &self,
        user_id: &str,
        exercise: ExerciseKind,
        options: serde_json::Map<String, serde_json::Value>,
    ) -> Result<NextBatch, EngineError> {
        validate_user_id(user_id)?;

        let progress = self.store.load_or_init(user_id, exercise).await?;
        let params = derive_params(exercise, progress.level);
        let request = ContentRequest {
            params: params.clone(),
            options,
        };

        let timeout = self.config.generation_timeout;
        let content = match tokio::time::timeout(timeout, self.provider.generate(&request)).await {
            Ok(Ok(content)) => content,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "content generation failed");
                return Err(e.into());
            }
            Err(_) => {
                let e = ContentError::Timeout {
                    after_ms: timeout.as_millis() as u64,
                };
                tracing::warn!(error = %e, "content generation failed");
                return Err(e.into());
            }
        };

        // Providers are expected to validate; re-check so a faulty one
        // cannot leak invalid content.
        content.validate(&params).map_err(ContentError::from)?;

        Ok(NextBatch {
            level: progress.level,
            params,
            provider: self.provider.name().to_string(),
            content,
        })
    }
}

fn validate_user_id(user_id: &str) -> Result<(), EngineError> {
    if user_id.trim().is_empty() {
        return Err(EngineError::Validation("user_id must not be empty".into()));
    }
    Ok(())
}
