//! Core data model types for langdrill.
//!
//! An [`Attempt`] is an immutable event; a [`Progress`] is the mutable
//! per-user, per-exercise aggregate that the skill tracker updates.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Easiest difficulty level.
pub const MIN_LEVEL: u8 = 1;
/// Hardest difficulty level.
pub const MAX_LEVEL: u8 = 5;

/// Clamp an arbitrary integer into the valid level range.
pub fn clamp_level(level: i64) -> u8 {
    level.clamp(MIN_LEVEL as i64, MAX_LEVEL as i64) as u8
}

/// The closed set of drill kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Speech,
    Prepositions,
    SentenceTf,
}

impl ExerciseKind {
    /// All exercise kinds, in display order.
    pub const ALL: [ExerciseKind; 3] = [
        ExerciseKind::Speech,
        ExerciseKind::Prepositions,
        ExerciseKind::SentenceTf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::Speech => "speech",
            ExerciseKind::Prepositions => "prepositions",
            ExerciseKind::SentenceTf => "sentence_tf",
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "speech" => Ok(ExerciseKind::Speech),
            "prepositions" => Ok(ExerciseKind::Prepositions),
            "sentence_tf" => Ok(ExerciseKind::SentenceTf),
            other => Err(format!("unknown exercise: {other}")),
        }
    }
}

/// A single recorded answer. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    /// Surrogate key assigned at creation.
    pub id: Uuid,
    pub user_id: String,
    pub exercise: ExerciseKind,
    #[serde(default)]
    pub item_id: Option<String>,
    pub correct: bool,
    /// Response latency, when the client measured one.
    #[serde(default)]
    pub latency_ms: Option<u64>,
    /// Level the client believes the item was served at.
    #[serde(default)]
    pub difficulty_level: Option<u8>,
    pub ts: DateTime<Utc>,
}

/// Skill estimate for one user on one exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub user_id: String,
    pub exercise: ExerciseKind,
    /// Current difficulty, always within `MIN_LEVEL..=MAX_LEVEL`.
    pub level: u8,
    /// Exponential moving average of correctness, within `0.0..=1.0`.
    pub ema_accuracy: f64,
    /// Exponential moving average of response latency in milliseconds.
    pub ema_latency_ms: f64,
    /// Total attempts recorded.
    pub attempts: u32,
    /// Consecutive correct attempts since the last miss or promotion.
    pub streak: u32,
    pub last_updated: DateTime<Utc>,
}

impl Progress {
    /// A fresh record at level 1 with all counters zeroed.
    pub fn new(user_id: impl Into<String>, exercise: ExerciseKind, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            exercise,
            level: MIN_LEVEL,
            ema_accuracy: 0.0,
            ema_latency_ms: 0.0,
            attempts: 0,
            streak: 0,
            last_updated: now,
        }
    }
}
