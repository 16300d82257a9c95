//! Latency ceilings and the immutable tracker configuration.
//!
//! A [`TrackerConfig`] is built once at startup and handed to the
//! [`SkillTracker`](crate::tracker::SkillTracker); nothing here is global.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::{ExerciseKind, MAX_LEVEL, MIN_LEVEL};

/// Ceiling used when an exercise or level has no entry.
pub const DEFAULT_MAX_LATENCY_MS: f64 = 8000.0;

/// Per-exercise, per-level maximum acceptable latency EMA in milliseconds.
///
/// Each list is indexed by `level - 1`. Missing entries fall back to
/// [`DEFAULT_MAX_LATENCY_MS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdTable {
    pub speech: Vec<f64>,
    pub prepositions: Vec<f64>,
    pub sentence_tf: Vec<f64>,
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self {
            speech: vec![8000.0, 7000.0, 6000.0, 5000.0, 4500.0],
            prepositions: vec![10000.0, 9000.0, 8000.0, 7000.0, 6000.0],
            sentence_tf: vec![12000.0, 10000.0, 9000.0, 8000.0, 8000.0],
        }
    }
}

impl ThresholdTable {
    fn ceilings(&self, exercise: ExerciseKind) -> &[f64] {
        match exercise {
            ExerciseKind::Speech => &self.speech,
            ExerciseKind::Prepositions => &self.prepositions,
            ExerciseKind::SentenceTf => &self.sentence_tf,
        }
    }

    /// Maximum latency EMA allowed for promotion out of `level`.
    pub fn max_latency_ms(&self, exercise: ExerciseKind, level: u8) -> f64 {
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
            return DEFAULT_MAX_LATENCY_MS;
        }
        self.ceilings(exercise)
            .get(usize::from(level - 1))
            .copied()
            .unwrap_or(DEFAULT_MAX_LATENCY_MS)
    }
}

/// Conditions that must all hold, on a correct attempt, to move up a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromotionPolicy {
    pub min_attempts: u32,
    pub min_accuracy: f64,
    pub min_streak: u32,
}

impl Default for PromotionPolicy {
    fn default() -> Self {
        Self {
            min_attempts: 5,
            min_accuracy: 0.85,
            min_streak: 3,
        }
    }
}

/// Conditions that must all hold, on an incorrect attempt, to move down a level.
///
/// Demotion deliberately ignores latency and leaves the streak untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemotionPolicy {
    pub min_attempts: u32,
    pub max_accuracy: f64,
}

impl Default for DemotionPolicy {
    fn default() -> Self {
        Self {
            min_attempts: 4,
            max_accuracy: 0.60,
        }
    }
}

/// Everything the skill tracker needs to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// EMA smoothing factor applied to every new sample.
    pub alpha: f64,
    pub thresholds: ThresholdTable,
    pub promotion: PromotionPolicy,
    pub demotion: DemotionPolicy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            thresholds: ThresholdTable::default(),
            promotion: PromotionPolicy::default(),
            demotion: DemotionPolicy::default(),
        }
    }
}

impl TrackerConfig {
    /// Reject values that would break the EMA or level invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(ConfigError::new(format!(
                "alpha must be in (0, 1], got {}",
                self.alpha
            )));
        }
        for (name, value) in [
            ("promotion.min_accuracy", self.promotion.min_accuracy),
            ("demotion.max_accuracy", self.demotion.max_accuracy),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::new(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }
        for exercise in ExerciseKind::ALL {
            if let Some(bad) = self
                .thresholds
                .ceilings(exercise)
                .iter()
                .find(|v| !(v.is_finite() && **v > 0.0))
            {
                return Err(ConfigError::new(format!(
                    "latency threshold for {exercise} must be positive, got {bad}"
                )));
            }
        }
        Ok(())
    }
}
