//! The level-transition state machine.
//!
//! Each attempt folds one outcome into the moving averages, updates the
//! correct-answer streak, and moves the level by at most one step. Promotion
//! needs both strong averages and a fresh streak; the streak reset on
//! promotion forces renewed evidence before the next step up.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{Progress, MAX_LEVEL, MIN_LEVEL};
use crate::thresholds::TrackerConfig;

/// The level change produced by one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    Promoted { from: u8, to: u8 },
    Demoted { from: u8, to: u8 },
    Unchanged,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Promoted { from, to } => write!(f, "promoted {from} -> {to}"),
            Transition::Demoted { from, to } => write!(f, "demoted {from} -> {to}"),
            Transition::Unchanged => f.write_str("unchanged"),
        }
    }
}

/// Applies attempt outcomes to [`Progress`] records.
#[derive(Debug, Clone)]
pub struct SkillTracker {
    config: Arc<TrackerConfig>,
}

impl SkillTracker {
    pub fn new(config: Arc<TrackerConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Fold one attempt into `progress` and apply the level policy.
    ///
    /// The order is fixed: count, accuracy EMA, latency EMA (only when a
    /// latency was measured), timestamp, then the transition check against
    /// the freshly updated averages.
    pub fn record_attempt(
        &self,
        progress: &mut Progress,
        correct: bool,
        latency_ms: Option<u64>,
        now: DateTime<Utc>,
    ) -> Transition {
        sanitize(progress);
        let alpha = self.config.alpha;

        progress.attempts = progress.attempts.saturating_add(1);

        let sample = if correct { 1.0 } else { 0.0 };
        progress.ema_accuracy =
            (alpha * sample + (1.0 - alpha) * progress.ema_accuracy).clamp(0.0, 1.0);

        if let Some(latency) = latency_ms {
            progress.ema_latency_ms = alpha * latency as f64 + (1.0 - alpha) * progress.ema_latency_ms;
        }

        progress.last_updated = now;

        self.adjust_level(progress, correct)
    }

    fn adjust_level(&self, progress: &mut Progress, correct: bool) -> Transition {
        let from = progress.level;

        if correct {
            progress.streak = progress.streak.saturating_add(1);
            let promote = &self.config.promotion;
            let lat_ok = progress.ema_latency_ms
                <= self
                    .config
                    .thresholds
                    .max_latency_ms(progress.exercise, progress.level);

            if progress.attempts >= promote.min_attempts
                && progress.ema_accuracy >= promote.min_accuracy
                && lat_ok
                && progress.streak >= promote.min_streak
                && progress.level < MAX_LEVEL
            {
                progress.level += 1;
                progress.streak = 0;
                return Transition::Promoted {
                    from,
                    to: progress.level,
                };
            }
        } else {
            progress.streak = 0;
            let demote = &self.config.demotion;
            if progress.attempts >= demote.min_attempts
                && progress.ema_accuracy <= demote.max_accuracy
                && progress.level > MIN_LEVEL
            {
                progress.level -= 1;
                return Transition::Demoted {
                    from,
                    to: progress.level,
                };
            }
        }

        Transition::Unchanged
    }
}

/// Pull a record that was persisted (or built) out of range back into range.
fn sanitize(progress: &mut Progress) {
    progress.level = progress.level.clamp(MIN_LEVEL, MAX_LEVEL);
    progress.ema_accuracy = if progress.ema_accuracy.is_nan() {
        0.0
    } else {
        progress.ema_accuracy.clamp(0.0, 1.0)
    };
    if !progress.ema_latency_ms.is_finite() || progress.ema_latency_ms < 0.0 {
        progress.ema_latency_ms = 0.0;
    }
}
