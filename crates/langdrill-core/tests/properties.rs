//! Property tests for the tracker and parameter invariants.

use std::sync::Arc;

use chrono::Utc;
use proptest::prelude::*;

use langdrill_core::model::{ExerciseKind, Progress, MAX_LEVEL, MIN_LEVEL};
use langdrill_core::params::derive_params;
use langdrill_core::thresholds::TrackerConfig;
use langdrill_core::tracker::{SkillTracker, Transition};

fn arb_exercise() -> impl Strategy<Value = ExerciseKind> {
    prop_oneof![
        Just(ExerciseKind::Speech),
        Just(ExerciseKind::Prepositions),
        Just(ExerciseKind::SentenceTf),
    ]
}

fn arb_attempt() -> impl Strategy<Value = (bool, Option<u64>)> {
    (any::<bool>(), proptest::option::of(0u64..30_000))
}

fn tracker() -> SkillTracker {
    SkillTracker::new(Arc::new(TrackerConfig::default()))
}

proptest! {
    #[test]
    fn level_and_averages_stay_in_range(
        exercise in arb_exercise(),
        attempts in proptest::collection::vec(arb_attempt(), 0..200),
    ) {
        let t = tracker();
        let mut p = Progress::new("u", exercise, Utc::now());
        let mut last_attempts = 0;
        for (correct, latency) in attempts {
            let before = p.level;
            let transition = t.record_attempt(&mut p, correct, latency, Utc::now());
            prop_assert!((MIN_LEVEL..=MAX_LEVEL).contains(&p.level));
            prop_assert!((0.0..=1.0).contains(&p.ema_accuracy));
            prop_assert!(p.ema_latency_ms >= 0.0);
            prop_assert!(p.attempts > last_attempts);
            prop_assert!((i16::from(p.level) - i16::from(before)).abs() <= 1);
            last_attempts = p.attempts;
            if transition == Transition::Unchanged {
                prop_assert_eq!(p.level, before);
            }
        }
    }

    #[test]
    fn promotion_requires_every_condition(
        exercise in arb_exercise(),
        attempts in proptest::collection::vec(arb_attempt(), 1..200),
    ) {
        let t = tracker();
        let config = TrackerConfig::default();
        let mut p = Progress::new("u", exercise, Utc::now());
        for (correct, latency) in attempts {
            let before = p.clone();
            let transition = t.record_attempt(&mut p, correct, latency, Utc::now());
            if let Transition::Promoted { from, to } = transition {
                prop_assert!(correct);
                prop_assert_eq!(to, from + 1);
                prop_assert!(p.attempts >= 5);
                prop_assert!(p.ema_accuracy >= 0.85);
                prop_assert!(before.streak + 1 >= 3);
                prop_assert!(p.ema_latency_ms <= config.thresholds.max_latency_ms(exercise, from));
                prop_assert_eq!(p.streak, 0);
            }
        }
    }

    #[test]
    fn demotion_requires_low_accuracy(
        exercise in arb_exercise(),
        start_level in 1u8..=5,
        attempts in proptest::collection::vec(arb_attempt(), 1..200),
    ) {
        let t = tracker();
        let mut p = Progress::new("u", exercise, Utc::now());
        p.level = start_level;
        for (correct, latency) in attempts {
            let transition = t.record_attempt(&mut p, correct, latency, Utc::now());
            if let Transition::Demoted { from, to } = transition {
                prop_assert!(!correct);
                prop_assert_eq!(to + 1, from);
                prop_assert!(to >= MIN_LEVEL);
                prop_assert!(p.attempts >= 4);
                prop_assert!(p.ema_accuracy <= 0.60);
            }
        }
    }

    #[test]
    fn params_are_pure(exercise in arb_exercise(), level in any::<u8>()) {
        prop_assert_eq!(derive_params(exercise, level), derive_params(exercise, level));
        prop_assert_eq!(derive_params(exercise, level).exercise(), exercise);
        prop_assert_eq!(derive_params(exercise, level).count(), 5);
    }
}
