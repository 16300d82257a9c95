//! Level-to-parameter mapping for content generation.
//!
//! [`derive_params`] is the single dispatch point: one variant per exercise,
//! each a pure function of the level.

use serde::{Deserialize, Serialize};

use crate::model::{ExerciseKind, MAX_LEVEL, MIN_LEVEL};

/// Items requested per batch, for every exercise.
pub const BATCH_SIZE: usize = 5;

/// Prepositions in the order they are unlocked.
pub const PREPOSITIONS: [&str; 7] = ["in", "on", "at", "under", "over", "between", "behind"];

/// How closely a spoken answer must match its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    Lenient,
    Normal,
    Strict,
}

impl Strictness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strictness::Lenient => "lenient",
            Strictness::Normal => "normal",
            Strictness::Strict => "strict",
        }
    }
}

impl std::fmt::Display for Strictness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Strictness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Strictness::Lenient),
            "normal" => Ok(Strictness::Normal),
            "strict" => Ok(Strictness::Strict),
            other => Err(format!("unknown strictness: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechParams {
    pub count: usize,
    pub strictness: Strictness,
    /// Longest phrase, in words.
    pub max_words: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepositionParams {
    pub count: usize,
    /// Blanks per sentence.
    pub blanks: usize,
    /// Prepositions the generator may use as answers.
    pub allowed: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceTfParams {
    pub count: usize,
    /// Sentences per passage.
    pub sentences: usize,
    /// Whether claims may require inference rather than literal recall.
    pub inference: bool,
    /// Whether claims may be phrased with negation.
    pub negation: bool,
}

/// Generation parameters, tagged by exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "exercise", rename_all = "snake_case")]
pub enum GenerationParams {
    Speech(SpeechParams),
    Prepositions(PrepositionParams),
    SentenceTf(SentenceTfParams),
}

impl GenerationParams {
    pub fn exercise(&self) -> ExerciseKind {
        match self {
            GenerationParams::Speech(_) => ExerciseKind::Speech,
            GenerationParams::Prepositions(_) => ExerciseKind::Prepositions,
            GenerationParams::SentenceTf(_) => ExerciseKind::SentenceTf,
        }
    }

    /// Number of items requested.
    pub fn count(&self) -> usize {
        match self {
            GenerationParams::Speech(p) => p.count,
            GenerationParams::Prepositions(p) => p.count,
            GenerationParams::SentenceTf(p) => p.count,
        }
    }
}

/// Parameters for `exercise` at `level`. Levels outside 1..=5 are clamped.
pub fn derive_params(exercise: ExerciseKind, level: u8) -> GenerationParams {
    let level = level.clamp(MIN_LEVEL, MAX_LEVEL);
    match exercise {
        ExerciseKind::Speech => GenerationParams::Speech(speech_params(level)),
        ExerciseKind::Prepositions => GenerationParams::Prepositions(preposition_params(level)),
        ExerciseKind::SentenceTf => GenerationParams::SentenceTf(sentence_tf_params(level)),
    }
}

fn speech_params(level: u8) -> SpeechParams {
    let strictness = match level {
        0..=2 => Strictness::Lenient,
        3 => Strictness::Normal,
        _ => Strictness::Strict,
    };
    let max_words = match level {
        0 | 1 => 3,
        2 => 4,
        3 => 5,
        4 => 6,
        _ => 8,
    };
    SpeechParams {
        count: BATCH_SIZE,
        strictness,
        max_words,
    }
}

fn preposition_params(level: u8) -> PrepositionParams {
    let level = usize::from(level);
    let unlocked = 3 + level.min(4);
    PrepositionParams {
        count: BATCH_SIZE,
        blanks: (1 + level / 2).min(3),
        allowed: PREPOSITIONS[..unlocked]
            .iter()
            .map(|p| p.to_string())
            .collect(),
    }
}

fn sentence_tf_params(level: u8) -> SentenceTfParams {
    SentenceTfParams {
        count: BATCH_SIZE,
        sentences: if level <= 3 { 1 } else { 2 },
        inference: level >= 3,
        negation: level >= 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speech(level: u8) -> SpeechParams {
        match derive_params(ExerciseKind::Speech, level) {
            GenerationParams::Speech(p) => p,
            other => panic!("unexpected {other:?}"),
        }
    }

    fn prepositions(level: u8) -> PrepositionParams {
        match derive_params(ExerciseKind::Prepositions, level) {
            GenerationParams::Prepositions(p) => p,
            other => panic!("unexpected {other:?}"),
        }
    }

    fn sentence_tf(level: u8) -> SentenceTfParams {
        match derive_params(ExerciseKind::SentenceTf, level) {
            GenerationParams::SentenceTf(p) => p,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn speech_table() {
        let expected = [
            (1, Strictness::Lenient, 3),
            (2, Strictness::Lenient, 4),
            (3, Strictness::Normal, 5),
            (4, Strictness::Strict, 6),
            (5, Strictness::Strict, 8),
        ];
        for (level, strictness, max_words) in expected {
            let p = speech(level);
            assert_eq!(p.count, 5);
            assert_eq!(p.strictness, strictness, "level {level}");
            assert_eq!(p.max_words, max_words, "level {level}");
        }
    }

    #[test]
    fn preposition_table() {
        let expected = [(1, 1, 4), (2, 2, 5), (3, 2, 6), (4, 3, 7), (5, 3, 7)];
        for (level, blanks, allowed) in expected {
            let p = prepositions(level);
            assert_eq!(p.count, 5);
            assert_eq!(p.blanks, blanks, "level {level}");
            assert_eq!(p.allowed.len(), allowed, "level {level}");
        }
        assert_eq!(prepositions(1).allowed, vec!["in", "on", "at", "under"]);
        assert_eq!(prepositions(5).allowed.last().unwrap(), "behind");
    }

    #[test]
    fn sentence_tf_table() {
        let p = sentence_tf(1);
        assert_eq!((p.count, p.sentences, p.inference, p.negation), (5, 1, false, false));
        let p = sentence_tf(3);
        assert_eq!((p.sentences, p.inference, p.negation), (1, true, false));
        let p = sentence_tf(4);
        assert_eq!((p.sentences, p.inference, p.negation), (2, true, false));
        let p = sentence_tf(5);
        assert_eq!((p.sentences, p.inference, p.negation), (2, true, true));
    }

    #[test]
    fn out_of_range_levels_clamp() {
        assert_eq!(speech(0), speech(1));
        assert_eq!(prepositions(42), prepositions(5));
    }

    #[test]
    fn serializes_with_exercise_tag() {
        let value = serde_json::to_value(derive_params(ExerciseKind::Speech, 3)).unwrap();
        assert_eq!(value["exercise"], "speech");
        assert_eq!(value["strictness"], "normal");
        assert_eq!(value["max_words"], 5);
        assert_eq!(value["count"], 5);
    }

    #[test]
    fn strictness_parses_case_insensitively() {
        assert_eq!("Strict".parse::<Strictness>(), Ok(Strictness::Strict));
        assert_eq!(" lenient ".parse::<Strictness>(), Ok(Strictness::Lenient));
        assert!("harsh".parse::<Strictness>().is_err());
        assert_eq!(Strictness::Normal.to_string(), "normal");
    }
}
