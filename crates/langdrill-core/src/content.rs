//! Practice content and its per-exercise schema.
//!
//! Every provider's output passes through [`ExerciseContent::from_json`] or
//! [`ExerciseContent::validate`] before it reaches a caller. Unknown fields,
//! missing fields, empty strings, short batches, and blank-count mismatches
//! are all rejected; nothing is patched up.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ContentError, SchemaViolation};
use crate::model::ExerciseKind;
use crate::params::GenerationParams;

/// Minimum number of items in any batch.
pub const MIN_ITEMS: usize = 3;

/// Token that marks a blank in a preposition sentence.
pub const BLANK_MARKER: &str = "{blank}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpeechPhrase {
    pub id: String,
    /// The phrase the user should say.
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpeechContent {
    pub phrases: Vec<SpeechPhrase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrepositionItem {
    pub id: String,
    /// Sentence tokens, with [`BLANK_MARKER`] where a preposition goes.
    pub tokens: Vec<String>,
    /// The missing prepositions, in blank order.
    pub answer: Vec<String>,
}

impl PrepositionItem {
    pub fn blank_count(&self) -> usize {
        self.tokens.iter().filter(|t| *t == BLANK_MARKER).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrepositionContent {
    pub items: Vec<PrepositionItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SentenceTfItem {
    pub id: String,
    pub passage: String,
    pub claim: String,
    /// Whether the claim is true of the passage.
    pub answer: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SentenceTfContent {
    pub items: Vec<SentenceTfItem>,
}

/// A batch of practice items. Serializes to the bare exercise payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExerciseContent {
    Speech(SpeechContent),
    Prepositions(PrepositionContent),
    SentenceTf(SentenceTfContent),
}

impl ExerciseContent {
    pub fn exercise(&self) -> ExerciseKind {
        match self {
            ExerciseContent::Speech(_) => ExerciseKind::Speech,
            ExerciseContent::Prepositions(_) => ExerciseKind::Prepositions,
            ExerciseContent::SentenceTf(_) => ExerciseKind::SentenceTf,
        }
    }

    /// Number of items (phrases for speech).
    pub fn len(&self) -> usize {
        match self {
            ExerciseContent::Speech(c) => c.phrases.len(),
            ExerciseContent::Prepositions(c) => c.items.len(),
            ExerciseContent::SentenceTf(c) => c.items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode raw provider JSON for the exercise in `params` and validate it.
    pub fn from_json(
        params: &GenerationParams,
        value: serde_json::Value,
    ) -> Result<Self, ContentError> {
        let exercise = params.exercise();
        let content = match exercise {
            ExerciseKind::Speech => ExerciseContent::Speech(decode(exercise, value)?),
            ExerciseKind::Prepositions => ExerciseContent::Prepositions(decode(exercise, value)?),
            ExerciseKind::SentenceTf => ExerciseContent::SentenceTf(decode(exercise, value)?),
        };
        content.validate(params)?;
        Ok(content)
    }

    /// Check the schema invariants against the parameters it was requested with.
    pub fn validate(&self, params: &GenerationParams) -> Result<(), SchemaViolation> {
        if self.exercise() != params.exercise() {
            return Err(SchemaViolation::ExerciseMismatch {
                expected: params.exercise(),
                found: self.exercise(),
            });
        }
        if self.len() < MIN_ITEMS {
            return Err(SchemaViolation::TooFewItems {
                found: self.len(),
                min: MIN_ITEMS,
            });
        }

        match (self, params) {
            (ExerciseContent::Speech(c), _) => {
                for (index, phrase) in c.phrases.iter().enumerate() {
                    require_text(index, "id", &phrase.id)?;
                    require_text(index, "target", &phrase.target)?;
                }
            }
            (ExerciseContent::Prepositions(c), GenerationParams::Prepositions(p)) => {
                for (index, item) in c.items.iter().enumerate() {
                    require_text(index, "id", &item.id)?;
                    if item.tokens.is_empty() {
                        return Err(SchemaViolation::EmptyField {
                            index,
                            field: "tokens",
                        });
                    }
                    let markers = item.blank_count();
                    if markers != p.blanks || item.answer.len() != p.blanks {
                        return Err(SchemaViolation::BlankMismatch {
                            index,
                            markers,
                            answers: item.answer.len(),
                            expected: p.blanks,
                        });
                    }
                    for answer in &item.answer {
                        require_text(index, "answer", answer)?;
                    }
                }
            }
            (ExerciseContent::SentenceTf(c), _) => {
                for (index, item) in c.items.iter().enumerate() {
                    require_text(index, "id", &item.id)?;
                    require_text(index, "passage", &item.passage)?;
                    require_text(index, "claim", &item.claim)?;
                }
            }
            (ExerciseContent::Prepositions(_), other) => {
                return Err(SchemaViolation::ExerciseMismatch {
                    expected: other.exercise(),
                    found: ExerciseKind::Prepositions,
                });
            }
        }
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(
    exercise: ExerciseKind,
    value: serde_json::Value,
) -> Result<T, SchemaViolation> {
    serde_json::from_value(value).map_err(|e| SchemaViolation::Shape {
        exercise,
        message: e.to_string(),
    })
}

fn require_text(index: usize, field: &'static str, value: &str) -> Result<(), SchemaViolation> {
    if value.trim().is_empty() {
        Err(SchemaViolation::EmptyField { index, field })
    } else {
        Ok(())
    }
}
