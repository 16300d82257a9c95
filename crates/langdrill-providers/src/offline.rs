//! Offline content provider.
//!
//! Builds practice items from fixed word banks with a seedable RNG. Every
//! batch it returns satisfies the exercise schema: exact item count, no
//! empty fields, and exactly the requested number of blanks per sentence.

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use langdrill_core::content::{
    ExerciseContent, PrepositionContent, PrepositionItem, SentenceTfContent, SentenceTfItem,
    SpeechContent, SpeechPhrase, BLANK_MARKER, MIN_ITEMS,
};
use langdrill_core::error::ContentError;
use langdrill_core::params::{
    GenerationParams, PrepositionParams, SentenceTfParams, SpeechParams, PREPOSITIONS,
};
use langdrill_core::traits::{ContentProvider, ContentRequest};

const PHRASES: &[&str] = &[
    "Good morning",
    "I need help",
    "Where is the bathroom",
    "Please call my friend",
    "I would like water",
    "That hurts",
    "I feel tired",
    "Open the window",
    "Turn on the light please",
    "Can you say that again slowly",
];

/// One sentence fragment with a single preposition slot.
struct Clause {
    before: &'static [&'static str],
    answer: &'static str,
    after: &'static [&'static str],
}

const CLAUSES: &[Clause] = &[
    Clause { before: &["the", "book", "is"], answer: "on", after: &["the", "table"] },
    Clause { before: &["the", "keys", "are"], answer: "in", after: &["the", "bag"] },
    Clause { before: &["we", "meet"], answer: "at", after: &["noon"] },
    Clause { before: &["the", "cat", "hides"], answer: "under", after: &["the", "bed"] },
    Clause { before: &["a", "lamp", "hangs"], answer: "over", after: &["the", "desk"] },
    Clause { before: &["the", "shop", "is"], answer: "between", after: &["the", "bank", "and", "the", "school"] },
    Clause { before: &["the", "dog", "waits"], answer: "behind", after: &["the", "door"] },
    Clause { before: &["my", "coat", "is"], answer: "in", after: &["the", "closet"] },
    Clause { before: &["the", "cup", "sits"], answer: "on", after: &["the", "shelf"] },
    Clause { before: &["she", "arrives"], answer: "at", after: &["the", "station"] },
];

/// A short scene with claims of each kind.
struct Scene {
    lead: &'static str,
    follow: &'static str,
    literal: [(&'static str, bool); 2],
    inferred: (&'static str, bool),
    negated: (&'static str, bool),
}

const SCENES: &[Scene] = &[
    Scene {
        lead: "The cat slept on the rug by the window.",
        follow: "The room was quiet.",
        literal: [("The cat slept outside.", false), ("The cat slept on the rug.", true)],
        inferred: ("The cat was resting.", true),
        negated: ("The cat did not sleep on the rug.", false),
    },
    Scene {
        lead: "Maria put the keys in her red bag and left the house.",
        follow: "She locked the door behind her.",
        literal: [("Maria put the keys in her pocket.", false), ("Maria's bag is red.", true)],
        inferred: ("Maria is still at home.", false),
        negated: ("Maria did not take her keys.", false),
    },
    Scene {
        lead: "It rained all morning but the sun came out in the afternoon.",
        follow: "The children went to the park after lunch.",
        literal: [("The afternoon was sunny.", true), ("It was sunny all day.", false)],
        inferred: ("The ground was wet in the morning.", true),
        negated: ("It did not rain in the morning.", false),
    },
    Scene {
        lead: "Tom bought bread and milk at the corner shop.",
        follow: "He paid with cash.",
        literal: [("Tom bought milk.", true), ("Tom bought eggs.", false)],
        inferred: ("Tom went shopping for food.", true),
        negated: ("Tom did not buy bread.", false),
    },
];

/// Generates schema-valid content locally.
///
/// A provider built with [`OfflineProvider::seeded`] yields the same sequence
/// of batches for the same sequence of requests.
pub struct OfflineProvider {
    rng: Mutex<ChaCha8Rng>,
}

impl OfflineProvider {
    /// A provider seeded from the thread RNG.
    pub fn new() -> Self {
        Self::seeded(rand::random())
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Build one batch for `params` without going through the trait.
    pub fn synthesize(&self, params: &GenerationParams) -> ExerciseContent {
        let mut rng = self.rng.lock();
        match params {
            GenerationParams::Speech(p) => ExerciseContent::Speech(speech(&mut *rng, p)),
            GenerationParams::Prepositions(p) => {
                ExerciseContent::Prepositions(prepositions(&mut *rng, p))
            }
            GenerationParams::SentenceTf(p) => ExerciseContent::SentenceTf(sentence_tf(&mut *rng, p)),
        }
    }
}

impl Default for OfflineProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn batch_size(count: usize) -> usize {
    count.max(MIN_ITEMS)
}

fn speech<R: Rng>(rng: &mut R, params: &SpeechParams) -> SpeechContent {
    let max_words = params.max_words.max(1);
    let phrases = (0..batch_size(params.count))
        .map(|i| {
            let phrase = PHRASES[rng.gen_range(0..PHRASES.len())];
            SpeechPhrase {
                id: format!("s{i}"),
                target: phrase
                    .split_whitespace()
                    .take(max_words)
                    .collect::<Vec<_>>()
                    .join(" "),
            }
        })
        .collect();
    SpeechContent { phrases }
}

fn prepositions<R: Rng>(rng: &mut R, params: &PrepositionParams) -> PrepositionContent {
    let mut usable: Vec<&Clause> = CLAUSES
        .iter()
        .filter(|c| params.allowed.iter().any(|a| a == c.answer))
        .collect();
    // A bad allow-list must not starve the generator of clauses.
    if usable.len() < params.blanks {
        usable = CLAUSES
            .iter()
            .filter(|c| PREPOSITIONS[..4].contains(&c.answer))
            .collect();
    }

    let items = (0..batch_size(params.count))
        .map(|i| {
            usable.shuffle(rng);
            let mut tokens = Vec::new();
            let mut answer = Vec::new();
            for (n, clause) in usable.iter().cycle().take(params.blanks).enumerate() {
                if n > 0 {
                    tokens.push("and".to_string());
                }
                tokens.extend(clause.before.iter().map(|t| t.to_string()));
                tokens.push(BLANK_MARKER.to_string());
                tokens.extend(clause.after.iter().map(|t| t.to_string()));
                answer.push(clause.answer.to_string());
            }
            if let Some(first) = tokens.first_mut() {
                *first = capitalize(first);
            }
            PrepositionItem {
                id: format!("p{i}"),
                tokens,
                answer,
            }
        })
        .collect();
    PrepositionContent { items }
}

fn sentence_tf<R: Rng>(rng: &mut R, params: &SentenceTfParams) -> SentenceTfContent {
    let items = (0..batch_size(params.count))
        .map(|i| {
            let scene = &SCENES[rng.gen_range(0..SCENES.len())];
            let passage = if params.sentences >= 2 {
                format!("{} {}", scene.lead, scene.follow)
            } else {
                scene.lead.to_string()
            };
            let (claim, answer) = if params.negation && rng.gen_bool(1.0 / 3.0) {
                scene.negated
            } else if params.inference && rng.gen_bool(0.5) {
                scene.inferred
            } else {
                scene.literal[rng.gen_range(0..scene.literal.len())]
            };
            SentenceTfItem {
                id: format!("t{i}"),
                passage,
                claim: claim.to_string(),
                answer,
            }
        })
        .collect();
    SentenceTfContent { items }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[async_trait]
impl ContentProvider for OfflineProvider {
    fn name(&self) -> &str {
        "offline"
    }

    async fn generate(&self, request: &ContentRequest) -> Result<ExerciseContent, ContentError> {
        let content = self.synthesize(&request.params);
        content.validate(&request.params)?;
        Ok(content)
    }
}
