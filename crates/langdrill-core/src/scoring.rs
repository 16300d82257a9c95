//! Transcript scoring for the speech exercise.
//!
//! A spoken answer is compared with its target on content words only, with
//! a small per-word edit-distance allowance so that recognizer slips such as
//! "mornin" for "morning" still count.

use serde::{Deserialize, Serialize};

use crate::params::Strictness;

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "to", "of", "and", "is", "are", "was", "were", "in", "on", "at", "for",
    "with", "that", "this", "it", "i", "you", "he", "she", "they", "we", "please",
];

/// Outcome of comparing one transcript with its target phrase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeechScore {
    pub accepted: bool,
    /// Fraction of target content words heard, within `0.0..=1.0`.
    pub coverage: f64,
    /// Word error rate over content words.
    pub wer: f64,
}

impl Strictness {
    /// `(min coverage, max WER)` required for acceptance.
    pub fn acceptance(&self) -> (f64, f64) {
        match self {
            Strictness::Lenient => (0.65, 0.6),
            Strictness::Normal => (0.75, 0.5),
            Strictness::Strict => (0.9, 0.25),
        }
    }
}

/// Score `transcript` against `target` at the given strictness.
pub fn score_against_target(transcript: &str, target: &str, strictness: Strictness) -> SpeechScore {
    let expected = content_words(target);
    let heard = content_words(transcript);

    let hits = expected
        .iter()
        .filter(|t| heard.iter().any(|h| near(h, t)))
        .count();
    let coverage = if expected.is_empty() {
        1.0
    } else {
        hits as f64 / expected.len() as f64
    };

    let wer = if expected.is_empty() {
        0.0
    } else {
        edit_distance(&expected, &heard, |a, b| near(a, b)) as f64 / expected.len() as f64
    };

    let (min_coverage, max_wer) = strictness.acceptance();
    SpeechScore {
        accepted: coverage >= min_coverage && wer <= max_wer,
        coverage,
        wer,
    }
}

/// Lowercase, replace punctuation (apostrophes excepted) with spaces, and
/// collapse whitespace.
pub fn normalize(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() || c == '\'' {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn content_words(text: &str) -> Vec<String> {
    normalize(text)
        .split(' ')
        .filter(|w| !w.is_empty() && !STOPWORDS.contains(w))
        .map(str::to_string)
        .collect()
}

fn near(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let allowance = (a.len().min(b.len()) / 3).max(1);
    edit_distance(&a, &b, |x, y| x == y) <= allowance
}

/// Levenshtein distance over arbitrary sequences with a custom match test.
fn edit_distance<T>(a: &[T], b: &[T], same: impl Fn(&T, &T) -> bool) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, x) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, y) in b.iter().enumerate() {
            let cost = if same(x, y) { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_punctuation() {
        assert_eq!(normalize("  Where's the   BATHROOM?! "), "where's the bathroom");
    }

    #[test]
    fn exact_match_accepted_at_every_level() {
        for strictness in [Strictness::Lenient, Strictness::Normal, Strictness::Strict] {
            let score = score_against_target("I need help", "I need help", strictness);
            assert!(score.accepted);
            assert_eq!(score.coverage, 1.0);
            assert_eq!(score.wer, 0.0);
        }
    }

    #[test]
    fn small_misrecognition_counts_as_hit() {
        let score = score_against_target("good mornin", "Good morning", Strictness::Strict);
        assert_eq!(score.coverage, 1.0);
        assert!(score.accepted);
    }

    #[test]
    fn missing_word_fails_strict_but_passes_lenient() {
        // Content words: would, like, water. One of three missing.
        let target = "I would like water";
        let transcript = "would like";
        let strict = score_against_target(transcript, target, Strictness::Strict);
        assert!(!strict.accepted);
        let lenient = score_against_target(transcript, target, Strictness::Lenient);
        assert!((lenient.coverage - 2.0 / 3.0).abs() < 1e-9);
        assert!(lenient.accepted);
    }

    #[test]
    fn unrelated_transcript_rejected() {
        let score = score_against_target("banana", "Open the window", Strictness::Lenient);
        assert!(!score.accepted);
        assert_eq!(score.coverage, 0.0);
    }

    #[test]
    fn stopword_only_target_is_trivially_accepted() {
        let score = score_against_target("", "it is", Strictness::Strict);
        assert!(score.accepted);
        assert_eq!(score.wer, 0.0);
    }

    #[test]
    fn edit_distance_basics() {
        let a: Vec<char> = "kitten".chars().collect();
        let b: Vec<char> = "sitting".chars().collect();
        assert_eq!(edit_distance(&a, &b, |x, y| x == y), 3);
        assert_eq!(edit_distance::<char>(&[], &b, |x, y| x == y), 7);
    }
}
