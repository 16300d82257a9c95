//! The `langdrill simulate` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::Utc;
use comfy_table::{Cell, Table};

use langdrill_core::model::{clamp_level, ExerciseKind, Progress};
use langdrill_core::tracker::{SkillTracker, Transition};
use langdrill_providers::load_config_from;

fn parse_answers(answers: &str) -> Result<Vec<bool>> {
    let parsed = answers
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .map(|c| match c {
            '1' | 'y' | 'Y' => Ok(true),
            '0' | 'n' | 'N' => Ok(false),
            other => Err(anyhow::anyhow!("invalid answer '{other}', use 1 or 0")),
        })
        .collect::<Result<Vec<_>>>()?;
    if parsed.is_empty() {
        bail!("no answers given");
    }
    Ok(parsed)
}

pub fn execute(
    exercise: ExerciseKind,
    answers: &str,
    latency_ms: Option<u64>,
    level: u8,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let answers = parse_answers(answers)?;
    let config = load_config_from(config_path.as_deref())?;
    let tracker = SkillTracker::new(Arc::new(config.tracker));

    let mut progress = Progress::new("simulation", exercise, Utc::now());
    progress.level = clamp_level(i64::from(level));

    let mut table = Table::new();
    table.set_header(vec![
        "#", "Answer", "Level", "Accuracy", "Latency", "Streak", "Change",
    ]);

    for (i, correct) in answers.into_iter().enumerate() {
        let transition = tracker.record_attempt(&mut progress, correct, latency_ms, Utc::now());
        let change = match transition {
            Transition::Unchanged => String::new(),
            other => other.to_string(),
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(if correct { "correct" } else { "wrong" }),
            Cell::new(progress.level),
            Cell::new(format!("{:.3}", progress.ema_accuracy)),
            Cell::new(format!("{:.0}ms", progress.ema_latency_ms)),
            Cell::new(progress.streak),
            Cell::new(change),
        ]);
    }

    println!("{table}");
    println!("final level: {}", progress.level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_separators() {
        assert_eq!(parse_answers("1, 0 y n").unwrap(), vec![true, false, true, false]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_answers("10x").is_err());
        assert!(parse_answers("  ").is_err());
    }
}
