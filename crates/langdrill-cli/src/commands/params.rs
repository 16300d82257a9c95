//! The `langdrill params` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use langdrill_core::model::{ExerciseKind, MAX_LEVEL, MIN_LEVEL};
use langdrill_core::params::{derive_params, GenerationParams};
use langdrill_providers::load_config_from;

pub fn execute(exercise: Option<ExerciseKind>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let exercises: Vec<ExerciseKind> = match exercise {
        Some(e) => vec![e],
        None => ExerciseKind::ALL.to_vec(),
    };

    for exercise in exercises {
        let mut table = Table::new();
        table.set_header(vec!["Level", "Max latency", "Items", "Parameters"]);
        for level in MIN_LEVEL..=MAX_LEVEL {
            let params = derive_params(exercise, level);
            table.add_row(vec![
                Cell::new(level),
                Cell::new(format!(
                    "{:.0}ms",
                    config.tracker.thresholds.max_latency_ms(exercise, level)
                )),
                Cell::new(params.count()),
                Cell::new(describe(&params)),
            ]);
        }
        println!("{exercise}\n{table}\n");
    }

    Ok(())
}

pub(crate) fn describe(params: &GenerationParams) -> String {
    match params {
        GenerationParams::Speech(p) => {
            format!("strictness={}, max_words={}", p.strictness, p.max_words)
        }
        GenerationParams::Prepositions(p) => {
            format!("blanks={}, allowed=[{}]", p.blanks, p.allowed.join(", "))
        }
        GenerationParams::SentenceTf(p) => format!(
            "sentences={}, inference={}, negation={}",
            p.sentences, p.inference, p.negation
        ),
    }
}
