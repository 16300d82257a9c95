//! The `langdrill score` command.

use anyhow::Result;

use langdrill_core::params::Strictness;
use langdrill_core::scoring::score_against_target;

pub fn execute(transcript: &str, target: &str, strictness: Strictness) -> Result<()> {
    let score = score_against_target(transcript, target, strictness);
    println!(
        "{} (coverage {:.0}%, WER {:.0}%, {strictness})",
        if score.accepted { "accepted" } else { "rejected" },
        score.coverage * 100.0,
        score.wer * 100.0,
    );
    Ok(())
}
