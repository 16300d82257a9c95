//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn langdrill() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("langdrill").unwrap();
    cmd.env_remove("OPENAI_API_KEY")
        .env_remove("LANGDRILL_OPENAI_KEY")
        .env("LANGDRILL_OFFLINE", "1");
    cmd
}

#[test]
fn help_output() {
    langdrill()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("language rehabilitation drills"));
}

#[test]
fn version_output() {
    langdrill()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("langdrill"));
}

#[test]
fn params_table_for_prepositions() {
    let dir = TempDir::new().unwrap();
    langdrill()
        .current_dir(dir.path())
        .args(["params", "--exercise", "prepositions"])
        .assert()
        .success()
        .stdout(predicate::str::contains("blanks=1, allowed=[in, on, at, under]"))
        .stdout(predicate::str::contains("behind"))
        .stdout(predicate::str::contains("speech").not());
}

#[test]
fn params_rejects_unknown_exercise() {
    langdrill()
        .args(["params", "--exercise", "juggling"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown exercise"));
}

#[test]
fn simulate_promotes_on_sixth_correct_answer() {
    let dir = TempDir::new().unwrap();
    langdrill()
        .current_dir(dir.path())
        .args([
            "simulate",
            "--exercise",
            "speech",
            "--answers",
            "111111",
            "--latency-ms",
            "1500",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("promoted 1 -> 2"))
        .stdout(predicate::str::contains("final level: 2"));
}

#[test]
fn simulate_demotes_after_misses() {
    let dir = TempDir::new().unwrap();
    langdrill()
        .current_dir(dir.path())
        .args([
            "simulate",
            "--exercise",
            "prepositions",
            "--answers",
            "0000",
            "--level",
            "3",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("demoted 3 -> 2"))
        .stdout(predicate::str::contains("final level: 2"));
}

#[test]
fn simulate_rejects_bad_answers() {
    langdrill()
        .args(["simulate", "--exercise", "speech", "--answers", "1x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn preview_offline_is_reproducible() {
    let dir = TempDir::new().unwrap();
    let run = || {
        langdrill()
            .current_dir(dir.path())
            .args([
                "preview",
                "--exercise",
                "sentence_tf",
                "--level",
                "4",
                "--seed",
                "11",
            ])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone()
    };

    let first = run();
    assert_eq!(first, run());

    let value: serde_json::Value = serde_json::from_slice(&first).unwrap();
    assert_eq!(value["provider"], "offline");
    assert_eq!(value["params"]["sentences"], 2);
    assert_eq!(value["content"]["items"].as_array().unwrap().len(), 5);
}

#[test]
fn score_accepts_matching_transcript() {
    langdrill()
        .args([
            "score",
            "--transcript",
            "could you help me please",
            "--target",
            "Could you help me, please?",
        ])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("accepted"));
}

#[test]
fn score_rejects_unknown_strictness() {
    langdrill()
        .args(["score", "--transcript", "a", "--target", "b", "--strictness", "harsh"])
        .assert()
        .failure();
}

#[test]
fn init_creates_config() {
    let dir = TempDir::new().unwrap();

    langdrill()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created langdrill.toml"));
    assert!(dir.path().join("langdrill.toml").exists());

    langdrill()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn serve_fails_cleanly_on_bad_bind_address() {
    let dir = TempDir::new().unwrap();
    langdrill()
        .current_dir(dir.path())
        .args([
            "serve",
            "--bind",
            "not-an-address",
            "--database-url",
            "memory://",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to bind"));
}
