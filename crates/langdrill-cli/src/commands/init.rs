//! The `langdrill init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("langdrill.toml").exists() {
        println!("langdrill.toml already exists, skipping.");
    } else {
        std::fs::write("langdrill.toml", SAMPLE_CONFIG)?;
        println!("Created langdrill.toml");
    }

    println!("\nNext steps:");
    println!("  1. Set OPENAI_API_KEY, or keep the offline provider");
    println!("  2. Run: langdrill params");
    println!("  3. Run: langdrill serve");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# langdrill configuration

[server]
bind = "0.0.0.0:8000"
database_url = "sqlite://langdrill.db"
cors_origins = ["http://localhost:5173", "http://localhost:8080", "http://127.0.0.1:8080"]
generation_timeout_secs = 30
log_level = "info"

# Offline content needs no network access. To use OpenAI instead:
#
# [provider]
# type = "openai"
# api_key = "${OPENAI_API_KEY}"
# model = "gpt-4o-mini"
[provider]
type = "offline"

[tracker]
alpha = 0.3

[tracker.promotion]
min_attempts = 5
min_accuracy = 0.85
min_streak = 3

[tracker.demotion]
min_attempts = 4
max_accuracy = 0.60

[tracker.thresholds]
speech = [8000.0, 7000.0, 6000.0, 5000.0, 4500.0]
prepositions = [10000.0, 9000.0, 8000.0, 7000.0, 6000.0]
sentence_tf = [12000.0, 10000.0, 9000.0, 8000.0, 8000.0]
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use langdrill_providers::LangdrillConfig;

    #[test]
    fn sample_config_parses_to_defaults() {
        let config: LangdrillConfig = toml_from(SAMPLE_CONFIG);
        assert_eq!(config.tracker, Default::default());
        assert_eq!(config.server.bind, "0.0.0.0:8000");
    }

    fn toml_from(s: &str) -> LangdrillConfig {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("langdrill.toml");
        std::fs::write(&path, s).unwrap();
        langdrill_providers::config::load_config_from(Some(&path)).unwrap()
    }
}
