//! The `langdrill preview` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use langdrill_core::model::ExerciseKind;
use langdrill_core::params::derive_params;
use langdrill_core::traits::ContentRequest;
use langdrill_providers::{create_provider, load_config_from, ProviderConfig};

pub async fn execute(
    exercise: ExerciseKind,
    level: u8,
    seed: Option<u64>,
    offline: bool,
    topic: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config_from(config_path.as_deref())?;
    if offline || seed.is_some() {
        config.provider = ProviderConfig::Offline { seed };
    }
    let provider = create_provider(&config.provider)?;

    let params = derive_params(exercise, level);
    let mut request = ContentRequest::new(params.clone());
    if let Some(topic) = topic {
        request
            .options
            .insert("topic".into(), serde_json::Value::String(topic));
    }

    let content = tokio::time::timeout(
        config.server.generation_timeout(),
        provider.generate(&request),
    )
    .await
    .context("content generation timed out")?
    .with_context(|| format!("{} provider failed", provider.name()))?;

    let output = serde_json::json!({
        "provider": provider.name(),
        "params": params,
        "content": content,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
