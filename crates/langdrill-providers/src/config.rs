//! Service configuration and provider factory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use langdrill_core::thresholds::TrackerConfig;
use langdrill_core::traits::ContentProvider;

use crate::offline::OfflineProvider;
use crate::openai::{OpenAiProvider, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};

/// Which content source serves `/next`.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default = "default_model")]
        model: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    Offline {
        #[serde(default)]
        seed: Option<u64>,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                model,
                timeout_secs,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("model", model)
                .field("timeout_secs", timeout_secs)
                .finish(),
            ProviderConfig::Offline { seed } => {
                f.debug_struct("Offline").field("seed", seed).finish()
            }
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Offline { seed: None }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// HTTP listener and persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP server binds to.
    pub bind: String,
    /// sqlx connection URL; `sqlite::memory:` keeps everything in process.
    pub database_url: String,
    /// Allowed CORS origins. `*` allows any origin.
    pub cors_origins: Vec<String>,
    /// Upper bound on one content generation call.
    pub generation_timeout_secs: u64,
    /// Default filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            database_url: "sqlite://langdrill.db".to_string(),
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:8080".to_string(),
                "http://127.0.0.1:8080".to_string(),
            ],
            generation_timeout_secs: 30,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }
}

/// Top-level langdrill configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LangdrillConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_provider_config(config: ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            model,
            timeout_secs,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(&api_key),
            base_url: base_url.as_deref().map(resolve_env_vars),
            model,
            timeout_secs,
        },
        offline @ ProviderConfig::Offline { .. } => offline,
    }
}

/// Apply environment overrides on top of a parsed config.
///
/// `lookup` is `std::env::var` in production; tests pass a map.
fn apply_env_overrides<F>(config: &mut LangdrillConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("LANGDRILL_DATABASE_URL") {
        config.server.database_url = url;
    }
    if let Some(bind) = lookup("LANGDRILL_BIND") {
        config.server.bind = bind;
    }

    let key = lookup("LANGDRILL_OPENAI_KEY")
        .or_else(|| lookup("OPENAI_API_KEY"))
        .filter(|k| !k.trim().is_empty());
    if let Some(key) = key {
        match &mut config.provider {
            ProviderConfig::OpenAI { api_key, .. } => *api_key = key,
            ProviderConfig::Offline { .. } => {
                config.provider = ProviderConfig::OpenAI {
                    api_key: key,
                    base_url: None,
                    model: default_model(),
                    timeout_secs: default_timeout_secs(),
                };
            }
        }
    }

    let offline = lookup("LANGDRILL_OFFLINE")
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(false);
    if offline && !matches!(config.provider, ProviderConfig::Offline { .. }) {
        config.provider = ProviderConfig::Offline { seed: None };
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `langdrill.toml` in the current directory
/// 2. `~/.config/langdrill/config.toml`
///
/// Environment variable overrides: `LANGDRILL_OPENAI_KEY` (or `OPENAI_API_KEY`),
/// `LANGDRILL_OFFLINE`, `LANGDRILL_DATABASE_URL`, `LANGDRILL_BIND`.
pub fn load_config() -> Result<LangdrillConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<LangdrillConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("langdrill.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => read_config_file(&path)?,
        None => LangdrillConfig::default(),
    };

    apply_env_overrides(&mut config, |k| std::env::var(k).ok());
    config.provider = resolve_provider_config(config.provider);

    Ok(config)
}

fn read_config_file(path: &Path) -> Result<LangdrillConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let config = toml::from_str::<LangdrillConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))?;
    config
        .tracker
        .validate()
        .with_context(|| format!("invalid [tracker] section in {}", path.display()))?;
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("langdrill"))
}

/// Create a provider instance from its configuration.
///
/// An OpenAI entry without a usable key degrades to the offline generator so
/// the service keeps serving drills.
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn ContentProvider>> {
    match config {
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            model,
            timeout_secs,
        } => {
            if api_key.trim().is_empty() {
                tracing::warn!("no OpenAI API key configured, using offline content");
                return Ok(Box::new(OfflineProvider::new()));
            }
            let provider = OpenAiProvider::new(
                api_key,
                base_url.clone(),
                Some(model.clone()),
                Duration::from_secs(*timeout_secs),
            )?;
            Ok(Box::new(provider))
        }
        ProviderConfig::Offline { seed: Some(seed) } => {
            Ok(Box::new(OfflineProvider::seeded(*seed)))
        }
        ProviderConfig::Offline { seed: None } => Ok(Box::new(OfflineProvider::new())),
    }
}
