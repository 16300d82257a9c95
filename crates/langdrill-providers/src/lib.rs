//! langdrill-providers: Content provider integrations.
//!
//! Implements the `ContentProvider` trait for an OpenAI-compatible chat
//! backend and for an offline generator that needs no network access.

pub mod config;
pub mod offline;
pub mod openai;

pub use config::{
    create_provider, load_config, load_config_from, LangdrillConfig, ProviderConfig, ServerConfig,
};
pub use offline::OfflineProvider;
pub use openai::OpenAiProvider;
