//! The `langdrill serve` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use langdrill_core::engine::{DrillEngine, EngineConfig};
use langdrill_core::tracker::SkillTracker;
use langdrill_core::traits::ContentProvider;
use langdrill_providers::{create_provider, load_config_from, ProviderConfig};
use langdrill_server::{create_app, serve, AppState};

pub async fn execute(
    config_path: Option<PathBuf>,
    bind: Option<String>,
    database_url: Option<String>,
    offline: bool,
) -> Result<()> {
    let mut config = load_config_from(config_path.as_deref())?;
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    if let Some(url) = database_url {
        config.server.database_url = url;
    }
    if offline {
        config.provider = ProviderConfig::Offline { seed: None };
    }

    crate::init_tracing(&config.server.log_level);
    tracing::debug!(?config, "configuration loaded");

    let store = langdrill_store::open(&config.server.database_url)
        .await
        .with_context(|| format!("failed to open store at {}", config.server.database_url))?;
    let provider: Arc<dyn ContentProvider> = Arc::from(create_provider(&config.provider)?);

    let engine = DrillEngine::new(
        store,
        provider,
        SkillTracker::new(Arc::new(config.tracker.clone())),
        EngineConfig {
            generation_timeout: config.server.generation_timeout(),
        },
    );
    let provider_name = engine.provider_name().to_string();
    let app = create_app(AppState::new(Arc::new(engine)), &config.server.cors_origins);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, provider = %provider_name, "langdrill listening");

    serve(listener, app, shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
