//! mindvault - HTTP Server Entry Point
//!
//! Starts the HTTP server that exposes the ingestion API.

use mindvault::{api, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mindvault=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Loaded configuration: model={}, store_enabled={}",
        config.analyzer.model,
        config.store.is_enabled()
    );

    // Start HTTP server
    api::serve(config).await?;

    Ok(())
}
