//! Keel repository sync daemon.

use std::path::PathBuf;

use anyhow::Context;
use keel_sync::{SyncConfig, build_syncers, default_registry};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_CONFIG: &str = "keel.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Config path: first argument, then KEEL_CONFIG, then ./keel.json
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("KEEL_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    let config = SyncConfig::load(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    let registry = default_registry();
    let syncers = build_syncers(&config, &registry)?;

    info!(
        "Syncing {} repositories into {}",
        syncers.len(),
        config.data_dir().display()
    );

    let handles: Vec<_> = syncers.into_iter().map(|syncer| syncer.start()).collect();

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    for handle in handles {
        handle.shutdown().await;
    }

    Ok(())
}
