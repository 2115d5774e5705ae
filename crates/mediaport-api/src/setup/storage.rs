//! Content store and derivative cache setup

use anyhow::{Context, Result};
use mediaport_core::Config;
use mediaport_storage::{
    ContentStore, DerivativeCache, LocalDerivativeCache, LocalStorage, NoOpDerivativeCache,
};
use std::sync::Arc;

pub async fn setup_storage(
    config: &Config,
) -> Result<(Arc<dyn ContentStore>, Arc<dyn DerivativeCache>)> {
    let storage = LocalStorage::new(config.storage_schemes.clone())
        .await
        .context("Failed to initialize local storage")?;

    tracing::info!(
        schemes = %config
            .storage_schemes
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(","),
        "Local storage initialized"
    );

    let derivatives: Arc<dyn DerivativeCache> = match config.derivative_styles_root() {
        Some(root) => {
            tracing::info!(styles_root = %root.display(), "Derivative cache flushing enabled");
            Arc::new(LocalDerivativeCache::new(root))
        }
        None => {
            tracing::warn!("No derivative styles root configured, derivative cache flushing disabled");
            Arc::new(NoOpDerivativeCache)
        }
    };

    Ok((Arc::new(storage), derivatives))
}
