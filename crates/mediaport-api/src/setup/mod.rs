//! Application setup and initialization
//!
//! Startup order: validate configuration, telemetry, database, storage,
//! bundle registry, broker, state, routes. Any failure aborts startup.

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;
pub mod validation;

use crate::state::AppState;
use anyhow::{Context, Result};
use mediaport_core::bundles::BundleRegistry;
use mediaport_core::Config;
use mediaport_db::PgDatabase;
use mediaport_infra::{BrokerClient, BrokerEventListener};
use mediaport_processing::MetadataProviders;
use mediaport_storage::ContentStore;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    validation::validate_config(&config).context("Configuration validation failed")?;

    mediaport_infra::init_telemetry(&config.environment)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!(
        environment = %config.environment,
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;
    let (storage, derivatives) = storage::setup_storage(&config).await?;
    let bundles = setup_bundles(&config, &storage)?;

    let mut state = AppState::new(
        &config,
        Arc::new(PgDatabase::new(pool)),
        storage,
        derivatives,
        bundles,
    );

    if config.broker.enabled {
        let client = Arc::new(
            BrokerClient::new(&config.broker).context("Failed to configure broker client")?,
        );
        tracing::info!(
            broker = %client.address(),
            queue = %config.broker.queue,
            "Media update notifications enabled"
        );
        let listener = BrokerEventListener::new(
            client.clone(),
            state.urls.clone(),
            config.broker.queue.clone(),
        );
        state = state
            .with_events(Arc::new(listener))
            .with_broker(client);
    }

    let state = Arc::new(state);
    let router = routes::setup_routes(&config, state.clone()).await?;

    Ok((state, router))
}

/// Load the bundle registry and check every source plugin is known.
fn setup_bundles(config: &Config, storage: &Arc<dyn ContentStore>) -> Result<Arc<BundleRegistry>> {
    let registry = BundleRegistry::from_path(&config.bundles_config_path).with_context(|| {
        format!(
            "Failed to load bundle configuration from {}",
            config.bundles_config_path.display()
        )
    })?;

    let providers = MetadataProviders::with_defaults(storage.clone());
    for (name, bundle) in registry.iter() {
        if !providers.contains(&bundle.source_plugin) {
            return Err(anyhow::anyhow!(
                "Bundle {} uses unknown source plugin {}",
                name,
                bundle.source_plugin
            ));
        }
    }

    tracing::info!(bundles = registry.len(), "Bundle configuration loaded");
    Ok(Arc::new(registry))
}
