//! Application state shared by every handler.

use mediaport_core::bundles::BundleRegistry;
use mediaport_core::{
    AccessPolicy, Config, MediaEventListener, NoOpMediaEventListener, OwnerOrRoleAccessPolicy,
    UrlBuilder,
};
use mediaport_db::Database;
use mediaport_infra::BrokerClient;
use mediaport_processing::MetadataProviders;
use mediaport_services::{IngestionService, MediaRecords};
use mediaport_storage::{ContentStore, DerivativeCache};
use std::sync::Arc;

/// Built once at startup and shared as `Arc<AppState>`.
pub struct AppState {
    pub database: Arc<dyn Database>,
    pub storage: Arc<dyn ContentStore>,
    pub bundles: Arc<BundleRegistry>,
    pub ingestion: IngestionService,
    pub access_policy: Arc<dyn AccessPolicy>,
    pub events: Arc<dyn MediaEventListener>,
    pub urls: UrlBuilder,
    pub environment: String,
    /// Set when publishing to a message broker is enabled; disconnected on shutdown.
    pub broker: Option<Arc<BrokerClient>>,
}

impl AppState {
    pub fn new(
        config: &Config,
        database: Arc<dyn Database>,
        storage: Arc<dyn ContentStore>,
        derivatives: Arc<dyn DerivativeCache>,
        bundles: Arc<BundleRegistry>,
    ) -> Self {
        let providers = MetadataProviders::with_defaults(storage.clone());
        let media = MediaRecords::new(bundles.clone(), providers);
        let ingestion = IngestionService::new(storage.clone(), derivatives, bundles.clone(), media);

        Self {
            database,
            storage,
            bundles,
            ingestion,
            access_policy: Arc::new(OwnerOrRoleAccessPolicy::new(
                config.privileged_roles.clone(),
            )),
            events: Arc::new(NoOpMediaEventListener),
            urls: UrlBuilder::new(&config.public_base_url, &config.storage_public_url),
            environment: config.environment.clone(),
            broker: None,
        }
    }

    pub fn with_events(mut self, events: Arc<dyn MediaEventListener>) -> Self {
        self.events = events;
        self
    }

    pub fn with_broker(mut self, broker: Arc<BrokerClient>) -> Self {
        self.broker = Some(broker);
        self
    }
}
