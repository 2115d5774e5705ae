//! Mediaport Core Library
//!
//! Domain models, error types, configuration and the collaborator traits
//! shared by every mediaport crate.

pub mod bundles;
pub mod config;
pub mod error;
pub mod hooks;
pub mod models;
pub mod urls;

// Re-export commonly used types
pub use bundles::{BundleConfig, BundleRegistry, FieldConfig, FieldKind};
pub use config::{BrokerConfig, Config};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use hooks::{
    AccessPolicy, Actor, MediaEvent, MediaEventListener, MetadataProvider, NoOpMediaEventListener,
    OwnerOrRoleAccessPolicy,
};
pub use urls::UrlBuilder;
