//! Mediaport Processing Library
//!
//! Field-level validation of incoming content and the source plugins that
//! report metadata (dimensions, MIME type, size) for stored files.

pub mod metadata;
pub mod validator;

pub use metadata::{FileMetadataProvider, ImageMetadataProvider, MetadataProviders};
pub use validator::{file_extension, validate_extension, ValidationError};
