//! Mediaport Storage Library
//!
//! Content store abstraction and the local filesystem backend.
//!
//! # Locations
//!
//! Stored content is addressed by a location of the form `scheme://path`,
//! for example `public://2024-05/photo.jpg`. Each scheme maps to a root
//! directory. Paths must be relative and must not contain `..` segments.
//! The location is the stable identity of stored bytes: replacing content
//! rewrites the same location.

pub mod derivatives;
pub mod local;
pub mod location;
pub mod traits;

// Re-export commonly used types
pub use derivatives::{DerivativeCache, LocalDerivativeCache, NoOpDerivativeCache};
pub use local::LocalStorage;
pub use location::Location;
pub use traits::{ByteReader, ContentStore, StorageError, StorageResult};
