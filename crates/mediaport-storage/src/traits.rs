//! Content store abstraction
//!
//! This module defines the [`ContentStore`] trait that all storage backends
//! implement, and the error type they report.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use mediaport_core::AppError;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

use crate::location::Location;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("Unknown storage scheme: {0}")]
    UnknownScheme(String),

    #[error("No bytes were copied to {location}")]
    Empty { location: String },

    #[error("The destination directory does not exist, could not be created, or is not writable: {0}")]
    DirectoryUnavailable(String),

    #[error("File {location} could not be opened to write: {source}")]
    OpenFailed {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Request body could not be copied to {location}: {source}")]
    CopyFailed {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Request body handed to [`ContentStore::write_stream`].
pub type ByteReader = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// Byte store addressed by [`Location`].
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Parse `raw` and check that its scheme is served by this store.
    fn resolve(&self, raw: &str) -> StorageResult<Location>;

    /// Create the parent directory of `location` and make sure it is writable.
    async fn prepare_directory(&self, location: &Location) -> StorageResult<()>;

    /// Copy `reader` to `location`, truncating previous content, and return
    /// the number of bytes written.
    ///
    /// A stream that yields no bytes leaves nothing behind and fails with
    /// [`StorageError::Empty`]. A failure part way through the copy leaves
    /// the destination in an indeterminate state.
    async fn write_stream(&self, location: &Location, reader: ByteReader) -> StorageResult<u64>;

    /// Read at most `limit` bytes from the start of `location`.
    async fn read_head(&self, location: &Location, limit: usize) -> StorageResult<Vec<u8>>;

    async fn read_stream(
        &self,
        location: &Location,
    ) -> StorageResult<Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>>;

    async fn exists(&self, location: &Location) -> StorageResult<bool>;

    /// Delete content at `location`; missing content is not an error.
    async fn delete(&self, location: &Location) -> StorageResult<()>;
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidLocation(_)
            | StorageError::UnknownScheme(_)
            | StorageError::Empty { .. } => AppError::BadRequest(err.to_string()),
            StorageError::NotFound(_) => AppError::NotFound(err.to_string()),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}
