//! Derived-artifact cache invalidation.
//!
//! Resized previews are cached on disk as `<styles root>/<style>/<scheme>/<path>`.
//! After content at a location changes, every style's copy is removed so the
//! next request regenerates it from the new bytes.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

use crate::location::Location;
use crate::traits::{StorageError, StorageResult};

#[async_trait]
pub trait DerivativeCache: Send + Sync {
    /// Remove every cached derivative of `location`; returns how many were removed.
    async fn flush(&self, location: &Location) -> StorageResult<usize>;
}

pub struct NoOpDerivativeCache;

#[async_trait]
impl DerivativeCache for NoOpDerivativeCache {
    async fn flush(&self, _location: &Location) -> StorageResult<usize> {
        Ok(0)
    }
}

#[derive(Debug, Clone)]
pub struct LocalDerivativeCache {
    styles_root: PathBuf,
}

impl LocalDerivativeCache {
    pub fn new(styles_root: impl Into<PathBuf>) -> Self {
        LocalDerivativeCache {
            styles_root: styles_root.into(),
        }
    }
}

#[async_trait]
impl DerivativeCache for LocalDerivativeCache {
    async fn flush(&self, location: &Location) -> StorageResult<usize> {
        let mut styles = match fs::read_dir(&self.styles_root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(StorageError::IoError(e)),
        };

        let mut removed = 0;
        while let Some(entry) = styles.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let derivative = entry
                .path()
                .join(location.scheme())
                .join(location.path());
            match fs::remove_file(&derivative).await {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(
                        path = %derivative.display(),
                        error = %e,
                        "Failed to remove cached derivative"
                    );
                }
            }
        }

        tracing::debug!(location = %location, removed = removed, "Derivative cache flushed");
        Ok(removed)
    }
}
