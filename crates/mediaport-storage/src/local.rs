use crate::location::Location;
use crate::traits::{ByteReader, ContentStore, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use futures::StreamExt;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Local filesystem content store. Each scheme maps to a root directory.
#[derive(Clone)]
pub struct LocalStorage {
    roots: BTreeMap<String, PathBuf>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance, creating every scheme root.
    ///
    /// # Arguments
    /// * `roots` - scheme name to root directory (e.g. `public` -> "/var/lib/mediaport/public")
    pub async fn new(roots: BTreeMap<String, PathBuf>) -> StorageResult<Self> {
        if roots.is_empty() {
            return Err(StorageError::ConfigError(
                "At least one storage scheme is required".to_string(),
            ));
        }

        for (scheme, root) in &roots {
            fs::create_dir_all(root).await.map_err(|e| {
                StorageError::ConfigError(format!(
                    "Failed to create storage directory {} for scheme {}: {}",
                    root.display(),
                    scheme,
                    e
                ))
            })?;
        }

        let roots = roots
            .into_iter()
            .map(|(scheme, root)| (scheme.to_lowercase(), root))
            .collect();

        Ok(LocalStorage { roots })
    }

    /// Filesystem path of a location. Locations are validated on parse, so
    /// only the scheme lookup can fail here.
    fn location_to_path(&self, location: &Location) -> StorageResult<PathBuf> {
        let root = self
            .roots
            .get(location.scheme())
            .ok_or_else(|| StorageError::UnknownScheme(location.scheme().to_string()))?;
        Ok(root.join(location.path()))
    }

    async fn remove_if_present(&self, path: &Path) -> StorageResult<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

#[async_trait]
impl ContentStore for LocalStorage {
    fn resolve(&self, raw: &str) -> StorageResult<Location> {
        let location = Location::parse(raw)?;
        if !self.roots.contains_key(location.scheme()) {
            return Err(StorageError::UnknownScheme(location.scheme().to_string()));
        }
        Ok(location)
    }

    async fn prepare_directory(&self, location: &Location) -> StorageResult<()> {
        let path = self.location_to_path(location)?;
        let Some(dir) = path.parent() else {
            return Err(StorageError::DirectoryUnavailable(location.to_string()));
        };

        fs::create_dir_all(dir).await.map_err(|e| {
            StorageError::DirectoryUnavailable(format!("{}: {}", dir.display(), e))
        })?;

        let meta = fs::metadata(dir).await.map_err(|e| {
            StorageError::DirectoryUnavailable(format!("{}: {}", dir.display(), e))
        })?;
        if !meta.is_dir() {
            return Err(StorageError::DirectoryUnavailable(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        let mut permissions = meta.permissions();
        if permissions.readonly() {
            #[allow(clippy::permissions_set_readonly_false)]
            permissions.set_readonly(false);
            fs::set_permissions(dir, permissions).await.map_err(|e| {
                StorageError::DirectoryUnavailable(format!("{}: {}", dir.display(), e))
            })?;
        }

        tracing::debug!(directory = %dir.display(), location = %location, "Destination directory ready");
        Ok(())
    }

    async fn write_stream(&self, location: &Location, mut reader: ByteReader) -> StorageResult<u64> {
        let path = self.location_to_path(location)?;
        let start = std::time::Instant::now();

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .await
            .map_err(|source| StorageError::OpenFailed {
                location: location.to_string(),
                source,
            })?;

        let bytes_copied = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(|source| StorageError::CopyFailed {
                location: location.to_string(),
                source,
            })?;

        if bytes_copied == 0 {
            drop(file);
            self.remove_if_present(&path).await?;
            tracing::warn!(
                path = %path.display(),
                location = %location,
                "Empty request body; destination removed"
            );
            return Err(StorageError::Empty {
                location: location.to_string(),
            });
        }

        file.flush().await.map_err(|source| StorageError::CopyFailed {
            location: location.to_string(),
            source,
        })?;
        file.sync_all().await.map_err(|source| StorageError::CopyFailed {
            location: location.to_string(),
            source,
        })?;

        tracing::info!(
            path = %path.display(),
            location = %location,
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage stream write successful"
        );

        Ok(bytes_copied)
    }

    async fn read_head(&self, location: &Location, limit: usize) -> StorageResult<Vec<u8>> {
        let path = self.location_to_path(location)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(location.to_string()));
        }

        let file = fs::File::open(&path).await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;

        let mut data = Vec::new();
        file.take(limit as u64)
            .read_to_end(&mut data)
            .await
            .map_err(|e| {
                StorageError::ReadFailed(format!("Failed to read file {}: {}", path.display(), e))
            })?;
        Ok(data)
    }

    async fn read_stream(
        &self,
        location: &Location,
    ) -> StorageResult<Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>> {
        let path = self.location_to_path(location)?;

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(location.to_string()));
        }

        let file = fs::File::open(&path).await.map_err(|e| {
            StorageError::ReadFailed(format!("Failed to open file {}: {}", path.display(), e))
        })?;

        let location = location.to_string();
        let stream = tokio_util::io::ReaderStream::new(file).map(move |result| {
            result.map_err(|e| {
                tracing::error!(location = %location, error = %e, "Local storage stream read error");
                StorageError::ReadFailed(format!("Failed to read chunk: {}", e))
            })
        });

        Ok(Box::pin(stream))
    }

    async fn exists(&self, location: &Location) -> StorageResult<bool> {
        let path = self.location_to_path(location)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn delete(&self, location: &Location) -> StorageResult<()> {
        let path = self.location_to_path(location)?;
        self.remove_if_present(&path).await?;
        tracing::info!(path = %path.display(), location = %location, "Local storage delete successful");
        Ok(())
    }
}
