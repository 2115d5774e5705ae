//! Ingestion Service
//!
//! Orchestrates the two ingestion operations inside a caller-owned unit of
//! work:
//!
//! * **attach-new**: validate the destination field and the target
//!   extension, write the body to a new location, create a permanent File
//!   and point the media field at it.
//! * **replace-source**: overwrite the bytes of the media's current source
//!   File in place and re-derive mapped metadata.
//!
//! Every check that can reject the request runs before the first byte is
//! written. The caller commits or rolls back the unit of work based on the
//! returned result.

use mediaport_core::bundles::BundleRegistry;
use mediaport_core::models::{File, Media};
use mediaport_core::AppError;
use mediaport_db::UnitOfWork;
use mediaport_processing::validate_extension;
use mediaport_storage::{ByteReader, ContentStore, DerivativeCache, Location};
use std::sync::Arc;
use uuid::Uuid;

use crate::records::{FileRecords, MediaRecords};

/// Input of [`IngestionService::attach_new`].
pub struct AttachRequest {
    pub media: Media,
    pub destination_field: String,
    pub body: ByteReader,
    pub mime_type: String,
    /// Target `scheme://path`; its last segment is the filename.
    pub location: String,
    pub owner_id: Uuid,
}

/// Input of [`IngestionService::replace_source`].
pub struct ReplaceRequest {
    pub media: Media,
    pub body: ByteReader,
    /// New MIME type of the source File, kept as is when `None`.
    pub mime_type: Option<String>,
}

/// Records as saved by a successful ingestion.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub media: Media,
    pub file: File,
    pub bytes_written: u64,
}

#[derive(Clone)]
pub struct IngestionService {
    store: Arc<dyn ContentStore>,
    derivatives: Arc<dyn DerivativeCache>,
    files: FileRecords,
    media: MediaRecords,
}

impl IngestionService {
    pub fn new(
        store: Arc<dyn ContentStore>,
        derivatives: Arc<dyn DerivativeCache>,
        bundles: Arc<BundleRegistry>,
        media: MediaRecords,
    ) -> Self {
        Self {
            store,
            derivatives,
            files: FileRecords::new(bundles),
            media,
        }
    }

    pub fn media_records(&self) -> &MediaRecords {
        &self.media
    }

    pub fn file_records(&self) -> &FileRecords {
        &self.files
    }

    /// Attach a new file to `request.destination_field`.
    #[tracing::instrument(
        skip(self, uow, request),
        fields(
            media.id = %request.media.id,
            field = %request.destination_field,
            location = %request.location
        )
    )]
    pub async fn attach_new(
        &self,
        uow: &mut dyn UnitOfWork,
        request: AttachRequest,
    ) -> Result<Ingested, AppError> {
        let AttachRequest {
            mut media,
            destination_field,
            body,
            mime_type,
            location,
            owner_id,
        } = request;

        let bundle = self.media.bundle(&media.bundle)?;
        if !bundle.has_field(&destination_field) {
            return Err(AppError::BadRequest(format!(
                "Media does not have destination field {}",
                destination_field
            )));
        }
        let allowed = bundle.allowed_extensions(&destination_field).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Field {} on {} media does not accept files",
                destination_field, media.bundle
            ))
        })?;
        let is_source_field = bundle.source_field.as_deref() == Some(destination_field.as_str());

        let location = self.store.resolve(&location)?;
        let filename = location.filename().to_string();
        validate_extension(&filename, allowed)?;

        self.store.prepare_directory(&location).await?;
        let bytes_written = self.write_content(&location, body).await?;

        let mut file = self
            .files
            .create_file(&location, owner_id, &mime_type, &filename);
        file.size = Some(bytes_written as i64);
        let file = self.files.save_new(uow, &file).await?;

        media.set_file(destination_field.clone(), file.id);
        if is_source_field {
            self.media.apply_field_mapping(&mut media, &file).await?;
        }
        let media = self.media.save(uow, &media).await?;

        tracing::info!(
            file.id = %file.id,
            size_bytes = bytes_written,
            revision = media.revision,
            "Attached new file to media"
        );

        Ok(Ingested {
            media,
            file,
            bytes_written,
        })
    }

    /// Overwrite the content of the media's source File in place.
    #[tracing::instrument(skip(self, uow, request), fields(media.id = %request.media.id))]
    pub async fn replace_source(
        &self,
        uow: &mut dyn UnitOfWork,
        request: ReplaceRequest,
    ) -> Result<Ingested, AppError> {
        let ReplaceRequest {
            mut media,
            body,
            mime_type,
        } = request;

        let mut file = self.files.load_source_file(uow, &media).await?;
        let location = self.store.resolve(&file.location)?;

        let bytes_written = self.write_content(&location, body).await?;

        if let Some(mime_type) = mime_type {
            file.mime_type = mime_type;
        }
        file.size = Some(bytes_written as i64);
        let file = self.files.save(uow, &file).await?;

        self.media.apply_field_mapping(&mut media, &file).await?;
        let media = self.media.save(uow, &media).await?;

        tracing::info!(
            file.id = %file.id,
            location = %location,
            size_bytes = bytes_written,
            revision = media.revision,
            "Replaced media source file"
        );

        Ok(Ingested {
            media,
            file,
            bytes_written,
        })
    }

    /// Write `body` to `location` and drop cached derivatives of it.
    async fn write_content(&self, location: &Location, body: ByteReader) -> Result<u64, AppError> {
        let bytes_written = self.store.write_stream(location, body).await?;

        match self.derivatives.flush(location).await {
            Ok(removed) if removed > 0 => {
                tracing::debug!(location = %location, removed = removed, "Flushed derivatives");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(location = %location, error = %e, "Failed to flush derivatives");
            }
        }

        Ok(bytes_written)
    }
}
