//! Unit-of-work abstraction
//!
//! The ingestion pipeline only needs a handful of record operations, all of
//! which must run inside one transaction. These traits describe that surface
//! so the pipeline can run against Postgres or an in-memory double.

use async_trait::async_trait;
use mediaport_core::models::{File, Media};
use mediaport_core::AppError;
use uuid::Uuid;

/// Entry point: reads outside a transaction and transaction creation.
#[async_trait]
pub trait Database: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, AppError>;

    async fn get_media(&self, id: Uuid) -> Result<Option<Media>, AppError>;

    async fn get_file(&self, id: Uuid) -> Result<Option<File>, AppError>;
}

/// One open transaction. Nothing written through it is visible to other
/// readers until [`UnitOfWork::commit`].
#[async_trait]
pub trait UnitOfWork: Send {
    /// Load a media record and serialize other writers on it until the
    /// transaction ends.
    async fn lock_media(&mut self, id: Uuid) -> Result<Option<Media>, AppError>;

    async fn find_file(&mut self, id: Uuid) -> Result<Option<File>, AppError>;

    async fn insert_file(&mut self, file: &File) -> Result<File, AppError>;

    async fn update_file(&mut self, file: &File) -> Result<File, AppError>;

    /// Persist fields and bump the revision.
    async fn update_media(&mut self, media: &Media) -> Result<Media, AppError>;

    async fn commit(self: Box<Self>) -> Result<(), AppError>;

    async fn rollback(self: Box<Self>) -> Result<(), AppError>;
}

/// Commit when `result` is Ok, roll back otherwise.
///
/// The original error always wins over a rollback failure, which is only logged.
pub async fn complete<T>(
    uow: Box<dyn UnitOfWork>,
    result: Result<T, AppError>,
) -> Result<T, AppError> {
    match result {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = uow.rollback().await {
                tracing::error!(
                    error = %err,
                    rollback_error = %rollback_err,
                    "Failed to roll back transaction"
                );
            } else {
                tracing::debug!(error = %err, "Transaction rolled back");
            }
            Err(err)
        }
    }
}
