//! Postgres-backed [`Database`] and [`UnitOfWork`].

use anyhow::Context;
use async_trait::async_trait;
use mediaport_core::models::{File, Media};
use mediaport_core::AppError;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::db::{FileRepository, MediaRepository};
use crate::unit_of_work::{Database, UnitOfWork};

#[derive(Clone)]
pub struct PgDatabase {
    pool: PgPool,
    files: FileRepository,
    media: MediaRepository,
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self {
            files: FileRepository::new(pool.clone()),
            media: MediaRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn media_repository(&self) -> &MediaRepository {
        &self.media
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, AppError> {
        let tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin database transaction")?;
        Ok(Box::new(PgUnitOfWork {
            tx,
            files: self.files.clone(),
            media: self.media.clone(),
        }))
    }

    async fn get_media(&self, id: Uuid) -> Result<Option<Media>, AppError> {
        self.media.get(id).await
    }

    async fn get_file(&self, id: Uuid) -> Result<Option<File>, AppError> {
        self.files.get(id).await
    }
}

pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
    files: FileRepository,
    media: MediaRepository,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn lock_media(&mut self, id: Uuid) -> Result<Option<Media>, AppError> {
        self.media.lock_tx(&mut self.tx, id).await
    }

    async fn find_file(&mut self, id: Uuid) -> Result<Option<File>, AppError> {
        self.files.get_tx(&mut self.tx, id).await
    }

    async fn insert_file(&mut self, file: &File) -> Result<File, AppError> {
        self.files.insert_tx(&mut self.tx, file).await
    }

    async fn update_file(&mut self, file: &File) -> Result<File, AppError> {
        self.files.update_tx(&mut self.tx, file).await
    }

    async fn update_media(&mut self, media: &Media) -> Result<Media, AppError> {
        self.media.update_tx(&mut self.tx, media).await
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        self.tx
            .commit()
            .await
            .context("Failed to commit database transaction")?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        self.tx
            .rollback()
            .await
            .context("Failed to rollback database transaction")?;
        Ok(())
    }
}
