//! In-memory [`Database`] for tests.
//!
//! Writes are staged per unit of work and applied only on commit. One unit of
//! work is open at a time, which stands in for the row lock Postgres takes.

use async_trait::async_trait;
use chrono::Utc;
use mediaport_core::models::{File, Media};
use mediaport_core::AppError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::unit_of_work::{Database, UnitOfWork};

#[derive(Default)]
struct Tables {
    media: HashMap<Uuid, Media>,
    files: HashMap<Uuid, File>,
}

#[derive(Default)]
struct Counters {
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<Mutex<Tables>>,
    writer: Arc<Mutex<()>>,
    counters: Arc<Counters>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_media(&self, media: Media) {
        self.tables.lock().await.media.insert(media.id, media);
    }

    pub async fn insert_file(&self, file: File) {
        self.tables.lock().await.files.insert(file.id, file);
    }

    pub async fn file_count(&self) -> usize {
        self.tables.lock().await.files.len()
    }

    pub async fn files(&self) -> Vec<File> {
        self.tables.lock().await.files.values().cloned().collect()
    }

    pub fn commits(&self) -> usize {
        self.counters.commits.load(Ordering::SeqCst)
    }

    pub fn rollbacks(&self) -> usize {
        self.counters.rollbacks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Database for InMemoryDatabase {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, AppError> {
        let guard = self.writer.clone().lock_owned().await;
        Ok(Box::new(InMemoryUnitOfWork {
            tables: self.tables.clone(),
            counters: self.counters.clone(),
            staged_media: HashMap::new(),
            staged_files: HashMap::new(),
            _guard: guard,
        }))
    }

    async fn get_media(&self, id: Uuid) -> Result<Option<Media>, AppError> {
        Ok(self.tables.lock().await.media.get(&id).cloned())
    }

    async fn get_file(&self, id: Uuid) -> Result<Option<File>, AppError> {
        Ok(self.tables.lock().await.files.get(&id).cloned())
    }
}

pub struct InMemoryUnitOfWork {
    tables: Arc<Mutex<Tables>>,
    counters: Arc<Counters>,
    staged_media: HashMap<Uuid, Media>,
    staged_files: HashMap<Uuid, File>,
    _guard: OwnedMutexGuard<()>,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn lock_media(&mut self, id: Uuid) -> Result<Option<Media>, AppError> {
        if let Some(media) = self.staged_media.get(&id) {
            return Ok(Some(media.clone()));
        }
        Ok(self.tables.lock().await.media.get(&id).cloned())
    }

    async fn find_file(&mut self, id: Uuid) -> Result<Option<File>, AppError> {
        if let Some(file) = self.staged_files.get(&id) {
            return Ok(Some(file.clone()));
        }
        Ok(self.tables.lock().await.files.get(&id).cloned())
    }

    async fn insert_file(&mut self, file: &File) -> Result<File, AppError> {
        let exists = self.staged_files.contains_key(&file.id)
            || self.tables.lock().await.files.contains_key(&file.id);
        if exists {
            return Err(AppError::Internal(format!("File {} already exists", file.id)));
        }
        self.staged_files.insert(file.id, file.clone());
        Ok(file.clone())
    }

    async fn update_file(&mut self, file: &File) -> Result<File, AppError> {
        if self.find_file(file.id).await?.is_none() {
            return Err(AppError::NotFound(format!("File {} not found", file.id)));
        }
        let mut updated = file.clone();
        updated.updated_at = Utc::now();
        self.staged_files.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn update_media(&mut self, media: &Media) -> Result<Media, AppError> {
        let current = self
            .lock_media(media.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Media {} not found", media.id)))?;
        let mut updated = media.clone();
        updated.revision = current.revision + 1;
        updated.updated_at = Utc::now();
        self.staged_media.insert(updated.id, updated.clone());
        Ok(updated)
    }

    async fn commit(self: Box<Self>) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        tables.files.extend(self.staged_files.clone());
        tables.media.extend(self.staged_media.clone());
        self.counters.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), AppError> {
        self.counters.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
