//! File repository: persistence for the files table.

use chrono::{DateTime, Utc};
use mediaport_core::models::{File, FileStatus};
use mediaport_core::AppError;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const FILE_COLUMNS: &str =
    "id, owner_id, location, filename, mime_type, status, size, created_at, updated_at";

/// Row type for files table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct FileRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub location: String,
    pub filename: String,
    pub mime_type: String,
    pub status: FileStatus,
    pub size: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FileRow> for File {
    fn from(row: FileRow) -> Self {
        File {
            id: row.id,
            owner_id: row.owner_id,
            location: row.location,
            filename: row.filename,
            mime_type: row.mime_type,
            status: row.status,
            size: row.size,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "files", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<File>, AppError> {
        let row = sqlx::query_as::<Postgres, FileRow>(&format!(
            "SELECT {} FROM files WHERE id = $1",
            FILE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(File::from))
    }

    #[tracing::instrument(skip(self, tx), fields(db.table = "files", db.record_id = %id))]
    pub async fn get_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<File>, AppError> {
        let row = sqlx::query_as::<Postgres, FileRow>(&format!(
            "SELECT {} FROM files WHERE id = $1",
            FILE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(row.map(File::from))
    }

    /// Insert a new file within a transaction.
    #[tracing::instrument(skip(self, tx, file), fields(db.table = "files", db.operation = "insert", db.record_id = %file.id))]
    pub async fn insert_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        file: &File,
    ) -> Result<File, AppError> {
        let row = sqlx::query_as::<Postgres, FileRow>(&format!(
            r#"
            INSERT INTO files (id, owner_id, location, filename, mime_type, status, size, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            FILE_COLUMNS
        ))
        .bind(file.id)
        .bind(file.owner_id)
        .bind(&file.location)
        .bind(&file.filename)
        .bind(&file.mime_type)
        .bind(file.status)
        .bind(file.size)
        .bind(file.created_at)
        .bind(file.updated_at)
        .fetch_one(&mut **tx)
        .await?;
        Ok(row.into())
    }

    /// Persist mutable attributes of an existing file within a transaction.
    #[tracing::instrument(skip(self, tx, file), fields(db.table = "files", db.operation = "update", db.record_id = %file.id))]
    pub async fn update_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        file: &File,
    ) -> Result<File, AppError> {
        let row = sqlx::query_as::<Postgres, FileRow>(&format!(
            r#"
            UPDATE files
            SET location = $2, filename = $3, mime_type = $4, status = $5, size = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            FILE_COLUMNS
        ))
        .bind(file.id)
        .bind(&file.location)
        .bind(&file.filename)
        .bind(&file.mime_type)
        .bind(file.status)
        .bind(file.size)
        .fetch_optional(&mut **tx)
        .await?;

        row.map(File::from)
            .ok_or_else(|| AppError::NotFound(format!("File {} not found", file.id)))
    }
}
