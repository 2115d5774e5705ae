//! Media repository: persistence for the media table.
//!
//! Field values are stored as one JSONB document per record. Every save bumps
//! `revision`.

use chrono::{DateTime, Utc};
use mediaport_core::models::{FieldValue, Media};
use mediaport_core::AppError;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::BTreeMap;
use uuid::Uuid;

const MEDIA_COLUMNS: &str = "id, bundle, owner_id, fields, revision, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub struct MediaRow {
    pub id: Uuid,
    pub bundle: String,
    pub owner_id: Uuid,
    pub fields: Json<BTreeMap<String, FieldValue>>,
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MediaRow> for Media {
    fn from(row: MediaRow) -> Self {
        Media {
            id: row.id,
            bundle: row.bundle,
            owner_id: row.owner_id,
            fields: row.fields.0,
            revision: row.revision,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct MediaRepository {
    pool: PgPool,
}

impl MediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.record_id = %id))]
    pub async fn get(&self, id: Uuid) -> Result<Option<Media>, AppError> {
        let row = sqlx::query_as::<Postgres, MediaRow>(&format!(
            "SELECT {} FROM media WHERE id = $1",
            MEDIA_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Media::from))
    }

    /// Insert a media record. Media are created outside ingestion; this is
    /// used by provisioning and tests.
    #[tracing::instrument(skip(self, media), fields(db.table = "media", db.operation = "insert", db.record_id = %media.id))]
    pub async fn create(&self, media: &Media) -> Result<Media, AppError> {
        let row = sqlx::query_as::<Postgres, MediaRow>(&format!(
            r#"
            INSERT INTO media (id, bundle, owner_id, fields, revision, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            MEDIA_COLUMNS
        ))
        .bind(media.id)
        .bind(&media.bundle)
        .bind(media.owner_id)
        .bind(Json(&media.fields))
        .bind(media.revision)
        .bind(media.created_at)
        .bind(media.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    /// Load a media record and hold its row lock until the transaction ends.
    #[tracing::instrument(skip(self, tx), fields(db.table = "media", db.operation = "select_for_update", db.record_id = %id))]
    pub async fn lock_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<Option<Media>, AppError> {
        let row = sqlx::query_as::<Postgres, MediaRow>(&format!(
            "SELECT {} FROM media WHERE id = $1 FOR UPDATE",
            MEDIA_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(row.map(Media::from))
    }

    #[tracing::instrument(skip(self, tx, media), fields(db.table = "media", db.operation = "update", db.record_id = %media.id))]
    pub async fn update_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        media: &Media,
    ) -> Result<Media, AppError> {
        let row = sqlx::query_as::<Postgres, MediaRow>(&format!(
            r#"
            UPDATE media
            SET fields = $2, revision = revision + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            MEDIA_COLUMNS
        ))
        .bind(media.id)
        .bind(Json(&media.fields))
        .fetch_optional(&mut **tx)
        .await?;

        row.map(Media::from)
            .ok_or_else(|| AppError::NotFound(format!("Media {} not found", media.id)))
    }
}
