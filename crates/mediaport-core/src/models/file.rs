use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle flag of a stored file. Temporary files are eligible for
/// garbage collection when nothing references them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "file_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Temporary,
    Permanent,
}

/// One stored binary object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct File {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// `scheme://path`; stable identity of the stored bytes.
    pub location: String,
    pub filename: String,
    pub mime_type: String,
    pub status: FileStatus,
    /// Bytes written by the last successful ingestion.
    pub size: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl File {
    /// A new, not yet persisted, permanent file record.
    pub fn new_permanent(
        location: impl Into<String>,
        owner_id: Uuid,
        mime_type: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        File {
            id: Uuid::new_v4(),
            owner_id,
            location: location.into(),
            filename: filename.into(),
            mime_type: mime_type.into(),
            status: FileStatus::Permanent,
            size: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_permanent(&self) -> bool {
        self.status == FileStatus::Permanent
    }
}
