use crate::auth::models::CurrentActor;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use mediaport_core::models::{File, FileStatus};
use mediaport_core::{AppError, UrlBuilder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// File record as exposed over HTTP.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub location: String,
    pub filename: String,
    pub mime_type: String,
    pub size: Option<i64>,
    pub status: FileStatus,
    pub download_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileResponse {
    pub fn new(file: File, urls: &UrlBuilder) -> Self {
        let download_url = urls.file_download_url(&file.location);
        FileResponse {
            id: file.id,
            owner_id: file.owner_id,
            location: file.location,
            filename: file.filename,
            mime_type: file.mime_type,
            size: file.size,
            status: file.status,
            download_url,
            created_at: file.created_at,
            updated_at: file.updated_at,
        }
    }
}

async fn load_file(state: &AppState, file_id: Uuid) -> Result<File, AppError> {
    state
        .database
        .get_file(file_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("File {} not found", file_id)))
}

#[utoipa::path(
    get,
    path = "/api/v0/files/{file_id}",
    tag = "files",
    params(
        ("file_id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File found", body = FileResponse),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    _actor: CurrentActor,
    Path(file_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let file = load_file(&state, file_id).await?;
    Ok(Json(FileResponse::new(file, &state.urls)))
}

#[utoipa::path(
    get,
    path = "/api/v0/files/{file_id}/content",
    tag = "files",
    params(
        ("file_id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "Stored bytes", content_type = "application/octet-stream"),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip_all, fields(file_id = %file_id, operation = "download_file"))]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    _actor: CurrentActor,
    Path(file_id): Path<Uuid>,
) -> Result<Response, HttpAppError> {
    let file = load_file(&state, file_id).await?;
    let location = state.storage.resolve(&file.location)?;

    tracing::debug!(location = %location, "Streaming file from storage");

    let stream = state.storage.read_stream(&location).await?;
    let body_stream = stream.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });

    let content_disposition = format!("inline; filename=\"{}\"", file.filename.replace('"', ""));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, file.mime_type.as_str())
        .header(header::CONTENT_DISPOSITION, content_disposition.as_str())
        .body(Body::from_stream(body_stream))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}
