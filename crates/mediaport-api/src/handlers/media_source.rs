//! Raw-body ingestion endpoints.
//!
//! Both handlers check the required headers before anything else, then run
//! the ingestion inside one unit of work: lock the media row, check update
//! access, ingest, commit. Any error rolls the unit of work back before it is
//! returned. Media event listeners are notified only after the commit.

use crate::auth::models::CurrentActor;
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::file_get::FileResponse;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::IntoResponse,
    Json,
};
use futures::TryStreamExt;
use mediaport_core::models::Media;
use mediaport_core::{Actor, AppError, MediaEvent};
use mediaport_db::{complete, UnitOfWork};
use mediaport_services::{AttachRequest, Ingested, ReplaceRequest};
use mediaport_storage::ByteReader;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::io::StreamReader;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AttachResponse {
    pub file: FileResponse,
    pub media: Media,
}

fn required_header(headers: &HeaderMap, name: HeaderName, label: &str) -> Result<String, AppError> {
    let value = headers
        .get(&name)
        .ok_or_else(|| AppError::BadRequest(format!("Missing {} header", label)))?;
    let value = value
        .to_str()
        .map_err(|_| AppError::BadRequest(format!("Invalid {} header", label)))?
        .trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("Missing {} header", label)));
    }
    Ok(value.to_string())
}

fn body_reader(body: Body) -> ByteReader {
    let stream = body.into_data_stream().map_err(std::io::Error::other);
    Box::pin(StreamReader::new(Box::pin(stream)))
}

/// Load `media_id` under a row lock and check that `actor` may update it.
async fn lock_for_update(
    state: &AppState,
    uow: &mut dyn UnitOfWork,
    actor: &Actor,
    media_id: Uuid,
) -> Result<Media, AppError> {
    let media = uow
        .lock_media(media_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Media {} not found", media_id)))?;

    if !state.access_policy.can_update(actor, &media) {
        return Err(AppError::Forbidden(format!(
            "Not allowed to update media {}",
            media_id
        )));
    }
    Ok(media)
}

/// Hand the committed records to the media event listener in the background.
fn notify_saved(state: &AppState, ingested: &Ingested, actor: Actor) {
    let events = state.events.clone();
    let event = MediaEvent {
        media: ingested.media.clone(),
        file: ingested.file.clone(),
        actor,
    };
    tokio::spawn(async move {
        let media_id = event.media.id;
        if let Err(e) = events.media_saved(event).await {
            tracing::warn!(error = %e, media_id = %media_id, "Media event listener failed");
        }
    });
}

#[utoipa::path(
    put,
    path = "/api/v0/media/{media_id}/attach/{destination_field}",
    tag = "media",
    params(
        ("media_id" = Uuid, Path, description = "Media ID"),
        ("destination_field" = String, Path, description = "File field receiving the upload"),
        ("Content-Location" = String, Header, description = "Target storage location, e.g. public://2024/photo.jpg"),
        ("Content-Type" = String, Header, description = "MIME type of the body")
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream", description = "Raw file bytes"),
    responses(
        (status = 201, description = "File created and attached", body = AttachResponse),
        (status = 400, description = "Missing header, bad extension, empty body or unknown field", body = ErrorResponse),
        (status = 403, description = "Caller may not update the media", body = ErrorResponse),
        (status = 404, description = "Media or bundle not found", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip_all,
    fields(
        user_id = %actor.user_id,
        media_id = %media_id,
        field = %destination_field,
        operation = "attach_file"
    )
)]
pub async fn attach_file(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path((media_id, destination_field)): Path<(Uuid, String)>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, HttpAppError> {
    let location = required_header(&headers, header::CONTENT_LOCATION, "Content-Location")?;
    let mime_type = required_header(&headers, header::CONTENT_TYPE, "Content-Type")?;

    let mut uow = state.database.begin().await?;
    let result = async {
        let media = lock_for_update(&state, uow.as_mut(), &actor, media_id).await?;
        let request = AttachRequest {
            media,
            destination_field,
            body: body_reader(body),
            mime_type,
            location,
            owner_id: actor.user_id,
        };
        state.ingestion.attach_new(uow.as_mut(), request).await
    }
    .await;
    let ingested = complete(uow, result).await?;

    notify_saved(&state, &ingested, actor);

    let resource = state.urls.file_resource_path(ingested.file.id);
    let response = AttachResponse {
        file: FileResponse::new(ingested.file, &state.urls),
        media: ingested.media,
    };

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, resource)],
        Json(response),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v0/media/{media_id}/source",
    tag = "media",
    params(
        ("media_id" = Uuid, Path, description = "Media ID"),
        ("Content-Type" = String, Header, description = "MIME type of the body")
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream", description = "Raw file bytes"),
    responses(
        (status = 204, description = "Source content replaced"),
        (status = 400, description = "Missing header or empty body", body = ErrorResponse),
        (status = 403, description = "Caller may not update the media", body = ErrorResponse),
        (status = 404, description = "Media, source field or source file not found", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(
    skip_all,
    fields(user_id = %actor.user_id, media_id = %media_id, operation = "replace_source")
)]
pub async fn replace_source(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(media_id): Path<Uuid>,
    headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, HttpAppError> {
    let mime_type = required_header(&headers, header::CONTENT_TYPE, "Content-Type")?;

    let mut uow = state.database.begin().await?;
    let result = async {
        let media = lock_for_update(&state, uow.as_mut(), &actor, media_id).await?;
        let request = ReplaceRequest {
            media,
            body: body_reader(body),
            mime_type: Some(mime_type),
        };
        state.ingestion.replace_source(uow.as_mut(), request).await
    }
    .await;
    let ingested = complete(uow, result).await?;

    notify_saved(&state, &ingested, actor);

    Ok(StatusCode::NO_CONTENT)
}
