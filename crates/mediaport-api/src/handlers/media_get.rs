use crate::auth::models::CurrentActor;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use mediaport_core::models::Media;
use mediaport_core::AppError;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/v0/media/{media_id}",
    tag = "media",
    params(
        ("media_id" = Uuid, Path, description = "Media ID")
    ),
    responses(
        (status = 200, description = "Media found", body = Media),
        (status = 404, description = "Media not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_media(
    State(state): State<Arc<AppState>>,
    CurrentActor(actor): CurrentActor,
    Path(media_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    tracing::debug!(media_id = %media_id, user_id = %actor.user_id, "Fetching media");

    let media = state
        .database
        .get_media(media_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Media {} not found", media_id)))?;

    Ok(Json(media))
}
