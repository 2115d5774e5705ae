use crate::auth::jwt::JwtService;
use crate::auth::models::CurrentActor;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use mediaport_core::AppError;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: JwtService,
}

/// Verify the bearer token and store the caller as [`CurrentActor`].
pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = match request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
    {
        Some(h) => h,
        None => {
            return HttpAppError(AppError::Unauthorized(
                "Missing authorization header".to_string(),
            ))
            .into_response();
        }
    };

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        return HttpAppError(AppError::Unauthorized(
            "Invalid authorization header format".to_string(),
        ))
        .into_response();
    };
    let token = token.trim().to_string();

    match auth_state.jwt.verify(&token) {
        Ok(claims) => {
            let actor = claims.actor();
            tracing::debug!(user_id = %actor.user_id, "Authenticated request");
            request.extensions_mut().insert(CurrentActor(actor));
            next.run(request).await
        }
        Err(err) => HttpAppError(err).into_response(),
    }
}
