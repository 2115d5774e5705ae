//! Router assembly

use crate::api_doc::ApiDoc;
use crate::auth::{auth_middleware, AuthState, JwtService};
use crate::handlers;
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, put},
    Json, Router,
};
use mediaport_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

pub async fn setup_routes(
    config: &Config,
    state: Arc<AppState>,
) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let auth_state = AuthState {
        jwt: JwtService::new(&config.jwt_secret),
    };

    let protected_routes = protected_routes().layer(axum::middleware::from_fn_with_state(
        Arc::new(auth_state),
        auth_middleware,
    ));

    let app = public_routes()
        .merge(protected_routes)
        .layer(ConcurrencyLimitLayer::new(config.http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(config.max_upload_size_bytes()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!(
        concurrency_limit = config.http_concurrency_limit,
        max_upload_bytes = config.max_upload_size_bytes(),
        "Routes configured"
    );

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::PUT, Method::OPTIONS];
    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}

/// Public routes (no authentication required)
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
}

/// Routes behind bearer authentication
fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/v0/media/{media_id}",
            get(handlers::media_get::get_media),
        )
        .route(
            "/api/v0/media/{media_id}/attach/{destination_field}",
            put(handlers::media_source::attach_file),
        )
        .route(
            "/api/v0/media/{media_id}/source",
            put(handlers::media_source::replace_source),
        )
        .route("/api/v0/files/{file_id}", get(handlers::file_get::get_file))
        .route(
            "/api/v0/files/{file_id}/content",
            get(handlers::file_get::download_file),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(origins: &str) -> Config {
        let origins = origins.to_string();
        Config::from_lookup(move |key| match key {
            "DATABASE_URL" => Some("postgres://localhost/mediaport".to_string()),
            "JWT_SECRET" => Some("0123456789abcdef0123456789abcdef".to_string()),
            "CORS_ORIGINS" => Some(origins.clone()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn test_setup_cors_accepts_explicit_origins() {
        assert!(setup_cors(&config("https://a.example.org,https://b.example.org")).is_ok());
        assert!(setup_cors(&config("*")).is_ok());
    }

    #[test]
    fn test_setup_cors_rejects_invalid_origin() {
        assert!(setup_cors(&config("https://bad\norigin")).is_err());
    }
}
