//! OpenAPI documentation, served at `/api/openapi.json`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use mediaport_core::models;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mediaport API",
        version = "0.1.0",
        description = "Media source ingestion API (v0). Raw request bodies are written to location-addressed storage and attached to media fields inside one database transaction."
    ),
    paths(
        handlers::media_source::attach_file,
        handlers::media_source::replace_source,
        handlers::media_get::get_media,
        handlers::file_get::get_file,
        handlers::file_get::download_file,
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::Media,
            models::FieldValue,
            models::FileReference,
            models::MetadataValue,
            models::FileStatus,
            handlers::file_get::FileResponse,
            handlers::media_source::AttachResponse,
            handlers::health::HealthCheckResponse,
            error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "media", description = "Attach files to media and replace media source content"),
        (name = "files", description = "Stored file records and their content"),
        (name = "health", description = "Liveness and dependency checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_ingestion_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc
            .paths
            .paths
            .contains_key("/api/v0/media/{media_id}/attach/{destination_field}"));
        assert!(doc.paths.paths.contains_key("/api/v0/media/{media_id}/source"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
