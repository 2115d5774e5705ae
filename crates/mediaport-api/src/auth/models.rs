use crate::error::ErrorResponse;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;
use mediaport_core::Actor;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: Uuid, // user_id
    #[serde(default)]
    pub roles: Vec<String>,
    pub exp: i64, // expiration timestamp
    pub iat: i64, // issued at timestamp
}

impl JwtClaims {
    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.sub,
            roles: self.roles.clone(),
        }
    }
}

/// Authenticated actor stored in request extensions by the auth middleware.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentActor>()
            .cloned()
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse {
                        error: "Missing authenticated actor".to_string(),
                        details: None,
                        error_type: None,
                        code: "MISSING_ACTOR".to_string(),
                        recoverable: false,
                        suggested_action: Some("Check the bearer token".to_string()),
                    }),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_without_roles() {
        let id = Uuid::new_v4();
        let raw = format!(r#"{{"sub":"{}","exp":10,"iat":1}}"#, id);
        let claims: JwtClaims = serde_json::from_str(&raw).unwrap();
        let actor = claims.actor();
        assert_eq!(actor.user_id, id);
        assert!(actor.roles.is_empty());
    }
}
