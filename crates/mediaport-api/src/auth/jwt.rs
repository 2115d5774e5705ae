//! HS256 bearer tokens.

use crate::auth::models::JwtClaims;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mediaport_core::AppError;
use uuid::Uuid;

#[derive(Clone)]
pub struct JwtService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Mint a token for `user_id`. Used by operators and tests; the service
    /// itself only verifies.
    pub fn issue(
        &self,
        user_id: Uuid,
        roles: Vec<String>,
        ttl: Duration,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = JwtClaims {
            sub: user_id,
            roles,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<JwtClaims, AppError> {
        decode::<JwtClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Token rejected");
                AppError::Unauthorized("Invalid or expired token".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_issue_then_verify() {
        let service = JwtService::new(SECRET);
        let user = Uuid::new_v4();
        let token = service
            .issue(user, vec!["editor".into()], Duration::minutes(5))
            .unwrap();

        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.roles, vec!["editor".to_string()]);
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = JwtService::new(SECRET);
        let token = service
            .issue(Uuid::new_v4(), Vec::new(), Duration::hours(-2))
            .unwrap();

        assert!(matches!(
            service.verify(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let token = JwtService::new(SECRET)
            .issue(Uuid::new_v4(), Vec::new(), Duration::minutes(5))
            .unwrap();
        let other = JwtService::new("ffffffffffffffffffffffffffffffff");

        assert!(other.verify(&token).is_err());
    }
}
