//! JWT issuance and verification.
//!
//! Grounded on `original_source/internal/domain/tool/jwt.go`'s
//! `JWTClaims{RegisteredClaims, UserID}` / HS256 / 24h-expiry shape,
//! translated into a `jsonwebtoken` claims struct. Replaces the
//! teacher's `insecure_disable_signature_validation()` placeholder and
//! nonce/API-key path entirely — this service has no signed-request
//! flow, only bearer auth.

use crate::error::AppError;
use crate::state::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use types::ids::UserId;

const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: UserId,
    pub exp: usize,
}

/// Signs a bearer token for `user_id`, valid for 24 hours.
pub fn issue_token(user_id: UserId, secret_key: &str) -> Result<String, AppError> {
    let exp = (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize;
    let claims = Claims { user_id, exp };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret_key.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to sign token: {e}")))
}

fn verify_token(token: &str, secret_key: &str) -> Result<UserId, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret_key.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("invalid or expired token".to_string()))?;
    Ok(data.claims.user_id)
}

pub struct AuthenticatedUser {
    pub user_id: UserId,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("Authorization")
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;
        let header = header
            .to_str()
            .map_err(|_| AppError::Unauthorized("malformed Authorization header".to_string()))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("expected a bearer token".to_string()))?;

        let user_id = verify_token(token, &state.secret_key)?;
        Ok(AuthenticatedUser { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify_round_trip() {
        let user_id = UserId::new();
        let token = issue_token(user_id, "test-secret").unwrap();
        let verified = verify_token(&token, "test-secret").unwrap();
        assert_eq!(user_id, verified);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let user_id = UserId::new();
        let token = issue_token(user_id, "test-secret").unwrap();
        assert!(verify_token(&token, "other-secret").is_err());
    }
}
