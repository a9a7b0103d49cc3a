//! `POST /api/user/login` — grounded on
//! `original_source/.../user/login/login.go`: lowercase the login,
//! look up the user, verify the password, issue a bearer token.

use crate::auth::issue_token;
use crate::error::AppError;
use crate::models::LoginRequest;
use crate::request_context::RequestContext;
use crate::state::AppState;
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::Json;

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, HeaderMap), AppError> {
    if req.login.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "login and password are required".to_string(),
        ));
    }

    let login = req.login.to_lowercase();
    let ctx = RequestContext::new();
    let user = ctx.guard(state.user_store.find_by_login(&login)).await?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("stored hash is malformed: {e}")))?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::Unauthorized("wrong login or password".to_string()))?;

    let token = issue_token(user.id, &state.secret_key)?;
    let mut headers = HeaderMap::new();
    headers.insert(
        "Authorization",
        HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?,
    );

    Ok((StatusCode::OK, headers))
}
