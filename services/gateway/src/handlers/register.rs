//! `POST /api/user/register` — grounded on
//! `original_source/.../user/register/register.go`: decode, hash the
//! password, insert the user row, open a zero balance, issue a bearer
//! token.

use crate::auth::issue_token;
use crate::error::AppError;
use crate::models::RegisterRequest;
use crate::request_context::RequestContext;
use crate::state::AppState;
use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
use argon2::Argon2;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::Json;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, HeaderMap), AppError> {
    if req.login.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "login and password are required".to_string(),
        ));
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to hash password: {e}")))?
        .to_string();

    let ctx = RequestContext::new();
    let user_id = ctx
        .guard(state.user_store.create_user(&req.login, &password_hash))
        .await?;

    ctx.guard(state.balance_service.create_balance_for_user(user_id))
        .await?;

    let token = issue_token(user_id, &state.secret_key)?;
    let mut headers = HeaderMap::new();
    headers.insert(
        "Authorization",
        HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?,
    );

    Ok((StatusCode::OK, headers))
}
