//! `GET /api/user/balance`.

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::models::BalanceResponse;
use crate::request_context::RequestContext;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;

pub async fn get_balance(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<BalanceResponse>, AppError> {
    let ctx = RequestContext::new();
    let balance = ctx.guard(state.balance_service.get_balance(user.user_id)).await?;
    Ok(Json(balance.into()))
}
