//! `POST /api/user/balance/withdraw`.

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::models::WithdrawRequest;
use crate::request_context::RequestContext;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use order_service::luhn;
use rust_decimal::Decimal;
use types::balance::BalanceOperation;
use types::ids::OrderNumber;

pub async fn withdraw(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<WithdrawRequest>,
) -> Result<StatusCode, AppError> {
    if req.sum <= Decimal::ZERO {
        return Err(AppError::BadRequest(
            "withdrawal sum must be positive".to_string(),
        ));
    }
    if !luhn::is_valid(&req.order) {
        return Err(AppError::UnprocessableEntity(
            "order number fails the Luhn check".to_string(),
        ));
    }

    let operation = BalanceOperation::withdraw(user.user_id, OrderNumber::new(req.order), req.sum);
    let ctx = RequestContext::new();
    ctx.guard(state.balance_service.execute(operation)).await?;

    Ok(StatusCode::OK)
}
