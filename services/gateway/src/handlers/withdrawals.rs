//! `GET /api/user/withdrawals`.

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::models::WithdrawalListItem;
use crate::request_context::RequestContext;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ledger_store::error::LedgerError;

pub async fn list_withdrawals(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Response, AppError> {
    let ctx = RequestContext::new();
    let result = ctx
        .run(state.balance_service.list_withdrawals(user.user_id))
        .await
        .map_err(|_| AppError::Timeout)?;

    let operations = match result {
        Ok(ops) => ops,
        Err(LedgerError::NoWithdrawOperations) => return Ok(StatusCode::NO_CONTENT.into_response()),
        Err(e) => return Err(e.into()),
    };

    let mut items: Vec<WithdrawalListItem> = operations.into_iter().map(Into::into).collect();
    items.sort_by(|a, b| a.processed_at.cmp(&b.processed_at));
    Ok(Json(items).into_response())
}
