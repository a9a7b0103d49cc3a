//! `POST`/`GET /api/user/orders` — order ingestion and listing.

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::models::OrderListItem;
use crate::request_context::RequestContext;
use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use order_service::error::OrderServiceError;
use order_store::error::OrderStoreError;

/// Body is a bare JSON integer, not an object — read as raw text and
/// validated digit-by-digit rather than parsed as a number, since order
/// numbers can run longer than a 64-bit integer.
pub async fn upload_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: String,
) -> Result<StatusCode, AppError> {
    let order_number = body.trim();
    if order_number.is_empty() || !order_number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::UnprocessableEntity(
            "order number must be a sequence of digits".to_string(),
        ));
    }

    let ctx = RequestContext::new();
    let result = ctx
        .run(state.order_service.add(order_number, user.user_id))
        .await
        .map_err(|_| AppError::Timeout)?;

    match result {
        Ok(()) => Ok(StatusCode::ACCEPTED),
        Err(OrderServiceError::AlreadyUploaded { .. }) => Ok(StatusCode::OK),
        Err(e) => Err(e.into()),
    }
}

pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Response, AppError> {
    let ctx = RequestContext::new();
    let result = ctx
        .run(state.order_service.get_all(user.user_id))
        .await
        .map_err(|_| AppError::Timeout)?;

    let orders = match result {
        Ok(orders) => orders,
        Err(OrderServiceError::Store(OrderStoreError::NoOrdersForUser)) => {
            return Ok(StatusCode::NO_CONTENT.into_response())
        }
        Err(e) => return Err(e.into()),
    };

    let mut items: Vec<OrderListItem> = orders.into_iter().map(Into::into).collect();
    items.sort_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at));
    Ok(Json(items).into_response())
}
