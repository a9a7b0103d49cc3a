use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ledger_store::error::LedgerError;
use order_service::error::OrderServiceError;
use serde_json::json;
use thiserror::Error;

use crate::user_store::UserStoreError;

/// Central error type for the gateway, mapping every domain failure onto
/// the HTTP status table.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds {
        required: rust_decimal::Decimal,
        available: rust_decimal::Decimal,
    },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("request exceeded its cancellation deadline")]
    Timeout,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::InsufficientFunds { .. } => {
                (StatusCode::PAYMENT_REQUIRED, self.to_string())
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::UnprocessableEntity(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::Timeout => (StatusCode::GATEWAY_TIMEOUT, self.to_string()),
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<UserStoreError> for AppError {
    fn from(e: UserStoreError) -> Self {
        match e {
            UserStoreError::UserExists => AppError::Conflict("login already taken".to_string()),
            UserStoreError::UserNotFound => {
                AppError::Unauthorized("wrong login or password".to_string())
            }
            UserStoreError::Database(e) => AppError::Internal(e.into()),
        }
    }
}

impl From<OrderServiceError> for AppError {
    fn from(e: OrderServiceError) -> Self {
        match e {
            OrderServiceError::InvalidOrderNumber => {
                AppError::UnprocessableEntity("order number fails the Luhn check".to_string())
            }
            OrderServiceError::AlreadyUploadedByAnotherUser { number } => AppError::Conflict(
                format!("order {number} already uploaded by another user"),
            ),
            // Handlers special-case `AlreadyUploaded` into a 200 response
            // before this conversion runs; falling through here would be
            // a handler bug, not a client error.
            OrderServiceError::AlreadyUploaded { number } => {
                AppError::Internal(anyhow::anyhow!("unhandled duplicate-order case for {number}"))
            }
            OrderServiceError::Store(e) => AppError::Internal(e.into()),
            OrderServiceError::Cancelled => {
                AppError::Internal(anyhow::anyhow!("order check was cancelled"))
            }
            OrderServiceError::Accrual(e) => AppError::Internal(e.into()),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientFunds {
                required,
                available,
            } => AppError::InsufficientFunds {
                required,
                available,
            },
            other => AppError::Internal(other.into()),
        }
    }
}
