//! Domain error taxonomy for the loyalty-points accrual service
//!
//! These are the errors storage and domain services can return; the
//! gateway maps each variant to an HTTP status code at the boundary.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("login already taken")]
    UserExists,

    #[error("user not found")]
    UserNotFound,

    #[error("wrong login or password")]
    WrongPasswordOrLogin,

    #[error("order {number} already uploaded by this user")]
    OrderAlreadyUploaded { number: String },

    #[error("order {number} already uploaded by another user")]
    OrderAlreadyUploadedByAnotherUser { number: String },

    #[error("order {number} not found")]
    OrderNotFound { number: String },

    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientFunds { required: String, available: String },

    #[error("no withdrawal operations found")]
    BalanceOperationsNotFound,

    #[error("order {number} not registered with accrual system")]
    ExternalNotRegistered { number: String },

    #[error("accrual system rate limit exceeded, retry after {retry_after_secs}s")]
    ExternalRateLimitExceeded { retry_after_secs: u64 },
}
