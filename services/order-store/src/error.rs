use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrderStoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("order {number} already uploaded by this user")]
    AlreadyUploaded { number: String },

    #[error("order {number} already uploaded by another user")]
    AlreadyUploadedByAnotherUser { number: String },

    #[error("order {number} not found")]
    NotFound { number: String },

    #[error("no orders found for user")]
    NoOrdersForUser,
}

/// Postgres unique-violation error code, used to detect a duplicate
/// order number on insert.
pub const UNIQUE_VIOLATION: &str = "23505";
