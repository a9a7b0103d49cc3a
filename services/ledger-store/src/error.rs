use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientFunds {
        required: rust_decimal::Decimal,
        available: rust_decimal::Decimal,
    },

    #[error("no withdrawal operations found")]
    NoWithdrawOperations,

    #[error("balance for user not found")]
    BalanceNotFound,

    #[error("a balance already exists for this user")]
    AlreadyExists,

    #[error("an operation for order {order_number} already exists")]
    DuplicateOrder { order_number: String },
}

/// Postgres unique-violation error code.
pub const UNIQUE_VIOLATION: &str = "23505";
