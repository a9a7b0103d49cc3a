use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrderServiceError {
    #[error("order number fails the Luhn check")]
    InvalidOrderNumber,

    #[error("order {number} already uploaded by this user")]
    AlreadyUploaded { number: String },

    #[error("order {number} already uploaded by another user")]
    AlreadyUploadedByAnotherUser { number: String },

    #[error(transparent)]
    Store(#[from] order_store::error::OrderStoreError),

    #[error("polling cancelled")]
    Cancelled,

    #[error(transparent)]
    Accrual(#[from] accrual_client::AccrualClientError),
}
