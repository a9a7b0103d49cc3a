//! HTTP client for the external accrual provider.
//!
//! One shared `reqwest::Client`, one GET per check, outcomes mapped to a
//! small closed set the polling state machine switches on.

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use types::order::ExternalOrderStatus;

#[derive(Debug, Deserialize)]
struct AccrualResponse {
    #[allow(dead_code)]
    order: String,
    status: ExternalOrderStatus,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    accrual: Option<Decimal>,
}

/// Outcome of a single `check` call.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    Success {
        status: ExternalOrderStatus,
        accrual: Option<Decimal>,
    },
    NotRegistered,
    RateLimited,
}

#[derive(Error, Debug)]
pub enum AccrualClientError {
    #[error("request cancelled")]
    Cancelled,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response status {0}")]
    Unexpected(u16),
}

pub struct AccrualClient {
    base_url: String,
    client: reqwest::Client,
}

impl AccrualClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Checks the status of one order number against the external
    /// provider, honoring `cancel` for cooperative shutdown.
    pub async fn check(
        &self,
        order_number: &str,
        cancel: &CancellationToken,
    ) -> Result<CheckOutcome, AccrualClientError> {
        if cancel.is_cancelled() {
            return Err(AccrualClientError::Cancelled);
        }

        let url = format!("{}/api/orders/{}", self.base_url, order_number);

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AccrualClientError::Cancelled),
            result = self
                .client
                .get(&url)
                .header("Content-Type", "application/json")
                .send() => result?,
        };

        match response.status().as_u16() {
            200 => {
                let body: AccrualResponse = response.json().await?;
                tracing::info!(%order_number, status = ?body.status, "accrual check completed");
                Ok(CheckOutcome::Success {
                    status: body.status,
                    accrual: body.accrual,
                })
            }
            204 => Ok(CheckOutcome::NotRegistered),
            429 => Ok(CheckOutcome::RateLimited),
            other => {
                tracing::error!(%order_number, status = other, "unexpected accrual response");
                Err(AccrualClientError::Unexpected(other))
            }
        }
    }
}
