//! Per-request cancellation. Every handler opens one of these on entry;
//! it supersedes whatever context the inbound request carried and cuts
//! the handler off after `REQUEST_TIMEOUT` regardless of what the
//! handler is still awaiting — a stalled storage or accrual call can't
//! hang a request past the deadline.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct RequestContext {
    cancel: CancellationToken,
}

/// The deadline won the race; `fut` was dropped before it completed.
pub struct DeadlineExceeded;

impl RequestContext {
    pub fn new() -> Self {
        let cancel = CancellationToken::new();
        let deadline = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(REQUEST_TIMEOUT).await;
            deadline.cancel();
        });
        Self { cancel }
    }

    /// Races `fut` against the deadline.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, DeadlineExceeded> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(DeadlineExceeded),
            out = fut => Ok(out),
        }
    }

    /// Like `run`, but also flattens the inner `Result` into `AppError`,
    /// for call sites that don't need to pattern-match the domain error.
    pub async fn guard<F, T, E>(&self, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<AppError>,
    {
        match self.run(fut).await {
            Ok(inner) => inner.map_err(Into::into),
            Err(DeadlineExceeded) => Err(AppError::Timeout),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
