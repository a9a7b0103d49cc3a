//! Order ingestion and the per-order accrual-polling state machine.

pub mod error;
pub mod luhn;

use accrual_client::{AccrualClient, CheckOutcome};
use error::OrderServiceError;
use order_store::error::OrderStoreError;
use order_store::OrderStore;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use types::ids::{OrderNumber, UserId};
use types::order::{ExternalOrderStatus, Order, OrderStatus};

const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(61);
const RETRY_BACKOFF: Duration = Duration::from_millis(100);

pub struct OrderService<S: OrderStore> {
    store: Arc<S>,
    accrual_client: Arc<AccrualClient>,
    order_queue: mpsc::Sender<Order>,
}

impl<S: OrderStore> OrderService<S> {
    pub fn new(
        store: Arc<S>,
        accrual_client: Arc<AccrualClient>,
        order_queue: mpsc::Sender<Order>,
    ) -> Self {
        Self {
            store,
            accrual_client,
            order_queue,
        }
    }

    /// Validates, records, and enqueues a freshly-ingested order. Blocks
    /// if the order queue is full, which backpressures the HTTP handler.
    pub async fn add(
        &self,
        order_number: &str,
        user_id: UserId,
    ) -> Result<(), OrderServiceError> {
        if !luhn::is_valid(order_number) {
            return Err(OrderServiceError::InvalidOrderNumber);
        }

        let order = Order::new(OrderNumber::new(order_number), user_id);

        match self.store.add_order_for_user(order.clone()).await {
            Ok(()) => {}
            Err(OrderStoreError::AlreadyUploaded { number }) => {
                return Err(OrderServiceError::AlreadyUploaded { number })
            }
            Err(OrderStoreError::AlreadyUploadedByAnotherUser { number }) => {
                return Err(OrderServiceError::AlreadyUploadedByAnotherUser { number })
            }
            Err(e) => return Err(e.into()),
        }

        // Backpressure: a full queue makes the caller wait, bounded by the
        // request's own cancellation deadline.
        let _ = self.order_queue.send(order).await;
        Ok(())
    }

    pub async fn get_all(&self, user_id: UserId) -> Result<Vec<Order>, OrderServiceError> {
        Ok(self.store.get_all_user_orders(user_id).await?)
    }

    pub async fn update(&self, order: Order) -> Result<(), OrderServiceError> {
        Ok(self.store.update_order(order).await?)
    }

    /// Polls the external provider until the order reaches a terminal
    /// state, persisting status transitions along the way. Returns the
    /// final accrual (zero for INVALID).
    pub async fn check(
        &self,
        mut order: Order,
        cancel: &CancellationToken,
    ) -> Result<Decimal, OrderServiceError> {
        loop {
            if cancel.is_cancelled() {
                return Err(OrderServiceError::Cancelled);
            }

            let outcome = self
                .accrual_client
                .check(order.number.as_str(), cancel)
                .await?;

            match outcome {
                CheckOutcome::RateLimited => {
                    tokio::time::sleep(RATE_LIMIT_BACKOFF).await;
                    continue;
                }
                CheckOutcome::NotRegistered => {
                    tokio::time::sleep(RETRY_BACKOFF).await;
                    continue;
                }
                CheckOutcome::Success { status, accrual } => match status {
                    ExternalOrderStatus::Registered | ExternalOrderStatus::Processing => {
                        if order.status != OrderStatus::Processing {
                            order.status = OrderStatus::Processing;
                            self.store.update_order(order.clone()).await?;
                        }
                        tokio::time::sleep(RETRY_BACKOFF).await;
                        continue;
                    }
                    ExternalOrderStatus::Processed => {
                        let accrual = accrual.unwrap_or(Decimal::ZERO);
                        order.status = OrderStatus::Processed;
                        order.accrual = accrual;
                        self.store.update_order(order).await?;
                        return Ok(accrual);
                    }
                    ExternalOrderStatus::Invalid => {
                        order.status = OrderStatus::Invalid;
                        order.accrual = Decimal::ZERO;
                        self.store.update_order(order).await?;
                        return Ok(Decimal::ZERO);
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_rejects_luhn_invalid_number() {
        assert!(!luhn::is_valid("12345678900"));
    }

    #[tokio::test]
    async fn test_order_queue_receives_enqueued_order() {
        use async_trait::async_trait;
        use std::sync::Mutex;

        #[derive(Default)]
        struct FakeOrderStore {
            orders: Mutex<Vec<Order>>,
        }

        #[async_trait]
        impl OrderStore for FakeOrderStore {
            async fn add_order_for_user(&self, order: Order) -> Result<(), OrderStoreError> {
                self.orders.lock().unwrap().push(order);
                Ok(())
            }
            async fn get_all_user_orders(
                &self,
                user_id: UserId,
            ) -> Result<Vec<Order>, OrderStoreError> {
                Ok(self
                    .orders
                    .lock()
                    .unwrap()
                    .iter()
                    .filter(|o| o.user_id == user_id)
                    .cloned()
                    .collect())
            }
            async fn get_order(&self, number: &OrderNumber) -> Result<Order, OrderStoreError> {
                self.orders
                    .lock()
                    .unwrap()
                    .iter()
                    .find(|o| &o.number == number)
                    .cloned()
                    .ok_or_else(|| OrderStoreError::NotFound {
                        number: number.as_str().to_string(),
                    })
            }
            async fn update_order(&self, order: Order) -> Result<(), OrderStoreError> {
                let mut orders = self.orders.lock().unwrap();
                if let Some(existing) = orders.iter_mut().find(|o| o.number == order.number) {
                    existing.status = order.status;
                    existing.accrual = order.accrual;
                }
                Ok(())
            }
        }

        let store = Arc::new(FakeOrderStore::default());
        let accrual_client = Arc::new(AccrualClient::new("http://127.0.0.1:1"));
        let (tx, mut rx) = mpsc::channel(100);
        let service = OrderService::new(store, accrual_client, tx);

        let user = UserId::new();
        service.add("12345678903", user).await.unwrap();

        let queued = rx.try_recv().unwrap();
        assert_eq!(queued.number.as_str(), "12345678903");
        assert_eq!(queued.user_id, user);
    }

    #[tokio::test]
    async fn test_add_invalid_luhn_number_is_rejected() {
        use async_trait::async_trait;
        use std::sync::Mutex;

        #[derive(Default)]
        struct FakeOrderStore {
            orders: Mutex<Vec<Order>>,
        }

        #[async_trait]
        impl OrderStore for FakeOrderStore {
            async fn add_order_for_user(&self, order: Order) -> Result<(), OrderStoreError> {
                self.orders.lock().unwrap().push(order);
                Ok(())
            }
            async fn get_all_user_orders(
                &self,
                _user_id: UserId,
            ) -> Result<Vec<Order>, OrderStoreError> {
                Ok(vec![])
            }
            async fn get_order(&self, number: &OrderNumber) -> Result<Order, OrderStoreError> {
                Err(OrderStoreError::NotFound {
                    number: number.as_str().to_string(),
                })
            }
            async fn update_order(&self, _order: Order) -> Result<(), OrderStoreError> {
                Ok(())
            }
        }

        let store = Arc::new(FakeOrderStore::default());
        let accrual_client = Arc::new(AccrualClient::new("http://127.0.0.1:1"));
        let (tx, _rx) = mpsc::channel(100);
        let service = OrderService::new(store, accrual_client, tx);

        let err = service
            .add("12345678900", UserId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, OrderServiceError::InvalidOrderNumber));
    }
}
