//! Fixed-size worker pools draining the order and balance queues.
//!
//! Each worker blocks on either cancellation or the next queue item —
//! no busy-wait `default` branch. A closed queue (the sender side
//! dropped) is a fatal condition reported to the error sink.

use balance_service::BalanceService;
use ledger_store::BalanceStore;
use order_service::OrderService;
use order_store::OrderStore;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use types::balance::BalanceOperation;
use types::order::Order;

/// Reference worker count per pool.
pub const DEFAULT_WORKER_COUNT: usize = 3;

pub struct OrderWorkerPool<S: OrderStore> {
    order_service: Arc<OrderService<S>>,
    order_queue: Arc<Mutex<mpsc::Receiver<Order>>>,
    balance_queue: mpsc::Sender<BalanceOperation>,
    error_sink: mpsc::Sender<anyhow::Error>,
    cancel: CancellationToken,
}

impl<S: OrderStore + Send + Sync + 'static> OrderWorkerPool<S> {
    pub fn new(
        order_service: Arc<OrderService<S>>,
        order_queue: mpsc::Receiver<Order>,
        balance_queue: mpsc::Sender<BalanceOperation>,
        error_sink: mpsc::Sender<anyhow::Error>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            order_service,
            order_queue: Arc::new(Mutex::new(order_queue)),
            balance_queue,
            error_sink,
            cancel,
        }
    }

    pub fn spawn(&self, count: usize) -> Vec<JoinHandle<()>> {
        (0..count)
            .map(|id| {
                let order_service = self.order_service.clone();
                let order_queue = self.order_queue.clone();
                let balance_queue = self.balance_queue.clone();
                let error_sink = self.error_sink.clone();
                let cancel = self.cancel.clone();
                tokio::spawn(async move {
                    run_order_worker(id, order_service, order_queue, balance_queue, error_sink, cancel)
                        .await
                })
            })
            .collect()
    }
}

async fn run_order_worker<S: OrderStore>(
    id: usize,
    order_service: Arc<OrderService<S>>,
    order_queue: Arc<Mutex<mpsc::Receiver<Order>>>,
    balance_queue: mpsc::Sender<BalanceOperation>,
    error_sink: mpsc::Sender<anyhow::Error>,
    cancel: CancellationToken,
) {
    loop {
        let next = {
            let mut queue = order_queue.lock().await;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(worker = id, "order worker cancelled");
                    return;
                }
                order = queue.recv() => order,
            }
        };

        let Some(order) = next else {
            let _ = error_sink
                .send(anyhow::anyhow!("order queue is closed"))
                .await;
            tracing::error!(worker = id, "order queue is closed, worker exiting");
            return;
        };

        let order_number = order.number.clone();
        let user_id = order.user_id;

        match order_service.check(order, &cancel).await {
            Ok(accrual) if accrual > rust_decimal::Decimal::ZERO => {
                let operation = BalanceOperation::accrue(user_id, order_number, accrual);
                if balance_queue.send(operation).await.is_err() {
                    let _ = error_sink
                        .send(anyhow::anyhow!("balance queue is closed"))
                        .await;
                    return;
                }
            }
            Ok(_) => {}
            Err(e) => {
                let _ = error_sink.send(anyhow::anyhow!(e.to_string())).await;
            }
        }
    }
}

pub struct BalanceWorkerPool<S: BalanceStore> {
    balance_service: Arc<BalanceService<S>>,
    balance_queue: Arc<Mutex<mpsc::Receiver<BalanceOperation>>>,
    error_sink: mpsc::Sender<anyhow::Error>,
    cancel: CancellationToken,
}

impl<S: BalanceStore + Send + Sync + 'static> BalanceWorkerPool<S> {
    pub fn new(
        balance_service: Arc<BalanceService<S>>,
        balance_queue: mpsc::Receiver<BalanceOperation>,
        error_sink: mpsc::Sender<anyhow::Error>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            balance_service,
            balance_queue: Arc::new(Mutex::new(balance_queue)),
            error_sink,
            cancel,
        }
    }

    pub fn spawn(&self, count: usize) -> Vec<JoinHandle<()>> {
        (0..count)
            .map(|id| {
                let balance_service = self.balance_service.clone();
                let balance_queue = self.balance_queue.clone();
                let error_sink = self.error_sink.clone();
                let cancel = self.cancel.clone();
                tokio::spawn(async move {
                    run_balance_worker(id, balance_service, balance_queue, error_sink, cancel).await
                })
            })
            .collect()
    }
}

async fn run_balance_worker<S: BalanceStore>(
    id: usize,
    balance_service: Arc<BalanceService<S>>,
    balance_queue: Arc<Mutex<mpsc::Receiver<BalanceOperation>>>,
    error_sink: mpsc::Sender<anyhow::Error>,
    cancel: CancellationToken,
) {
    loop {
        let next = {
            let mut queue = balance_queue.lock().await;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(worker = id, "balance worker cancelled");
                    return;
                }
                operation = queue.recv() => operation,
            }
        };

        let Some(operation) = next else {
            let _ = error_sink
                .send(anyhow::anyhow!("balance queue is closed"))
                .await;
            tracing::error!(worker = id, "balance queue is closed, worker exiting");
            return;
        };

        if let Err(e) = balance_service.execute(operation).await {
            let _ = error_sink.send(anyhow::anyhow!(e.to_string())).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accrual_client::AccrualClient;
    use async_trait::async_trait;
    use ledger_store::error::LedgerError;
    use order_store::error::OrderStoreError;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use types::balance::Balance;
    use types::ids::{OrderNumber, UserId};
    use types::order::{Order, OrderStatus};

    #[derive(Default)]
    struct FakeOrderStore {
        orders: StdMutex<Vec<Order>>,
    }

    #[async_trait]
    impl OrderStore for FakeOrderStore {
        async fn add_order_for_user(&self, order: Order) -> Result<(), OrderStoreError> {
            self.orders.lock().unwrap().push(order);
            Ok(())
        }
        async fn get_all_user_orders(&self, user_id: UserId) -> Result<Vec<Order>, OrderStoreError> {
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
            } else {
                orders.push(order);
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeBalanceStore {
        balances: StdMutex<HashMap<UserId, Balance>>,
    }

    #[async_trait]
    impl BalanceStore for FakeBalanceStore {
        async fn create_balance(&self, user_id: UserId) -> Result<(), LedgerError> {
            self.balances.lock().unwrap().insert(user_id, Balance::zero());
            Ok(())
        }
        async fn get_balance(&self, user_id: UserId) -> Result<Balance, LedgerError> {
            self.balances
                .lock()
                .unwrap()
                .get(&user_id)
                .copied()
                .ok_or(LedgerError::BalanceNotFound)
        }
        async fn get_withdraw_operations(
            &self,
            _user_id: UserId,
        ) -> Result<Vec<BalanceOperation>, LedgerError> {
            Err(LedgerError::NoWithdrawOperations)
        }
        async fn withdraw(&self, operation: BalanceOperation) -> Result<(), LedgerError> {
            let mut balances = self.balances.lock().unwrap();
            let balance = balances
                .get_mut(&operation.user_id)
                .ok_or(LedgerError::BalanceNotFound)?;
            balance.current -= operation.withdrawal;
            balance.withdrawn += operation.withdrawal;
            Ok(())
        }
        async fn accrue(&self, operation: BalanceOperation) -> Result<(), LedgerError> {
            let mut balances = self.balances.lock().unwrap();
            let balance = balances
                .get_mut(&operation.user_id)
                .ok_or(LedgerError::BalanceNotFound)?;
            balance.current += operation.accrual;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_balance_worker_pool_drains_queue() {
        let store = Arc::new(FakeBalanceStore::default());
        let user = UserId::new();
        store.create_balance(user).await.unwrap();
        let service = Arc::new(BalanceService::new(store.clone()));

        let (tx, rx) = mpsc::channel(10);
        let (err_tx, mut err_rx) = mpsc::channel(10);
        let cancel = CancellationToken::new();

        let pool = BalanceWorkerPool::new(service.clone(), rx, err_tx, cancel.clone());
        let handles = pool.spawn(2);

        tx.send(BalanceOperation::accrue(
            user,
            OrderNumber::new("12345678903"),
            rust_decimal::Decimal::new(500, 2),
        ))
        .await
        .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        for h in handles {
            let _ = h.await;
        }

        assert!(err_rx.try_recv().is_err());
        assert_eq!(
            service.get_balance(user).await.unwrap().current,
            rust_decimal::Decimal::new(500, 2)
        );
    }

    #[tokio::test]
    async fn test_order_worker_pool_reports_closed_queue() {
        let store = Arc::new(FakeOrderStore::default());
        let accrual_client = Arc::new(AccrualClient::new("http://127.0.0.1:1"));
        let (order_tx, order_rx) = mpsc::channel::<Order>(10);
        let (ingest_tx, _ingest_rx) = mpsc::channel::<Order>(10);
        let (balance_tx, _balance_rx) = mpsc::channel(10);
        let (err_tx, mut err_rx) = mpsc::channel(10);
        let cancel = CancellationToken::new();

        let service = Arc::new(OrderService::new(store, accrual_client, ingest_tx));
        let _ = OrderStatus::New;

        let pool = OrderWorkerPool::new(service, order_rx, balance_tx, err_tx, cancel.clone());
        let handles = pool.spawn(1);

        drop(order_tx);

        let err = tokio::time::timeout(Duration::from_secs(1), err_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(err.to_string().contains("order queue is closed"));

        cancel.cancel();
        for h in handles {
            let _ = h.await;
        }
    }
}
