use crate::user_store::PgUserStore;
use balance_service::BalanceService;
use ledger_store::PgBalanceStore;
use order_service::OrderService;
use order_store::PgOrderStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub order_service: Arc<OrderService<PgOrderStore>>,
    pub balance_service: Arc<BalanceService<PgBalanceStore>>,
    pub user_store: Arc<PgUserStore>,
    pub secret_key: String,
}

impl AppState {
    pub fn new(
        order_service: Arc<OrderService<PgOrderStore>>,
        balance_service: Arc<BalanceService<PgBalanceStore>>,
        user_store: Arc<PgUserStore>,
        secret_key: String,
    ) -> Self {
        Self {
            order_service,
            balance_service,
            user_store,
            secret_key,
        }
    }
}
