//! Domain service wrapping the ledger store with the routing and
//! invariant-delegation rules the balance endpoints and the balance
//! worker pool both need.

use ledger_store::{error::LedgerError, BalanceStore};
use rust_decimal::Decimal;
use std::sync::Arc;
use types::balance::{Balance, BalanceOperation};
use types::ids::UserId;

pub struct BalanceService<S: BalanceStore> {
    store: Arc<S>,
}

impl<S: BalanceStore> BalanceService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn get_balance(&self, user_id: UserId) -> Result<Balance, LedgerError> {
        self.store.get_balance(user_id).await
    }

    pub async fn list_withdrawals(
        &self,
        user_id: UserId,
    ) -> Result<Vec<BalanceOperation>, LedgerError> {
        self.store.get_withdraw_operations(user_id).await
    }

    pub async fn create_balance_for_user(&self, user_id: UserId) -> Result<(), LedgerError> {
        self.store.create_balance(user_id).await
    }

    /// Routes to `withdraw` or `accrue` based on which amount is
    /// non-zero; an operation with both zero is a no-op.
    pub async fn execute(&self, operation: BalanceOperation) -> Result<(), LedgerError> {
        if operation.withdrawal > Decimal::ZERO {
            self.store.withdraw(operation).await
        } else if operation.accrual > Decimal::ZERO {
            self.store.accrue(operation).await
        } else {
            tracing::debug!(user_id = %operation.user_id, "no-op balance operation, skipping");
            Ok(())
        }
    }
}
