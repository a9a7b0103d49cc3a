//! Postgres-backed balance ledger.
//!
//! Every write goes through a transaction that row-locks the user's
//! balance with `SELECT ... FOR UPDATE` before mutating it and
//! appending a journal entry, so concurrent withdraw/accrue calls for
//! the same user serialize instead of racing.

pub mod error;

use async_trait::async_trait;
use error::{LedgerError, UNIQUE_VIOLATION};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use types::balance::{Balance, BalanceOperation};
use types::ids::UserId;

/// Storage contract for the points ledger. A trait so tests can supply
/// an in-memory double instead of a live database.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    async fn create_balance(&self, user_id: UserId) -> Result<(), LedgerError>;
    async fn get_balance(&self, user_id: UserId) -> Result<Balance, LedgerError>;
    async fn get_withdraw_operations(
        &self,
        user_id: UserId,
    ) -> Result<Vec<BalanceOperation>, LedgerError>;
    /// Debit `operation.withdrawal` from the user's balance, failing with
    /// `InsufficientFunds` if the current balance can't cover it.
    async fn withdraw(&self, operation: BalanceOperation) -> Result<(), LedgerError>;
    /// Credit `operation.accrual` to the user's balance.
    async fn accrue(&self, operation: BalanceOperation) -> Result<(), LedgerError>;
}

pub struct PgBalanceStore {
    pool: PgPool,
}

impl PgBalanceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), LedgerError> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS user_balances (
                user_uuid UUID PRIMARY KEY NOT NULL,
                current NUMERIC NOT NULL DEFAULT 0,
                withdraw NUMERIC NOT NULL DEFAULT 0
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS balance_operations (
                uuid UUID PRIMARY KEY NOT NULL,
                user_uuid UUID NOT NULL,
                accrual NUMERIC NOT NULL DEFAULT 0,
                withdrawal NUMERIC NOT NULL DEFAULT 0,
                order_number TEXT NOT NULL UNIQUE,
                processed_at TIMESTAMPTZ NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl BalanceStore for PgBalanceStore {
    async fn create_balance(&self, user_id: UserId) -> Result<(), LedgerError> {
        let result = sqlx::query(
            "INSERT INTO user_balances (user_uuid, current, withdraw) VALUES ($1, 0, 0)",
        )
        .bind(user_id.as_uuid())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err))
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                Err(LedgerError::AlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_balance(&self, user_id: UserId) -> Result<Balance, LedgerError> {
        let row = sqlx::query(
            "SELECT current, withdraw FROM user_balances WHERE user_uuid = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(LedgerError::BalanceNotFound)?;

        Ok(Balance {
            current: row.try_get::<Decimal, _>("current")?,
            withdrawn: row.try_get::<Decimal, _>("withdraw")?,
        })
    }

    async fn get_withdraw_operations(
        &self,
        user_id: UserId,
    ) -> Result<Vec<BalanceOperation>, LedgerError> {
        let rows = sqlx::query(
            r#"SELECT uuid, user_uuid, accrual, withdrawal, order_number, processed_at
               FROM balance_operations
               WHERE user_uuid = $1 AND withdrawal > 0
               ORDER BY processed_at ASC"#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            tracing::info!(%user_id, "no withdraw operations found");
            return Err(LedgerError::NoWithdrawOperations);
        }

        let mut operations = Vec::with_capacity(rows.len());
        for row in rows {
            let uuid: uuid::Uuid = row.try_get("uuid")?;
            let user_uuid: uuid::Uuid = row.try_get("user_uuid")?;
            let order_number: String = row.try_get("order_number")?;
            operations.push(BalanceOperation {
                id: types::ids::OperationId::from_uuid(uuid),
                user_id: UserId::from_uuid(user_uuid),
                order_number: types::ids::OrderNumber::new(order_number),
                accrual: row.try_get("accrual")?,
                withdrawal: row.try_get("withdrawal")?,
                processed_at: row.try_get("processed_at")?,
            });
        }
        Ok(operations)
    }

    async fn withdraw(&self, operation: BalanceOperation) -> Result<(), LedgerError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT current, withdraw FROM user_balances WHERE user_uuid = $1 FOR UPDATE",
        )
        .bind(operation.user_id.as_uuid())
        .fetch_one(&mut *tx)
        .await?;

        let current: Decimal = row.try_get("current")?;
        let withdrawn: Decimal = row.try_get("withdraw")?;

        if current < operation.withdrawal {
            tx.rollback().await?;
            return Err(LedgerError::InsufficientFunds {
                required: operation.withdrawal,
                available: current,
            });
        }

        let new_current = current - operation.withdrawal;
        sqlx::query(
            "UPDATE user_balances SET current = $1, withdraw = $2 WHERE user_uuid = $3",
        )
        .bind(new_current)
        .bind(withdrawn + operation.withdrawal)
        .bind(operation.user_id.as_uuid())
        .execute(&mut *tx)
        .await?;

        insert_operation(&mut tx, &operation).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn accrue(&self, operation: BalanceOperation) -> Result<(), LedgerError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT current FROM user_balances WHERE user_uuid = $1 FOR UPDATE")
            .bind(operation.user_id.as_uuid())
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE user_balances SET current = current + $1 WHERE user_uuid = $2")
            .bind(operation.accrual)
            .bind(operation.user_id.as_uuid())
            .execute(&mut *tx)
            .await?;

        insert_operation(&mut tx, &operation).await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Inserts the journal row. Rolling back on error is the caller's
/// responsibility; `sqlx::Transaction` also rolls back automatically if
/// dropped uncommitted, so an early `?` return is safe either way.
async fn insert_operation(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    operation: &BalanceOperation,
) -> Result<(), LedgerError> {
    let result = sqlx::query(
        r#"INSERT INTO balance_operations
               (uuid, user_uuid, accrual, withdrawal, order_number, processed_at)
           VALUES ($1, $2, $3, $4, $5, $6)"#,
    )
    .bind(operation.id.as_uuid())
    .bind(operation.user_id.as_uuid())
    .bind(operation.accrual)
    .bind(operation.withdrawal)
    .bind(operation.order_number.as_str())
    .bind(operation.processed_at)
    .execute(&mut **tx)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            Err(LedgerError::DuplicateOrder {
                order_number: operation.order_number.as_str().to_string(),
            })
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use types::ids::OrderNumber;

    /// In-memory double mirroring the Postgres transaction semantics,
    /// used to exercise `BalanceStore` call sites without a live database.
    #[derive(Default)]
    struct FakeBalanceStore {
        balances: Mutex<HashMap<UserId, Balance>>,
        operations: Mutex<Vec<BalanceOperation>>,
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
            user_id: UserId,
        ) -> Result<Vec<BalanceOperation>, LedgerError> {
            let ops: Vec<_> = self
                .operations
                .lock()
                .unwrap()
                .iter()
                .filter(|o| o.user_id == user_id && o.withdrawal > Decimal::ZERO)
                .cloned()
                .collect();
            if ops.is_empty() {
                Err(LedgerError::NoWithdrawOperations)
            } else {
                Ok(ops)
            }
        }

        async fn withdraw(&self, operation: BalanceOperation) -> Result<(), LedgerError> {
            let mut balances = self.balances.lock().unwrap();
            let balance = balances
                .get_mut(&operation.user_id)
                .ok_or(LedgerError::BalanceNotFound)?;
            if balance.current < operation.withdrawal {
                return Err(LedgerError::InsufficientFunds {
                    required: operation.withdrawal,
                    available: balance.current,
                });
            }
            balance.current -= operation.withdrawal;
            balance.withdrawn += operation.withdrawal;
            self.operations.lock().unwrap().push(operation);
            Ok(())
        }

        async fn accrue(&self, operation: BalanceOperation) -> Result<(), LedgerError> {
            let mut balances = self.balances.lock().unwrap();
            let balance = balances
                .get_mut(&operation.user_id)
                .ok_or(LedgerError::BalanceNotFound)?;
            balance.current += operation.accrual;
            self.operations.lock().unwrap().push(operation);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_accrue_then_withdraw_conserves_total() {
        let store = FakeBalanceStore::default();
        let user = UserId::new();
        store.create_balance(user).await.unwrap();

        store
            .accrue(BalanceOperation::accrue(
                user,
                OrderNumber::new("12345678903"),
                Decimal::new(50000, 2),
            ))
            .await
            .unwrap();

        store
            .withdraw(BalanceOperation::withdraw(
                user,
                OrderNumber::new("2377225624"),
                Decimal::new(20000, 2),
            ))
            .await
            .unwrap();

        let balance = store.get_balance(user).await.unwrap();
        assert_eq!(balance.current, Decimal::new(30000, 2));
        assert_eq!(balance.withdrawn, Decimal::new(20000, 2));
    }

    #[tokio::test]
    async fn test_withdraw_insufficient_funds() {
        let store = FakeBalanceStore::default();
        let user = UserId::new();
        store.create_balance(user).await.unwrap();

        let err = store
            .withdraw(BalanceOperation::withdraw(
                user,
                OrderNumber::new("2377225624"),
                Decimal::new(10000, 2),
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
        assert_eq!(store.get_balance(user).await.unwrap().current, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_no_withdraw_operations_is_an_error() {
        let store = FakeBalanceStore::default();
        let user = UserId::new();
        store.create_balance(user).await.unwrap();

        let err = store.get_withdraw_operations(user).await.unwrap_err();
        assert!(matches!(err, LedgerError::NoWithdrawOperations));
    }

    #[tokio::test]
    async fn test_balance_never_negative_across_many_withdrawals() {
        let store = FakeBalanceStore::default();
        let user = UserId::new();
        store.create_balance(user).await.unwrap();
        store
            .accrue(BalanceOperation::accrue(
                user,
                OrderNumber::new("12345678903"),
                Decimal::new(10000, 2),
            ))
            .await
            .unwrap();

        for _ in 0..3 {
            let _ = store
                .withdraw(BalanceOperation::withdraw(
                    user,
                    OrderNumber::new("2377225624"),
                    Decimal::new(6000, 2),
                ))
                .await;
        }

        assert!(store.get_balance(user).await.unwrap().current >= Decimal::ZERO);
    }
}
