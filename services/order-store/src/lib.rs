//! Postgres-backed order store.
//!
//! Order numbers are unique across all users; a duplicate insert is
//! disambiguated into "already uploaded by you" vs "already uploaded by
//! someone else" with a follow-up read, since Postgres only tells us the
//! constraint was violated, not who holds it.

pub mod error;

use async_trait::async_trait;
use error::{OrderStoreError, UNIQUE_VIOLATION};
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use types::ids::{OrderNumber, UserId};
use types::order::{Order, OrderStatus};

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn add_order_for_user(&self, order: Order) -> Result<(), OrderStoreError>;
    async fn get_all_user_orders(&self, user_id: UserId) -> Result<Vec<Order>, OrderStoreError>;
    async fn get_order(&self, number: &OrderNumber) -> Result<Order, OrderStoreError>;
    /// Silently tolerates updating an order number that no longer exists,
    /// matching the upstream repository's behavior.
    async fn update_order(&self, order: Order) -> Result<(), OrderStoreError>;
}

pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), OrderStoreError> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS orders (
                user_uuid UUID NOT NULL,
                number TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                accrual NUMERIC NOT NULL DEFAULT 0,
                uploaded_at TIMESTAMPTZ NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn add_order_for_user(&self, order: Order) -> Result<(), OrderStoreError> {
        let result = sqlx::query(
            r#"INSERT INTO orders (user_uuid, number, status, uploaded_at, accrual)
               VALUES ($1, $2, $3, $4, 0)"#,
        )
        .bind(order.user_id.as_uuid())
        .bind(order.number.as_str())
        .bind(order.status.to_string())
        .bind(order.uploaded_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                let row =
                    sqlx::query("SELECT user_uuid FROM orders WHERE number = $1")
                        .bind(order.number.as_str())
                        .fetch_one(&self.pool)
                        .await?;
                let owner: uuid::Uuid = row.try_get("user_uuid")?;

                if owner == *order.user_id.as_uuid() {
                    tracing::info!(number = %order.number, "order already uploaded from current user");
                    Err(OrderStoreError::AlreadyUploaded {
                        number: order.number.as_str().to_string(),
                    })
                } else {
                    tracing::info!(number = %order.number, "order already uploaded from another user");
                    Err(OrderStoreError::AlreadyUploadedByAnotherUser {
                        number: order.number.as_str().to_string(),
                    })
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_all_user_orders(&self, user_id: UserId) -> Result<Vec<Order>, OrderStoreError> {
        let rows = sqlx::query(
            "SELECT user_uuid, number, status, accrual, uploaded_at FROM orders WHERE user_uuid = $1 ORDER BY uploaded_at ASC",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            tracing::info!(%user_id, "no orders found for user");
            return Err(OrderStoreError::NoOrdersForUser);
        }

        rows.into_iter().map(row_to_order).collect()
    }

    async fn get_order(&self, number: &OrderNumber) -> Result<Order, OrderStoreError> {
        let row = sqlx::query(
            "SELECT user_uuid, number, status, accrual, uploaded_at FROM orders WHERE number = $1",
        )
        .bind(number.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| OrderStoreError::NotFound {
            number: number.as_str().to_string(),
        })?;

        row_to_order(row)
    }

    async fn update_order(&self, order: Order) -> Result<(), OrderStoreError> {
        sqlx::query(
            "UPDATE orders SET status = $1, accrual = $2 WHERE user_uuid = $3 AND number = $4",
        )
        .bind(order.status.to_string())
        .bind(order.accrual)
        .bind(order.user_id.as_uuid())
        .bind(order.number.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn row_to_order(row: sqlx::postgres::PgRow) -> Result<Order, OrderStoreError> {
    let user_uuid: uuid::Uuid = row.try_get("user_uuid")?;
    let number: String = row.try_get("number")?;
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<OrderStatus>()
        .map_err(|_| OrderStoreError::NotFound { number: number.clone() })?;
    Ok(Order {
        number: OrderNumber::new(number),
        user_id: UserId::from_uuid(user_uuid),
        status,
        accrual: row.try_get::<Decimal, _>("accrual")?,
        uploaded_at: row.try_get("uploaded_at")?,
    })
}
