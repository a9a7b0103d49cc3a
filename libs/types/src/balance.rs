//! Balance and balance-operation journal types
//!
//! Every user has exactly one `Balance` row, updated transactionally by
//! the ledger store. `BalanceOperation` is an append-only journal entry
//! recording either an accrual (credit) or a withdrawal (debit) against
//! a specific order number.

use crate::ids::{OperationId, OrderNumber, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Current and lifetime-withdrawn points for a user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub current: Decimal,
    pub withdrawn: Decimal,
}

impl Balance {
    pub fn zero() -> Self {
        Self {
            current: Decimal::ZERO,
            withdrawn: Decimal::ZERO,
        }
    }
}

/// A single journal entry: either a credit (`accrual > 0`) from order
/// processing or a debit (`withdrawal > 0`) requested by the user.
/// Exactly one of the two fields is non-zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceOperation {
    pub id: OperationId,
    pub user_id: UserId,
    pub order_number: OrderNumber,
    pub accrual: Decimal,
    pub withdrawal: Decimal,
    pub processed_at: DateTime<Utc>,
}

impl BalanceOperation {
    pub fn accrue(user_id: UserId, order_number: OrderNumber, accrual: Decimal) -> Self {
        Self {
            id: OperationId::new(),
            user_id,
            order_number,
            accrual,
            withdrawal: Decimal::ZERO,
            processed_at: Utc::now(),
        }
    }

    pub fn withdraw(user_id: UserId, order_number: OrderNumber, withdrawal: Decimal) -> Self {
        Self {
            id: OperationId::new(),
            user_id,
            order_number,
            accrual: Decimal::ZERO,
            withdrawal,
            processed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_zero() {
        let b = Balance::zero();
        assert_eq!(b.current, Decimal::ZERO);
        assert_eq!(b.withdrawn, Decimal::ZERO);
    }

    #[test]
    fn test_accrue_operation_shape() {
        let op = BalanceOperation::accrue(
            UserId::new(),
            OrderNumber::new("12345678903"),
            Decimal::new(500, 2),
        );
        assert_eq!(op.withdrawal, Decimal::ZERO);
        assert_eq!(op.accrual, Decimal::new(500, 2));
    }

    #[test]
    fn test_withdraw_operation_shape() {
        let op = BalanceOperation::withdraw(
            UserId::new(),
            OrderNumber::new("12345678903"),
            Decimal::new(100, 2),
        );
        assert_eq!(op.accrual, Decimal::ZERO);
        assert_eq!(op.withdrawal, Decimal::new(100, 2));
    }

    #[test]
    fn test_balance_operation_serialization() {
        let op = BalanceOperation::accrue(
            UserId::new(),
            OrderNumber::new("12345678903"),
            Decimal::new(500, 2),
        );
        let json = serde_json::to_string(&op).unwrap();
        let deserialized: BalanceOperation = serde_json::from_str(&json).unwrap();
        assert_eq!(op, deserialized);
    }
}
