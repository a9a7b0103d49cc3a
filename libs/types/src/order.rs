//! Order lifecycle types
//!
//! An order is created with status `New`, transitions through
//! `Processing`, and settles in one of the two terminal states
//! `Processed`/`Invalid`. Orders are never deleted.

use crate::ids::{OrderNumber, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order status as stored by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    New,
    Processing,
    Invalid,
    Processed,
}

impl OrderStatus {
    /// Terminal statuses need no further polling.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Processed | OrderStatus::Invalid)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::New => "NEW",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Invalid => "INVALID",
            OrderStatus::Processed => "PROCESSED",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(OrderStatus::New),
            "PROCESSING" => Ok(OrderStatus::Processing),
            "INVALID" => Ok(OrderStatus::Invalid),
            "PROCESSED" => Ok(OrderStatus::Processed),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// Status reported by the external accrual provider. Distinct from
/// `OrderStatus`: `Registered` has no counterpart in our stored status,
/// it maps to `OrderStatus::Processing` on first observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExternalOrderStatus {
    Registered,
    Processing,
    Invalid,
    Processed,
}

impl ExternalOrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExternalOrderStatus::Processed | ExternalOrderStatus::Invalid
        )
    }
}

/// An order placed by a user, awaiting or having completed accrual
/// processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub number: OrderNumber,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub accrual: Decimal,
    pub uploaded_at: DateTime<Utc>,
}

impl Order {
    /// Construct a freshly-ingested order: status NEW, zero accrual.
    pub fn new(number: OrderNumber, user_id: UserId) -> Self {
        Self {
            number,
            user_id,
            status: OrderStatus::New,
            accrual: Decimal::ZERO,
            uploaded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_new_defaults() {
        let order = Order::new(OrderNumber::new("12345678903"), UserId::new());
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.accrual, Decimal::ZERO);
        assert!(!order.status.is_terminal());
    }

    #[test]
    fn test_status_terminal() {
        assert!(OrderStatus::Processed.is_terminal());
        assert!(OrderStatus::Invalid.is_terminal());
        assert!(!OrderStatus::New.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
    }

    #[test]
    fn test_status_round_trip() {
        for s in [
            OrderStatus::New,
            OrderStatus::Processing,
            OrderStatus::Invalid,
            OrderStatus::Processed,
        ] {
            let parsed: OrderStatus = s.to_string().parse().unwrap();
            assert_eq!(s, parsed);
        }
    }

    #[test]
    fn test_order_serialization() {
        let order = Order::new(OrderNumber::new("12345678903"), UserId::new());
        let json = serde_json::to_string(&order).unwrap();
        let deserialized: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, deserialized);
    }
}
