//! Order Model (订单)

use serde::{Deserialize, Serialize};

use super::order_item::OrderItem;

/// Order lifecycle status
///
/// Orders are never physically deleted; abandoning one moves it to
/// `canceled` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Open,
    Closed,
    Canceled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::Open
    }
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Canceled => "canceled",
        }
    }
}

/// Payment settlement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

/// Accepted payment methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    Pix,
    Other,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::CreditCard => "credit_card",
            Self::DebitCard => "debit_card",
            Self::Pix => "pix",
            Self::Other => "other",
        }
    }
}

/// Order entity
///
/// `total` is derived: `max(0, Σ(unit_price × quantity over non-canceled
/// items) − discount + service_charge)`. Every mutation of items or
/// adjustments runs the explicit recalculation pass; the stored value is
/// never trusted from the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub table_id: i64,
    pub waiter_id: Option<i64>,
    pub status: OrderStatus,
    /// Derived, rounded to 2 decimal places
    pub total: f64,
    pub discount: f64,
    pub service_charge: f64,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub closed_at: Option<i64>,
}

/// Order with its line items (detail views)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Order-level adjustment payload (discount / service charge)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAdjustments {
    pub discount: Option<f64>,
    pub service_charge: Option<f64>,
}

/// Close order payload (settles payment)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderClose {
    pub payment_method: PaymentMethod,
}
