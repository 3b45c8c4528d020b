//! Sales Report Model (销售汇总)

use serde::{Deserialize, Serialize};

/// Revenue attributed to one payment method within the range
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PaymentMethodBreakdown {
    /// Payment method wire name (cash, credit_card, ...)
    pub method: String,
    pub amount: f64,
    /// Number of orders settled with this method
    pub count: i64,
}

/// Aggregated sales figures over closed and paid orders
///
/// Computed on demand from the order rows; nothing here is persisted.
/// `average_ticket` is 0 when the range contains no orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesSummary {
    /// First business day included (YYYY-MM-DD), echoed from the query
    pub start_date: String,
    /// Last business day included (YYYY-MM-DD)
    pub end_date: String,
    pub order_count: i64,
    pub gross_revenue: f64,
    pub average_ticket: f64,
    pub discount_total: f64,
    pub service_charge_total: f64,
    #[serde(default)]
    pub payment_breakdowns: Vec<PaymentMethodBreakdown>,
}
