//! Alert Model (系统告警)
//!
//! Advisory records produced by the background monitor and by the cash
//! ledger. Alerts never drive control flow; their title/message text is
//! computed once at creation from the triggering entity's snapshot.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::cash_register::CashRegister;
use super::dining_table::DiningTable;
use super::order::Order;

/// Closed set of anomaly kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    LongTableOccupation,
    HighValueOrder,
    CashDiscrepancy,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LongTableOccupation => "long_table_occupation",
            Self::HighValueOrder => "high_value_order",
            Self::CashDiscrepancy => "cash_discrepancy",
        }
    }
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Alert lifecycle
///
/// pending → acknowledged → resolved | dismissed. Dismissal is allowed
/// straight from pending as well; resolved/dismissed are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Pending,
    Acknowledged,
    Resolved,
    Dismissed,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Acknowledged => "acknowledged",
            Self::Resolved => "resolved",
            Self::Dismissed => "dismissed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Dismissed)
    }
}

/// Alert record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Alert {
    pub id: i64,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub status: AlertStatus,
    pub title: String,
    pub message: String,
    pub table_id: Option<i64>,
    pub order_id: Option<i64>,
    pub register_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub user_id: Option<i64>,
    pub product_id: Option<i64>,
    /// Snapshot values from the triggering entity (flexible schema)
    #[cfg_attr(feature = "db", sqlx(json))]
    pub data: HashMap<String, String>,
    pub acknowledged_at: Option<i64>,
    /// Also stamped on dismissal (terminal timestamp)
    pub resolved_at: Option<i64>,
    pub created_at: i64,
}

/// Create alert payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertCreate {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub table_id: Option<i64>,
    #[serde(default)]
    pub order_id: Option<i64>,
    #[serde(default)]
    pub register_id: Option<i64>,
    #[serde(default)]
    pub customer_id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub data: HashMap<String, String>,
}

// ========== Static constructors ==========
//
// One per producer. Title/message are derived from the entity snapshot at
// creation time; nothing re-reads them later.

impl AlertCreate {
    /// Table seated too long without payment.
    ///
    /// Severity: `high` past 3 hours, `medium` otherwise (the scan only
    /// fires past 2 hours).
    pub fn long_table_occupation(table: &DiningTable, order: &Order, minutes_open: i64) -> Self {
        let severity = if minutes_open > 180 {
            AlertSeverity::High
        } else {
            AlertSeverity::Medium
        };
        let hours = minutes_open / 60;
        let minutes = minutes_open % 60;
        let label = match &table.name {
            Some(name) => format!("Table {} ({})", table.number, name),
            None => format!("Table {}", table.number),
        };
        let mut data = HashMap::new();
        data.insert("minutes_open".into(), minutes_open.to_string());
        data.insert("order_total".into(), format!("{:.2}", order.total));
        Self {
            kind: AlertKind::LongTableOccupation,
            severity,
            title: format!("{} occupied for {}h{:02}m", label, hours, minutes),
            message: format!(
                "{} has been occupied for {}h{:02}m with an unpaid order of R$ {:.2}. \
                 Check whether the guests still need service or the bill.",
                label, hours, minutes, order.total
            ),
            table_id: Some(table.id),
            order_id: Some(order.id),
            register_id: None,
            customer_id: None,
            user_id: order.waiter_id,
            product_id: None,
            data,
        }
    }

    /// Open order crossed the high-value threshold.
    pub fn high_value_order(order: &Order) -> Self {
        let mut data = HashMap::new();
        data.insert("order_total".into(), format!("{:.2}", order.total));
        Self {
            kind: AlertKind::HighValueOrder,
            severity: AlertSeverity::Medium,
            title: format!("High-value order: R$ {:.2}", order.total),
            message: format!(
                "Order {} on table {} reached R$ {:.2} while still open. \
                 Consider confirming the items with the guests.",
                order.id, order.table_id, order.total
            ),
            table_id: Some(order.table_id),
            order_id: Some(order.id),
            register_id: None,
            customer_id: None,
            user_id: order.waiter_id,
            product_id: None,
            data,
        }
    }

    /// Physical cash count disagreed with the computed balance at close.
    pub fn cash_discrepancy(
        register: &CashRegister,
        expected: f64,
        counted: f64,
        user_id: i64,
    ) -> Self {
        let diff = counted - expected;
        let severity = if diff.abs() >= 50.0 {
            AlertSeverity::High
        } else {
            AlertSeverity::Medium
        };
        let mut data = HashMap::new();
        data.insert("expected".into(), format!("{:.2}", expected));
        data.insert("counted".into(), format!("{:.2}", counted));
        data.insert("difference".into(), format!("{:.2}", diff));
        Self {
            kind: AlertKind::CashDiscrepancy,
            severity,
            title: format!(
                "Cash discrepancy on {}: R$ {:+.2}",
                register.identifier, diff
            ),
            message: format!(
                "Register {} closed with a counted amount of R$ {:.2} against a \
                 computed balance of R$ {:.2} (difference R$ {:+.2}).",
                register.identifier, counted, expected, diff
            ),
            table_id: None,
            order_id: None,
            register_id: Some(register.id),
            customer_id: None,
            user_id: Some(user_id),
            product_id: None,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::{OrderStatus, PaymentStatus};
    use crate::models::dining_table::TableStatus;

    fn sample_table() -> DiningTable {
        DiningTable {
            id: 1,
            number: 5,
            name: None,
            status: TableStatus::Occupied,
            occupants: 2,
            open_time: Some(0),
            waiter_id: Some(9),
            current_order_id: Some(2),
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn sample_order(total: f64) -> Order {
        Order {
            id: 2,
            table_id: 1,
            waiter_id: Some(9),
            status: OrderStatus::Open,
            total,
            discount: 0.0,
            service_charge: 0.0,
            payment_method: None,
            payment_status: PaymentStatus::Pending,
            notes: None,
            created_at: 0,
            updated_at: 0,
            closed_at: None,
        }
    }

    #[test]
    fn long_occupation_severity_boundary() {
        let table = sample_table();
        let order = sample_order(80.0);
        let medium = AlertCreate::long_table_occupation(&table, &order, 130);
        assert_eq!(medium.severity, AlertSeverity::Medium);
        let still_medium = AlertCreate::long_table_occupation(&table, &order, 180);
        assert_eq!(still_medium.severity, AlertSeverity::Medium);
        let high = AlertCreate::long_table_occupation(&table, &order, 181);
        assert_eq!(high.severity, AlertSeverity::High);
        assert!(high.title.contains("Table 5"));
        assert_eq!(high.table_id, Some(1));
        assert_eq!(high.order_id, Some(2));
    }

    #[test]
    fn high_value_carries_order_snapshot() {
        let alert = AlertCreate::high_value_order(&sample_order(550.0));
        assert_eq!(alert.kind, AlertKind::HighValueOrder);
        assert!(alert.title.contains("550.00"));
        assert_eq!(alert.data.get("order_total").map(String::as_str), Some("550.00"));
    }
}
