//! Dining Table Model (桌台)

use serde::{Deserialize, Serialize};

/// Table lifecycle status (桌台状态)
///
/// `free` tables carry no current order and no open time; this is
/// enforced both here (see repository) and by a CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum TableStatus {
    Free,
    Occupied,
    WaitingPayment,
}

impl Default for TableStatus {
    fn default() -> Self {
        Self::Free
    }
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Occupied => "occupied",
            Self::WaitingPayment => "waiting_payment",
        }
    }
}

/// One physical table on the floor plan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DiningTable {
    pub id: i64,
    /// Display number, unique across the floor
    pub number: i64,
    /// Optional label ("Varanda 2", "VIP")
    pub name: Option<String>,
    pub status: TableStatus,
    /// Seated guests, 0 while free
    pub occupants: i64,
    /// Set when the table is opened, cleared on close
    pub open_time: Option<i64>,
    /// Operator who opened the table
    pub waiter_id: Option<i64>,
    /// Active order back-reference, null while free
    pub current_order_id: Option<i64>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Creation payload; tables start free and active
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableCreate {
    pub number: i64,
    pub name: Option<String>,
}

/// Patch payload; lifecycle fields (status, order, occupants) change
/// only through open/close operations, never through update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableUpdate {
    pub number: Option<i64>,
    pub name: Option<String>,
    pub is_active: Option<bool>,
}

/// Open table payload (seats guests, creates the order)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTableOpen {
    pub occupants: i64,
    /// Defaults to the requesting operator
    pub waiter_id: Option<i64>,
}
