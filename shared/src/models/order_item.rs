//! Order Item Model

use serde::{Deserialize, Serialize};

/// Order item kitchen status
///
/// Forward-only workflow: pending → preparing → ready → delivered, with
/// canceled reachable from any non-terminal state. `delivered` and
/// `canceled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderItemStatus {
    Pending,
    Preparing,
    Ready,
    Delivered,
    Canceled,
}

impl Default for OrderItemStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl OrderItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Preparing => "preparing",
            Self::Ready => "ready",
            Self::Delivered => "delivered",
            Self::Canceled => "canceled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Canceled)
    }

    /// Workflow position for forward-only checks (canceled excluded)
    fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Preparing => 1,
            Self::Ready => 2,
            Self::Delivered => 3,
            Self::Canceled => u8::MAX,
        }
    }

    /// Whether `next` is a legal transition from `self`
    pub fn can_transition_to(&self, next: OrderItemStatus) -> bool {
        if self.is_terminal() || *self == next {
            return false;
        }
        if next == Self::Canceled {
            return true;
        }
        next.rank() > self.rank()
    }
}

/// Order line item
///
/// `unit_price` is snapshotted from the product at add time and never
/// follows later catalog price changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    /// Product name snapshot (kitchen display survives catalog edits)
    pub product_name: String,
    pub quantity: i64,
    /// Price snapshot at add time
    pub unit_price: f64,
    pub status: OrderItemStatus,
    pub notes: Option<String>,
    /// Stamped once, on the first transition into `preparing`
    pub preparation_start_time: Option<i64>,
    /// Stamped once, on the first transition into `delivered`
    pub delivery_time: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Add item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemCreate {
    pub product_id: i64,
    pub quantity: i64,
    pub notes: Option<String>,
}

/// Item status update payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemStatusUpdate {
    pub status: OrderItemStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions_allowed() {
        assert!(OrderItemStatus::Pending.can_transition_to(OrderItemStatus::Preparing));
        assert!(OrderItemStatus::Preparing.can_transition_to(OrderItemStatus::Ready));
        assert!(OrderItemStatus::Ready.can_transition_to(OrderItemStatus::Delivered));
        // skipping a stage is fine (counter service)
        assert!(OrderItemStatus::Pending.can_transition_to(OrderItemStatus::Ready));
    }

    #[test]
    fn backward_and_terminal_transitions_rejected() {
        assert!(!OrderItemStatus::Ready.can_transition_to(OrderItemStatus::Preparing));
        assert!(!OrderItemStatus::Delivered.can_transition_to(OrderItemStatus::Ready));
        assert!(!OrderItemStatus::Canceled.can_transition_to(OrderItemStatus::Pending));
        assert!(!OrderItemStatus::Pending.can_transition_to(OrderItemStatus::Pending));
    }

    #[test]
    fn cancel_reachable_from_active_states() {
        assert!(OrderItemStatus::Pending.can_transition_to(OrderItemStatus::Canceled));
        assert!(OrderItemStatus::Preparing.can_transition_to(OrderItemStatus::Canceled));
        assert!(OrderItemStatus::Ready.can_transition_to(OrderItemStatus::Canceled));
        assert!(!OrderItemStatus::Delivered.can_transition_to(OrderItemStatus::Canceled));
    }
}
