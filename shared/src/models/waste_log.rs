//! Waste Log Model (报损记录)

use serde::{Deserialize, Serialize};

/// Waste record — append-only
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct WasteLog {
    pub id: i64,
    pub product_id: i64,
    /// Product name snapshot at record time
    pub product_name: String,
    pub quantity: i64,
    pub reason: String,
    pub recorded_by: i64,
    /// Operator name snapshot
    pub recorded_by_name: String,
    pub created_at: i64,
}

/// Create waste log payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasteLogCreate {
    pub product_id: i64,
    pub quantity: i64,
    pub reason: String,
}
