//! Product Model (菜单商品)

use serde::{Deserialize, Serialize};

/// Menu item. `price` is the current menu price; order items copy it at
/// add time, so later edits here never touch existing orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    pub price: f64,
    pub description: Option<String>,
    pub sort_order: i32,
    /// Soft-delete flag
    pub is_active: bool,
    /// Kitchen availability toggle (86'd items stay listed but unorderable)
    pub is_available: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Creation payload; new products start active and available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    pub category_id: i64,
    pub price: f64,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
}

/// Patch payload; absent fields keep their stored value. Availability
/// is toggled through [`ProductAvailability`], not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub category_id: Option<i64>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// Availability toggle payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductAvailability {
    pub is_available: bool,
}
