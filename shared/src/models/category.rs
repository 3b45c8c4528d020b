//! Category Model (菜单分类)

use serde::{Deserialize, Serialize};

/// Menu category. `sort_order` drives menu display ordering (ascending,
/// ties broken by name); deactivating hides it without unlinking products.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Creation payload. `sort_order` defaults to 0 when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCreate {
    pub name: String,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
}

/// Patch payload; absent fields keep their stored value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}
