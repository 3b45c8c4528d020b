//! Products Repository

use super::{RepoError, RepoResult};
use crate::money;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text,
};
use shared::models::{Product, ProductCreate, ProductUpdate};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const PRODUCT_COLUMNS: &str = "id, name, category_id, price, description, sort_order, is_active, is_available, created_at, updated_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(product)
}

/// List products, optionally restricted to one category
pub async fn find_all(
    pool: &SqlitePool,
    category_id: Option<i64>,
    include_inactive: bool,
) -> RepoResult<Vec<Product>> {
    let mut sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE 1=1");
    if !include_inactive {
        sql.push_str(" AND is_active = 1");
    }
    if category_id.is_some() {
        sql.push_str(" AND category_id = ?");
    }
    sql.push_str(" ORDER BY sort_order, name");

    let mut query = sqlx::query_as::<_, Product>(&sql);
    if let Some(cid) = category_id {
        query = query.bind(cid);
    }
    let products = query.fetch_all(pool).await?;
    Ok(products)
}

pub async fn create(pool: &SqlitePool, data: ProductCreate) -> RepoResult<Product> {
    validate_required_text(&data.name, "name", MAX_NAME_LEN)
        .map_err(|e| RepoError::Validation(e.to_string()))?;
    validate_optional_text(&data.description, "description", MAX_NOTE_LEN)
        .map_err(|e| RepoError::Validation(e.to_string()))?;
    money::validate_non_negative_amount(data.price, "price")
        .map_err(|e| RepoError::Validation(e.to_string()))?;

    let category_exists = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM categories WHERE id = ? AND is_active = 1",
    )
    .bind(data.category_id)
    .fetch_one(pool)
    .await?;
    if category_exists == 0 {
        return Err(RepoError::Validation(format!(
            "Category {} not found or inactive",
            data.category_id
        )));
    }

    let now = now_millis();
    let id = snowflake_id();

    sqlx::query(
        "INSERT INTO products (id, name, category_id, price, description, sort_order, is_active, is_available, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, 1, 1, ?, ?)",
    )
    .bind(id)
    .bind(data.name.trim())
    .bind(data.category_id)
    .bind(money::round_money(data.price))
    .bind(&data.description)
    .bind(data.sort_order.unwrap_or(0))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create product".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: ProductUpdate) -> RepoResult<Product> {
    if let Some(name) = &data.name {
        validate_required_text(name, "name", MAX_NAME_LEN)
            .map_err(|e| RepoError::Validation(e.to_string()))?;
    }
    validate_optional_text(&data.description, "description", MAX_NOTE_LEN)
        .map_err(|e| RepoError::Validation(e.to_string()))?;
    if let Some(price) = data.price {
        money::validate_non_negative_amount(price, "price")
            .map_err(|e| RepoError::Validation(e.to_string()))?;
    }

    if let Some(cid) = data.category_id {
        let category_exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM categories WHERE id = ? AND is_active = 1",
        )
        .bind(cid)
        .fetch_one(pool)
        .await?;
        if category_exists == 0 {
            return Err(RepoError::Validation(format!(
                "Category {cid} not found or inactive"
            )));
        }
    }

    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE products SET name = COALESCE(?, name), category_id = COALESCE(?, category_id), price = COALESCE(?, price), description = COALESCE(?, description), sort_order = COALESCE(?, sort_order), is_active = COALESCE(?, is_active), updated_at = ? WHERE id = ?",
    )
    .bind(data.name.as_deref().map(str::trim))
    .bind(data.category_id)
    .bind(data.price.map(money::round_money))
    .bind(&data.description)
    .bind(data.sort_order)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
}

/// Kitchen availability toggle (86 an item without touching the menu)
pub async fn set_availability(
    pool: &SqlitePool,
    id: i64,
    is_available: bool,
) -> RepoResult<Product> {
    let now = now_millis();
    let rows = sqlx::query("UPDATE products SET is_available = ?, updated_at = ? WHERE id = ?")
        .bind(is_available)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
}

/// Soft-delete
pub async fn deactivate(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let now = now_millis();
    let rows = sqlx::query("UPDATE products SET is_active = 0, updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {id} not found")));
    }
    Ok(())
}
