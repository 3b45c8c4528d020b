//! Categories Repository

use super::{RepoError, RepoResult};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_optional_text, validate_required_text,
};
use shared::models::{Category, CategoryCreate, CategoryUpdate};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const CATEGORY_COLUMNS: &str =
    "id, name, description, sort_order, is_active, created_at, updated_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(&format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(category)
}

/// List categories; `include_inactive` keeps soft-deleted ones in admin views
pub async fn find_all(pool: &SqlitePool, include_inactive: bool) -> RepoResult<Vec<Category>> {
    let sql = if include_inactive {
        format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY sort_order, name")
    } else {
        format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE is_active = 1 ORDER BY sort_order, name"
        )
    };
    let categories = sqlx::query_as::<_, Category>(&sql).fetch_all(pool).await?;
    Ok(categories)
}

pub async fn create(pool: &SqlitePool, data: CategoryCreate) -> RepoResult<Category> {
    validate_required_text(&data.name, "name", MAX_NAME_LEN)
        .map_err(|e| RepoError::Validation(e.to_string()))?;
    validate_optional_text(&data.description, "description", MAX_NOTE_LEN)
        .map_err(|e| RepoError::Validation(e.to_string()))?;

    let now = now_millis();
    let id = snowflake_id();

    sqlx::query(
        "INSERT INTO categories (id, name, description, sort_order, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(id)
    .bind(data.name.trim())
    .bind(&data.description)
    .bind(data.sort_order.unwrap_or(0))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create category".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: CategoryUpdate) -> RepoResult<Category> {
    if let Some(name) = &data.name {
        validate_required_text(name, "name", MAX_NAME_LEN)
            .map_err(|e| RepoError::Validation(e.to_string()))?;
    }
    validate_optional_text(&data.description, "description", MAX_NOTE_LEN)
        .map_err(|e| RepoError::Validation(e.to_string()))?;

    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE categories SET name = COALESCE(?, name), description = COALESCE(?, description), sort_order = COALESCE(?, sort_order), is_active = COALESCE(?, is_active), updated_at = ? WHERE id = ?",
    )
    .bind(data.name.as_deref().map(str::trim))
    .bind(&data.description)
    .bind(data.sort_order)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Category {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Category {id} not found")))
}

/// Soft-delete. Categories with active products cannot be removed.
pub async fn deactivate(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let active_products = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM products WHERE category_id = ? AND is_active = 1",
    )
    .bind(id)
    .fetch_one(pool)
    .await?;

    if active_products > 0 {
        return Err(RepoError::State(format!(
            "Category {id} still has {active_products} active product(s)"
        )));
    }

    let now = now_millis();
    let rows = sqlx::query("UPDATE categories SET is_active = 0, updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Category {id} not found")));
    }
    Ok(())
}
