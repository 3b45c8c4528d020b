//! Customers Repository

use super::{RepoError, RepoResult};
use crate::utils::validation::{
    MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text,
    validate_required_text,
};
use shared::models::{Customer, CustomerCreate, CustomerUpdate};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const CUSTOMER_COLUMNS: &str = "id, name, phone, email, notes, is_active, created_at, updated_at";

fn validate_payload_texts(
    phone: &Option<String>,
    email: &Option<String>,
    notes: &Option<String>,
) -> RepoResult<()> {
    validate_optional_text(phone, "phone", MAX_SHORT_TEXT_LEN)
        .map_err(|e| RepoError::Validation(e.to_string()))?;
    validate_optional_text(email, "email", MAX_EMAIL_LEN)
        .map_err(|e| RepoError::Validation(e.to_string()))?;
    if let Some(e) = email
        && !e.trim().is_empty()
        && !e.contains('@')
    {
        return Err(RepoError::Validation(format!("Invalid email: {e}")));
    }
    validate_optional_text(notes, "notes", MAX_NOTE_LEN)
        .map_err(|e| RepoError::Validation(e.to_string()))?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Customer>> {
    let customer = sqlx::query_as::<_, Customer>(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(customer)
}

/// List customers, optionally filtered by a name substring (front-of-house
/// lookup box)
pub async fn find_all(pool: &SqlitePool, search: Option<&str>) -> RepoResult<Vec<Customer>> {
    let customers = match search {
        Some(term) if !term.trim().is_empty() => {
            let pattern = format!("%{}%", term.trim());
            sqlx::query_as::<_, Customer>(&format!(
                "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE is_active = 1 AND name LIKE ? ORDER BY name"
            ))
            .bind(pattern)
            .fetch_all(pool)
            .await?
        }
        _ => {
            sqlx::query_as::<_, Customer>(&format!(
                "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE is_active = 1 ORDER BY name"
            ))
            .fetch_all(pool)
            .await?
        }
    };
    Ok(customers)
}

pub async fn create(pool: &SqlitePool, data: CustomerCreate) -> RepoResult<Customer> {
    validate_required_text(&data.name, "name", MAX_NAME_LEN)
        .map_err(|e| RepoError::Validation(e.to_string()))?;
    validate_payload_texts(&data.phone, &data.email, &data.notes)?;

    let now = now_millis();
    let id = snowflake_id();

    sqlx::query(
        "INSERT INTO customers (id, name, phone, email, notes, is_active, created_at, updated_at) VALUES (?, ?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(id)
    .bind(data.name.trim())
    .bind(&data.phone)
    .bind(&data.email)
    .bind(&data.notes)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create customer".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: CustomerUpdate) -> RepoResult<Customer> {
    if let Some(name) = &data.name {
        validate_required_text(name, "name", MAX_NAME_LEN)
            .map_err(|e| RepoError::Validation(e.to_string()))?;
    }
    validate_payload_texts(&data.phone, &data.email, &data.notes)?;

    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE customers SET name = COALESCE(?, name), phone = COALESCE(?, phone), email = COALESCE(?, email), notes = COALESCE(?, notes), is_active = COALESCE(?, is_active), updated_at = ? WHERE id = ?",
    )
    .bind(data.name.as_deref().map(str::trim))
    .bind(&data.phone)
    .bind(&data.email)
    .bind(&data.notes)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Customer {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Customer {id} not found")))
}

/// Soft-delete
pub async fn deactivate(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let now = now_millis();
    let rows = sqlx::query("UPDATE customers SET is_active = 0, updated_at = ? WHERE id = ?")
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Customer {id} not found")));
    }
    Ok(())
}
