//! Waste Logs Repository
//!
//! Append-only: rows are inserted with a product-name snapshot and never
//! updated or deleted.

use super::{RepoError, RepoResult};
use crate::money;
use crate::utils::validation::{MAX_NOTE_LEN, validate_required_text};
use shared::models::{WasteLog, WasteLogCreate};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const WASTE_COLUMNS: &str =
    "id, product_id, product_name, quantity, reason, recorded_by, recorded_by_name, created_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<WasteLog>> {
    let log = sqlx::query_as::<_, WasteLog>(&format!(
        "SELECT {WASTE_COLUMNS} FROM waste_logs WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(log)
}

pub async fn find_in_range(
    pool: &SqlitePool,
    start_millis: i64,
    end_millis: i64,
) -> RepoResult<Vec<WasteLog>> {
    let logs = sqlx::query_as::<_, WasteLog>(&format!(
        "SELECT {WASTE_COLUMNS} FROM waste_logs WHERE created_at >= ? AND created_at < ? ORDER BY created_at DESC"
    ))
    .bind(start_millis)
    .bind(end_millis)
    .fetch_all(pool)
    .await?;
    Ok(logs)
}

/// Record wasted stock, snapshotting the product name in the same
/// statement (the insert matches nothing when the product is unknown)
pub async fn create(
    pool: &SqlitePool,
    data: WasteLogCreate,
    recorded_by: i64,
    recorded_by_name: &str,
) -> RepoResult<WasteLog> {
    money::validate_quantity(data.quantity, "quantity")
        .map_err(|e| RepoError::Validation(e.to_string()))?;
    validate_required_text(&data.reason, "reason", MAX_NOTE_LEN)
        .map_err(|e| RepoError::Validation(e.to_string()))?;

    let now = now_millis();
    let id = snowflake_id();

    let rows = sqlx::query(
        "INSERT INTO waste_logs (id, product_id, product_name, quantity, reason, recorded_by, recorded_by_name, created_at) \
         SELECT ?, p.id, p.name, ?, ?, ?, ?, ? FROM products p WHERE p.id = ?",
    )
    .bind(id)
    .bind(data.quantity)
    .bind(data.reason.trim())
    .bind(recorded_by)
    .bind(recorded_by_name)
    .bind(now)
    .bind(data.product_id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::Validation(format!(
            "Product {} not found",
            data.product_id
        )));
    }

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create waste log".into()))
}
