//! Dining Tables Repository
//!
//! Floor state machine: `free → occupied → waiting_payment → free`.
//! Transitions run as conditional UPDATEs so two terminals opening the
//! same table race on the row, not in application code; the loser gets a
//! state conflict.

use super::{RepoError, RepoResult};
use crate::utils::validation::{MAX_NAME_LEN, validate_optional_text};
use shared::models::{
    DiningTable, DiningTableCreate, DiningTableUpdate, Order, TableStatus,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const TABLE_COLUMNS: &str = "id, number, name, status, occupants, open_time, waiter_id, current_order_id, is_active, created_at, updated_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<DiningTable>> {
    let table = sqlx::query_as::<_, DiningTable>(&format!(
        "SELECT {TABLE_COLUMNS} FROM dining_tables WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(table)
}

pub async fn find_all(pool: &SqlitePool, include_inactive: bool) -> RepoResult<Vec<DiningTable>> {
    let sql = if include_inactive {
        format!("SELECT {TABLE_COLUMNS} FROM dining_tables ORDER BY number")
    } else {
        format!("SELECT {TABLE_COLUMNS} FROM dining_tables WHERE is_active = 1 ORDER BY number")
    };
    let tables = sqlx::query_as::<_, DiningTable>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(tables)
}

/// Tables seated since before `opened_before`, still occupied or waiting
/// for payment (long-occupation monitor scan)
pub async fn find_stale_open(
    pool: &SqlitePool,
    opened_before: i64,
) -> RepoResult<Vec<DiningTable>> {
    let tables = sqlx::query_as::<_, DiningTable>(&format!(
        "SELECT {TABLE_COLUMNS} FROM dining_tables WHERE status IN ('occupied', 'waiting_payment') AND open_time IS NOT NULL AND open_time < ?"
    ))
    .bind(opened_before)
    .fetch_all(pool)
    .await?;
    Ok(tables)
}

pub async fn create(pool: &SqlitePool, data: DiningTableCreate) -> RepoResult<DiningTable> {
    if data.number <= 0 {
        return Err(RepoError::Validation(format!(
            "Table number must be positive, got {}",
            data.number
        )));
    }
    validate_optional_text(&data.name, "name", MAX_NAME_LEN)
        .map_err(|e| RepoError::Validation(e.to_string()))?;

    let now = now_millis();
    let id = snowflake_id();

    sqlx::query(
        "INSERT INTO dining_tables (id, number, name, status, occupants, is_active, created_at, updated_at) VALUES (?, ?, ?, 'free', 0, 1, ?, ?)",
    )
    .bind(id)
    .bind(data.number)
    .bind(&data.name)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create table".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: DiningTableUpdate) -> RepoResult<DiningTable> {
    if let Some(number) = data.number
        && number <= 0
    {
        return Err(RepoError::Validation(format!(
            "Table number must be positive, got {number}"
        )));
    }
    validate_optional_text(&data.name, "name", MAX_NAME_LEN)
        .map_err(|e| RepoError::Validation(e.to_string()))?;

    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE dining_tables SET number = COALESCE(?, number), name = COALESCE(?, name), is_active = COALESCE(?, is_active), updated_at = ? WHERE id = ?",
    )
    .bind(data.number)
    .bind(&data.name)
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Table {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Table {id} not found")))
}

/// Soft-delete. Only free tables can be deactivated.
pub async fn deactivate(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE dining_tables SET is_active = 0, updated_at = ? WHERE id = ? AND status = 'free'",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return match find_by_id(pool, id).await? {
            None => Err(RepoError::NotFound(format!("Table {id} not found"))),
            Some(t) if t.status != TableStatus::Free => Err(RepoError::State(format!(
                "Table {id} is {} and cannot be deactivated",
                t.status.as_str()
            ))),
            Some(_) => Ok(()), // already inactive, idempotent
        };
    }
    Ok(())
}

/// Seat guests: `free → occupied`, creating the order in the same
/// transaction. Returns the refreshed table and the new order.
pub async fn open_table(
    pool: &SqlitePool,
    id: i64,
    occupants: i64,
    waiter_id: Option<i64>,
) -> RepoResult<(DiningTable, Order)> {
    if occupants <= 0 {
        return Err(RepoError::Validation(format!(
            "occupants must be positive, got {occupants}"
        )));
    }

    if let Some(wid) = waiter_id {
        let waiter_exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE id = ? AND is_active = 1",
        )
        .bind(wid)
        .fetch_one(pool)
        .await?;
        if waiter_exists == 0 {
            return Err(RepoError::Validation(format!(
                "Waiter {wid} not found or inactive"
            )));
        }
    }

    let now = now_millis();
    let order_id = snowflake_id();

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO orders (id, table_id, waiter_id, status, total, discount, service_charge, payment_status, created_at, updated_at) VALUES (?, ?, ?, 'open', 0, 0, 0, 'pending', ?, ?)",
    )
    .bind(order_id)
    .bind(id)
    .bind(waiter_id)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let rows = sqlx::query(
        "UPDATE dining_tables SET status = 'occupied', occupants = ?, open_time = ?, waiter_id = ?, current_order_id = ?, updated_at = ? WHERE id = ? AND status = 'free' AND is_active = 1",
    )
    .bind(occupants)
    .bind(now)
    .bind(waiter_id)
    .bind(order_id)
    .bind(now)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if rows.rows_affected() == 0 {
        // Rollback discards the orphan order row
        drop(tx);
        return match find_by_id(pool, id).await? {
            None => Err(RepoError::NotFound(format!("Table {id} not found"))),
            Some(t) if !t.is_active => {
                Err(RepoError::State(format!("Table {id} is deactivated")))
            }
            Some(t) => Err(RepoError::State(format!(
                "Table {id} is already {}",
                t.status.as_str()
            ))),
        };
    }

    tx.commit().await?;

    let table = find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Table {id} not found")))?;
    let order = super::orders::find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create order".into()))?;
    Ok((table, order))
}

/// `occupied → waiting_payment` when the bill is requested
pub async fn request_payment(pool: &SqlitePool, id: i64) -> RepoResult<DiningTable> {
    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE dining_tables SET status = 'waiting_payment', updated_at = ? WHERE id = ? AND status = 'occupied'",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return match find_by_id(pool, id).await? {
            None => Err(RepoError::NotFound(format!("Table {id} not found"))),
            Some(t) => Err(RepoError::State(format!(
                "Table {id} is {}, expected occupied",
                t.status.as_str()
            ))),
        };
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Table {id} not found")))
}

/// Free the table once its order is settled (paid or canceled)
pub async fn close_table(pool: &SqlitePool, id: i64) -> RepoResult<DiningTable> {
    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE dining_tables SET status = 'free', occupants = 0, open_time = NULL, waiter_id = NULL, current_order_id = NULL, updated_at = ? WHERE id = ? AND status IN ('occupied', 'waiting_payment') AND NOT EXISTS (SELECT 1 FROM orders WHERE orders.id = dining_tables.current_order_id AND orders.status = 'open')",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return match find_by_id(pool, id).await? {
            None => Err(RepoError::NotFound(format!("Table {id} not found"))),
            Some(t) if t.status == TableStatus::Free => {
                Err(RepoError::State(format!("Table {id} is already free")))
            }
            Some(_) => Err(RepoError::State(format!(
                "Table {id} still has an open order; close or cancel it first"
            ))),
        };
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Table {id} not found")))
}
