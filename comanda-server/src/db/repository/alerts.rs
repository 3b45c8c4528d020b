//! Alerts Repository
//!
//! Lifecycle: pending → acknowledged → resolved | dismissed (dismissal
//! is also allowed straight from pending). The two dedup lookups differ
//! on purpose: long-occupation dedup is time-windowed over live alerts,
//! high-value dedup is one-alert-per-order forever.

use super::{RepoError, RepoResult};
use shared::models::{Alert, AlertCreate, AlertKind, AlertStatus};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const ALERT_COLUMNS: &str = "id, kind, severity, status, title, message, table_id, order_id, register_id, customer_id, user_id, product_id, data, acknowledged_at, resolved_at, created_at";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Alert>> {
    let alert =
        sqlx::query_as::<_, Alert>(&format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(alert)
}

pub async fn find_all(
    pool: &SqlitePool,
    status: Option<AlertStatus>,
    kind: Option<AlertKind>,
    limit: i32,
) -> RepoResult<Vec<Alert>> {
    let mut sql = format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE 1=1");
    if status.is_some() {
        sql.push_str(" AND status = ?");
    }
    if kind.is_some() {
        sql.push_str(" AND kind = ?");
    }
    sql.push_str(" ORDER BY created_at DESC LIMIT ?");

    let mut query = sqlx::query_as::<_, Alert>(&sql);
    if let Some(s) = status {
        query = query.bind(s.as_str());
    }
    if let Some(k) = kind {
        query = query.bind(k.as_str());
    }
    let alerts = query.bind(limit).fetch_all(pool).await?;
    Ok(alerts)
}

pub async fn create(pool: &SqlitePool, data: AlertCreate) -> RepoResult<Alert> {
    let now = now_millis();
    let id = snowflake_id();
    let data_json = serde_json::to_string(&data.data)
        .map_err(|e| RepoError::Validation(format!("Alert data is not serializable: {e}")))?;

    sqlx::query(
        "INSERT INTO alerts (id, kind, severity, status, title, message, table_id, order_id, register_id, customer_id, user_id, product_id, data, created_at) VALUES (?, ?, ?, 'pending', ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(data.kind.as_str())
    .bind(data.severity.as_str())
    .bind(&data.title)
    .bind(&data.message)
    .bind(data.table_id)
    .bind(data.order_id)
    .bind(data.register_id)
    .bind(data.customer_id)
    .bind(data.user_id)
    .bind(data.product_id)
    .bind(data_json)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create alert".into()))
}

/// Is there a live (pending/acknowledged) alert of this kind for this
/// table created at or after `since`? 30-minute window dedup for the
/// long-occupation scan.
pub async fn has_live_table_alert(
    pool: &SqlitePool,
    kind: AlertKind,
    table_id: i64,
    since: i64,
) -> RepoResult<bool> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM alerts WHERE kind = ? AND table_id = ? AND status IN ('pending', 'acknowledged') AND created_at >= ?",
    )
    .bind(kind.as_str())
    .bind(table_id)
    .bind(since)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// Has this order ever produced an alert of this kind, in any status?
/// Lifetime dedup for the high-value scan.
pub async fn has_order_alert(
    pool: &SqlitePool,
    kind: AlertKind,
    order_id: i64,
) -> RepoResult<bool> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM alerts WHERE kind = ? AND order_id = ?",
    )
    .bind(kind.as_str())
    .bind(order_id)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

pub async fn acknowledge(pool: &SqlitePool, id: i64) -> RepoResult<Alert> {
    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE alerts SET status = 'acknowledged', acknowledged_at = ? WHERE id = ? AND status = 'pending'",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(transition_rejected(pool, id, "acknowledged").await?);
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Alert {id} not found")))
}

pub async fn resolve(pool: &SqlitePool, id: i64) -> RepoResult<Alert> {
    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE alerts SET status = 'resolved', resolved_at = ? WHERE id = ? AND status IN ('pending', 'acknowledged')",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(transition_rejected(pool, id, "resolved").await?);
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Alert {id} not found")))
}

/// Dismiss without resolving; stamps `resolved_at` as the terminal time
pub async fn dismiss(pool: &SqlitePool, id: i64) -> RepoResult<Alert> {
    let now = now_millis();
    let rows = sqlx::query(
        "UPDATE alerts SET status = 'dismissed', resolved_at = ? WHERE id = ? AND status IN ('pending', 'acknowledged')",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(transition_rejected(pool, id, "dismissed").await?);
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Alert {id} not found")))
}

async fn transition_rejected(
    pool: &SqlitePool,
    id: i64,
    target: &str,
) -> RepoResult<RepoError> {
    Ok(match find_by_id(pool, id).await? {
        None => RepoError::NotFound(format!("Alert {id} not found")),
        Some(a) => RepoError::State(format!(
            "Alert {id} is {} and cannot be {target}",
            a.status.as_str()
        )),
    })
}

/// Hard-delete terminal alerts whose resolution is older than `cutoff`.
/// Returns the number of rows removed.
pub async fn cleanup_terminal_before(pool: &SqlitePool, cutoff: i64) -> RepoResult<u64> {
    let rows = sqlx::query(
        "DELETE FROM alerts WHERE status IN ('resolved', 'dismissed') AND resolved_at IS NOT NULL AND resolved_at < ?",
    )
    .bind(cutoff)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected())
}

pub async fn count_pending(pool: &SqlitePool) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM alerts WHERE status = 'pending'")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
