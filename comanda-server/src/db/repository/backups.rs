//! Backups Repository
//!
//! Metadata rows for JSON exports; the files themselves live under
//! `{work_dir}/backups/`.

use super::{RepoError, RepoResult};
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};
use shared::models::Backup;
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

const BACKUP_COLUMNS: &str = "id, file_name, size_bytes, note, created_by, created_at";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Backup>> {
    let backups = sqlx::query_as::<_, Backup>(&format!(
        "SELECT {BACKUP_COLUMNS} FROM backups ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(backups)
}

pub async fn create(
    pool: &SqlitePool,
    file_name: &str,
    size_bytes: i64,
    note: Option<String>,
    created_by: i64,
) -> RepoResult<Backup> {
    validate_optional_text(&note, "note", MAX_NOTE_LEN)
        .map_err(|e| RepoError::Validation(e.to_string()))?;

    let now = now_millis();
    let id = snowflake_id();

    sqlx::query(
        "INSERT INTO backups (id, file_name, size_bytes, note, created_by, created_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(file_name)
    .bind(size_bytes)
    .bind(&note)
    .bind(created_by)
    .bind(now)
    .execute(pool)
    .await?;

    let backup = sqlx::query_as::<_, Backup>(&format!(
        "SELECT {BACKUP_COLUMNS} FROM backups WHERE id = ?"
    ))
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(backup)
}
