//! Backup Model

use serde::{Deserialize, Serialize};

/// Backup metadata — one row per JSON export under `{work_dir}/backups/`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Backup {
    pub id: i64,
    pub file_name: String,
    pub size_bytes: i64,
    pub note: Option<String>,
    pub created_by: i64,
    pub created_at: i64,
}

/// Create backup payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BackupCreate {
    pub note: Option<String>,
}
