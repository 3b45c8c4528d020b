//! 数据库模块
//!
//! SQLite 连接池 + 内嵌迁移。单文件 WAL 库，读写同池；
//! busy_timeout 挂在连接选项上，池里每条连接都生效。

pub mod repository;
pub mod seed;

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};

use crate::utils::AppError;

/// 数据库服务 - 持有连接池
#[derive(Clone)]
pub struct DbService {
    pub pool: SqlitePool,
}

impl DbService {
    /// 打开 (或创建) 数据库文件并应用迁移
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let options = connect_options(db_path)
            .map_err(|e| AppError::database(format!("Invalid database path: {e}")))?;

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Could not open database: {e}")))?;

        tracing::info!(path = db_path, "Database connection established (SQLite WAL)");

        run_migrations(&pool)
            .await
            .map_err(|e| AppError::database(format!("Migration failed: {e}")))?;
        tracing::info!("Database schema up to date");

        Ok(Self { pool })
    }
}

/// WAL + 外键 + 5 秒写锁等待
fn connect_options(db_path: &str) -> Result<SqliteConnectOptions, sqlx::Error> {
    Ok(SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true)
        .optimize_on_close(true, None))
}

/// 应用内嵌迁移 (集成测试的 `:memory:` 库也走这里)
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await
}
