//! Backup API Handlers
//!
//! JSON 导出：菜单档案 + 用户(不含哈希) + 在场桌台/订单快照。
//! 文件落在 `{work_dir}/backups/`，库里只存元数据行。

use axum::{Json, extract::State};
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{backups, categories, orders, products, tables, users};
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};
use shared::models::{
    Backup, BackupCreate, Category, DiningTable, OrderDetail, OrderStatus, Product, UserResponse,
};
use shared::util::now_millis;

/// 在场订单快照上限；同时在场的订单数受桌台数约束，远低于此值
const SNAPSHOT_LIMIT: i32 = 10_000;

#[derive(Debug, Serialize)]
pub struct BackupsPayload {
    pub backups: Vec<Backup>,
}

#[derive(Debug, Serialize)]
pub struct BackupPayload {
    pub backup: Backup,
}

/// Export file layout, versioned by the crate release that wrote it
#[derive(Debug, Serialize)]
struct ExportFile {
    exported_at: i64,
    version: &'static str,
    categories: Vec<Category>,
    products: Vec<Product>,
    users: Vec<UserResponse>,
    tables: Vec<DiningTable>,
    open_orders: Vec<OrderDetail>,
}

/// GET /api/backups - 备份元数据列表
pub async fn list(State(state): State<ServerState>) -> AppResult<AppResponse<BackupsPayload>> {
    let backups = backups::find_all(state.pool()).await?;
    Ok(ok(BackupsPayload { backups }))
}

/// POST /api/backups - 导出备份
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<BackupCreate>,
) -> AppResult<AppResponse<BackupPayload>> {
    let pool = state.pool();

    let categories = categories::find_all(pool, true).await?;
    let products = products::find_all(pool, None, true).await?;
    let users = users::find_all(pool)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();
    let tables = tables::find_all(pool, true).await?;

    let open = orders::find_all(pool, Some(OrderStatus::Open), None, SNAPSHOT_LIMIT, 0).await?;
    let mut open_orders = Vec::with_capacity(open.len());
    for order in open {
        let items = orders::find_items(pool, order.id).await?;
        open_orders.push(OrderDetail { order, items });
    }

    let exported_at = now_millis();
    let export = ExportFile {
        exported_at,
        version: env!("CARGO_PKG_VERSION"),
        categories,
        products,
        users,
        tables,
        open_orders,
    };

    let bytes = serde_json::to_vec_pretty(&export)
        .map_err(|e| AppError::internal(format!("Failed to serialize backup: {e}")))?;

    let dir = state.config.backups_dir();
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::internal(format!("Failed to create backup directory: {e}")))?;

    let file_name = format!("backup-{exported_at}.json");
    let path = dir.join(&file_name);
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| AppError::internal(format!("Failed to write backup file: {e}")))?;

    let backup = backups::create(
        pool,
        &file_name,
        bytes.len() as i64,
        payload.note,
        current.id,
    )
    .await?;

    tracing::info!(
        backup_id = backup.id,
        file = %path.display(),
        size_bytes = backup.size_bytes,
        created_by = current.id,
        "Backup exported"
    );

    Ok(ok_with_message(BackupPayload { backup }, "Backup created"))
}
