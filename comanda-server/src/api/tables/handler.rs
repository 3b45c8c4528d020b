//! Dining Table API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::tables;
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_message, ok_with_message};
use shared::models::{DiningTable, DiningTableCreate, DiningTableOpen, DiningTableUpdate, Order};
use shared::realtime::RealtimeEvent;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Serialize)]
pub struct TablesPayload {
    pub tables: Vec<DiningTable>,
}

#[derive(Debug, Serialize)]
pub struct TablePayload {
    pub table: DiningTable,
}

/// Open returns both sides of the new seating
#[derive(Debug, Serialize)]
pub struct TableOpenPayload {
    pub table: DiningTable,
    pub order: Order,
}

/// GET /api/tables - 获取所有桌台
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<AppResponse<TablesPayload>> {
    let tables = tables::find_all(state.pool(), query.include_inactive).await?;
    Ok(ok(TablesPayload { tables }))
}

/// GET /api/tables/{id} - 获取单个桌台
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<AppResponse<TablePayload>> {
    let table = tables::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Table {id} not found")))?;
    Ok(ok(TablePayload { table }))
}

/// POST /api/tables - 创建桌台
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<DiningTableCreate>,
) -> AppResult<AppResponse<TablePayload>> {
    let table = tables::create(state.pool(), payload).await?;
    Ok(ok_with_message(TablePayload { table }, "Table created"))
}

/// PUT /api/tables/{id} - 更新桌台
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<DiningTableUpdate>,
) -> AppResult<AppResponse<TablePayload>> {
    let table = tables::update(state.pool(), id, payload).await?;
    Ok(ok(TablePayload { table }))
}

/// DELETE /api/tables/{id} - 停用桌台 (软删除)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<AppResponse<()>> {
    tables::deactivate(state.pool(), id).await?;
    Ok(ok_message("Table deactivated"))
}

/// POST /api/tables/{id}/open - 开台
///
/// 同一事务内坐客并开单；waiter 缺省为当前操作员。
pub async fn open(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<DiningTableOpen>,
) -> AppResult<AppResponse<TableOpenPayload>> {
    let waiter_id = payload.waiter_id.or(Some(current.id));
    let (table, order) = tables::open_table(state.pool(), id, payload.occupants, waiter_id).await?;

    state.publish(RealtimeEvent::table_update(table.id, table.status));
    state.publish(RealtimeEvent::new_order(order.id, table.id));

    tracing::info!(
        table_id = table.id,
        order_id = order.id,
        occupants = payload.occupants,
        "Table opened"
    );

    Ok(ok_with_message(
        TableOpenPayload { table, order },
        "Table opened",
    ))
}

/// POST /api/tables/{id}/request-payment - 催账 (occupied -> waiting_payment)
pub async fn request_payment(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<AppResponse<TablePayload>> {
    let table = tables::request_payment(state.pool(), id).await?;

    state.publish(RealtimeEvent::table_update(table.id, table.status));

    Ok(ok(TablePayload { table }))
}

/// POST /api/tables/{id}/close - 清台
///
/// 当前订单必须已结清或已取消，否则返回状态冲突。
pub async fn close(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<AppResponse<TablePayload>> {
    let table = tables::close_table(state.pool(), id).await?;

    state.publish(RealtimeEvent::table_update(table.id, table.status));

    tracing::info!(table_id = table.id, "Table closed");

    Ok(ok_with_message(TablePayload { table }, "Table closed"))
}
