//! Order API Handlers
//!
//! 每个写操作都经由 repository 的显式总额重算，再广播一次事件。

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::repository::{orders, tables};
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};
use shared::models::{
    Order, OrderAdjustments, OrderClose, OrderDetail, OrderItem, OrderItemCreate, OrderStatus,
};
use shared::realtime::RealtimeEvent;

const DEFAULT_LIMIT: i32 = 50;
const MAX_LIMIT: i32 = 500;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<OrderStatus>,
    pub table_id: Option<i64>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct OrdersPayload {
    pub orders: Vec<Order>,
}

#[derive(Debug, Serialize)]
pub struct OrderPayload {
    pub order: Order,
}

#[derive(Debug, Serialize)]
pub struct OrderDetailPayload {
    pub order: OrderDetail,
}

#[derive(Debug, Serialize)]
pub struct OrderItemPayload {
    pub order: Order,
    pub item: OrderItem,
}

/// GET /api/orders - 订单列表 (按状态/桌台过滤，时间倒序分页)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<AppResponse<OrdersPayload>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = query.offset.unwrap_or(0).max(0);
    let orders = orders::find_all(state.pool(), query.status, query.table_id, limit, offset).await?;
    Ok(ok(OrdersPayload { orders }))
}

/// GET /api/orders/{id} - 订单详情 (含条目)
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<AppResponse<OrderDetailPayload>> {
    let order = orders::find_detail(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))?;
    Ok(ok(OrderDetailPayload { order }))
}

/// POST /api/orders/{id}/items - 点单
///
/// 商品必须在售 (active + available)；价格和名称在此刻快照。
pub async fn add_item(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<OrderItemCreate>,
) -> AppResult<AppResponse<OrderItemPayload>> {
    let (order, item) = orders::add_item(state.pool(), id, payload).await?;

    state.publish(RealtimeEvent::order_update(
        order.id,
        order.table_id,
        order.total,
    ));

    Ok(ok(OrderItemPayload { order, item }))
}

/// PATCH /api/orders/{id}/adjustments - 折扣/服务费调整
pub async fn update_adjustments(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<OrderAdjustments>,
) -> AppResult<AppResponse<OrderPayload>> {
    let order =
        orders::update_adjustments(state.pool(), id, payload.discount, payload.service_charge)
            .await?;

    state.publish(RealtimeEvent::order_update(
        order.id,
        order.table_id,
        order.total,
    ));

    Ok(ok(OrderPayload { order }))
}

/// POST /api/orders/{id}/close - 结账
pub async fn close(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<OrderClose>,
) -> AppResult<AppResponse<OrderPayload>> {
    let order = orders::close_order(state.pool(), id, payload.payment_method).await?;

    state.publish(RealtimeEvent::order_update(
        order.id,
        order.table_id,
        order.total,
    ));

    tracing::info!(
        order_id = order.id,
        table_id = order.table_id,
        total = order.total,
        payment_method = payload.payment_method.as_str(),
        "Order closed"
    );

    Ok(ok_with_message(OrderPayload { order }, "Order closed"))
}

/// POST /api/orders/{id}/cancel - 取消订单
///
/// 条目全部取消、桌台同事务释放，因此补发一条桌台事件。
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<AppResponse<OrderPayload>> {
    let order = orders::cancel_order(state.pool(), id).await?;

    state.publish(RealtimeEvent::order_update(
        order.id,
        order.table_id,
        order.total,
    ));
    if let Some(table) = tables::find_by_id(state.pool(), order.table_id).await? {
        state.publish(RealtimeEvent::table_update(table.id, table.status));
    }

    tracing::info!(order_id = order.id, table_id = order.table_id, "Order canceled");

    Ok(ok_with_message(OrderPayload { order }, "Order canceled"))
}
