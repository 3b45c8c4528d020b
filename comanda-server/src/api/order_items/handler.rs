//! Order Item API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::core::ServerState;
use crate::db::repository::orders;
use crate::utils::{AppResponse, AppResult, ok, ok_with_message};
use shared::models::{Order, OrderItem, OrderItemStatus, OrderItemStatusUpdate};
use shared::realtime::RealtimeEvent;

#[derive(Debug, Serialize)]
pub struct OrderItemPayload {
    pub order: Order,
    pub item: OrderItem,
}

#[derive(Debug, Serialize)]
pub struct OrderPayload {
    pub order: Order,
}

/// PATCH /api/order-items/{item_id}/status - 出品状态流转
///
/// 首次进入 preparing/delivered 时一次性盖章时间戳；
/// 取消条目会改变订单总额，因此额外补发一条订单事件。
pub async fn update_status(
    State(state): State<ServerState>,
    Path(item_id): Path<i64>,
    Json(payload): Json<OrderItemStatusUpdate>,
) -> AppResult<AppResponse<OrderItemPayload>> {
    let (order, item) = orders::update_item_status(state.pool(), item_id, payload.status).await?;

    state.publish(RealtimeEvent::order_status_changed(
        order.id,
        order.table_id,
        item.id,
        item.status,
    ));
    if item.status == OrderItemStatus::Canceled {
        state.publish(RealtimeEvent::order_update(
            order.id,
            order.table_id,
            order.total,
        ));
    }

    Ok(ok(OrderItemPayload { order, item }))
}

/// DELETE /api/order-items/{item_id} - 移除条目
///
/// 只允许移除 pending 状态的条目；进入后厨流程后走取消。
pub async fn remove(
    State(state): State<ServerState>,
    Path(item_id): Path<i64>,
) -> AppResult<AppResponse<OrderPayload>> {
    let order = orders::remove_item(state.pool(), item_id).await?;

    state.publish(RealtimeEvent::order_update(
        order.id,
        order.table_id,
        order.total,
    ));

    Ok(ok_with_message(OrderPayload { order }, "Item removed"))
}
