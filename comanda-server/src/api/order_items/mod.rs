//! Order Item API 模块
//!
//! 出品状态流转和撤单挂在扁平的 `/api/order-items` 下，
//! 厨房显示屏只有 item_id，不需要先查订单。

mod handler;

use axum::{Router, routing::patch};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/order-items", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/{item_id}/status", patch(handler::update_status))
        .route("/{item_id}", axum::routing::delete(handler::remove))
}
