//! Order API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, patch, post},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    // 点单/结账登录即可；取消订单和折扣/服务费调整是敏感操作
    let floor_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/items", post(handler::add_item))
        .route("/{id}/close", post(handler::close));

    let manage_routes = Router::new()
        .route("/{id}/adjustments", patch(handler::update_adjustments))
        .route("/{id}/cancel", post(handler::cancel))
        .layer(middleware::from_fn(require_permission("orders:manage")));

    floor_routes.merge(manage_routes)
}
