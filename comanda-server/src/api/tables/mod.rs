//! Dining Table API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/tables", routes())
}

fn routes() -> Router<ServerState> {
    // 开台/催账/清台是服务员日常操作，登录即可；建删改桌台需要权限
    let floor_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/open", post(handler::open))
        .route("/{id}/request-payment", post(handler::request_payment))
        .route("/{id}/close", post(handler::close));

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .layer(middleware::from_fn(require_permission("tables:manage")));

    floor_routes.merge(manage_routes)
}
