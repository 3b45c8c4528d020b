//! Cash Register API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cash-registers", routes())
}

fn routes() -> Router<ServerState> {
    // 余额查看登录即可；钱箱操作和流水需要 cash:operate；建点需要 cash:manage
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id));

    let operate_routes = Router::new()
        .route("/{id}/open", post(handler::open))
        .route("/{id}/close", post(handler::close))
        .route("/{id}/deposit", post(handler::deposit))
        .route("/{id}/withdraw", post(handler::withdraw))
        .route("/{id}/drain", post(handler::drain))
        .route("/{id}/transactions", get(handler::transactions))
        .layer(middleware::from_fn(require_permission("cash:operate")));

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .layer(middleware::from_fn(require_permission("cash:manage")));

    read_routes.merge(operate_routes).merge(manage_routes)
}
