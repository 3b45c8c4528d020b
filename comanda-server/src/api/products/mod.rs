//! Product API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, patch, post, put},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/products", routes())
}

fn routes() -> Router<ServerState> {
    // 估清 (86) 是后厨日常操作，登录即可；商品增删改需要菜单权限
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/availability", patch(handler::set_availability));

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .layer(middleware::from_fn(require_permission("menu:manage")));

    read_routes.merge(manage_routes)
}
