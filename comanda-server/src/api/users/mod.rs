//! User Administration API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/users", routes())
}

fn routes() -> Router<ServerState> {
    // users:manage 不在可配置权限列表里，实际只有 admin 能通过
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .route("/{id}/password", post(handler::reset_password))
        .layer(middleware::from_fn(require_permission("users:manage")))
}
