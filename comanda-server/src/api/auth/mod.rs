//! Authentication API 模块

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/auth", routes())
}

fn routes() -> Router<ServerState> {
    // login 在认证中间件的公开路径列表里；/me 走正常认证
    Router::new()
        .route("/login", post(handler::login))
        .route("/me", get(handler::me))
}
