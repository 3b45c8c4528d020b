//! Waste Log API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/waste-logs", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new().route("/", get(handler::list));

    let record_routes = Router::new()
        .route("/", post(handler::create))
        .layer(middleware::from_fn(require_permission("waste:record")));

    read_routes.merge(record_routes)
}
