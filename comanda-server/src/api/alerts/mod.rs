//! Alert API 模块

mod handler;

use axum::{
    Router, middleware,
    routing::{get, patch},
};

use crate::auth::require_permission;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/alerts", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new().route("/", get(handler::list));

    let manage_routes = Router::new()
        .route("/{id}/acknowledge", patch(handler::acknowledge))
        .route("/{id}/resolve", patch(handler::resolve))
        .route("/{id}/dismiss", patch(handler::dismiss))
        .layer(middleware::from_fn(require_permission("alerts:manage")));

    read_routes.merge(manage_routes)
}
