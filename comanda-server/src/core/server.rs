//! HTTP 服务器
//!
//! 路由拼装、中间件栈、监听与优雅停机。

use axum::{Router, middleware};
use std::net::SocketAddr;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;

use crate::auth::require_auth;
use crate::core::{Config, ServerState};
use crate::utils::{AppError, AppResult};

/// 访问日志：method + uri + 状态码，单独的 http_access target
async fn log_request(
    request: axum::extract::Request,
    next: middleware::Next,
) -> axum::response::Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let status = response.status();

    tracing::info!(target: "http_access", "{} {} {}", method, uri, status);

    response
}

/// 拼装全部业务路由 (未绑定 state，集成测试直接取用)
pub fn build_app() -> Router<ServerState> {
    Router::<ServerState>::new()
        // Core APIs
        .merge(crate::api::auth::router())
        .merge(crate::api::health::router())
        .merge(crate::realtime::ws::router())
        // Floor operations
        .merge(crate::api::tables::router())
        .merge(crate::api::orders::router())
        .merge(crate::api::order_items::router())
        // Catalog
        .merge(crate::api::categories::router())
        .merge(crate::api::products::router())
        // Money
        .merge(crate::api::cash_registers::router())
        // Back office
        .merge(crate::api::alerts::router())
        .merge(crate::api::customers::router())
        .merge(crate::api::users::router())
        .merge(crate::api::waste_logs::router())
        .merge(crate::api::reports::router())
        .merge(crate::api::backups::router())
}

/// Assemble the full service: routes, auth, CORS, compression, access log
pub fn build_router(state: ServerState) -> Router {
    build_app()
        // 认证挂在 Router 级别，require_auth 自行放行白名单路由；
        // from_fn_with_state 让中间件拿得到 JwtService
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(log_request))
}

/// HTTP Server
pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create server with existing state (for sharing with tests)
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(&self) -> AppResult<()> {
        let state = match &self.state {
            Some(s) => s.clone(),
            None => ServerState::initialize(&self.config).await?,
        };

        // 告警扫描在监听开始前就位
        let tasks = state.start_background_tasks();

        let app = build_router(state);

        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| AppError::internal(format!("Invalid listen address: {e}")))?;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

        tracing::info!("Comanda server listening on http://{}", addr);

        let shutdown = async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

        // Stop the alert monitor once no more requests are coming in
        tasks.shutdown().await;

        Ok(())
    }
}
