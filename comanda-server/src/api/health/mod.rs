//! 健康检查
//!
//! `/api/health` 是无认证的存活探针；`/api/health/detailed` 额外
//! ping 一次数据库并带上运行指标，给运维面板轮询用。

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;

/// 两条路由都在认证白名单里
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/health/detailed", get(detailed_health))
}

/// 存活探针响应
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// 运维面板用的详细响应
#[derive(Serialize)]
pub struct DetailedHealthResponse {
    /// healthy，数据库 ping 失败时 degraded
    status: &'static str,
    version: &'static str,
    uptime_seconds: i64,
    /// 当前 WebSocket 连接数
    websocket_connections: usize,
    database: DatabaseHealth,
}

#[derive(Serialize)]
pub struct DatabaseHealth {
    reachable: bool,
    /// ping 延迟 (毫秒)，失败时为 None
    latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// GET /api/health - 存活探针
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /api/health/detailed - 组件状态
pub async fn detailed_health(State(state): State<ServerState>) -> Json<DetailedHealthResponse> {
    let database = ping_database(&state).await;

    Json(DetailedHealthResponse {
        status: if database.reachable { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
        websocket_connections: state.broadcaster.connection_count(),
        database,
    })
}

/// `SELECT 1` 测连接，顺带量个延迟
async fn ping_database(state: &ServerState) -> DatabaseHealth {
    let started = std::time::Instant::now();
    match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(state.pool())
        .await
    {
        Ok(_) => DatabaseHealth {
            reachable: true,
            latency_ms: Some(started.elapsed().as_millis() as u64),
            error: None,
        },
        Err(e) => DatabaseHealth {
            reachable: false,
            latency_ms: None,
            error: Some(e.to_string()),
        },
    }
}
