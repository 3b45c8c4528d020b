//! Alert API Handlers
//!
//! 告警是顾问性记录：状态流转只改变面板展示，不驱动任何业务流程。

use axum::{
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::repository::alerts;
use crate::utils::{AppResponse, AppResult, ok};
use shared::models::{Alert, AlertKind, AlertStatus};

const DEFAULT_LIMIT: i32 = 100;
const MAX_LIMIT: i32 = 500;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<AlertStatus>,
    pub kind: Option<AlertKind>,
    pub limit: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct AlertsPayload {
    pub alerts: Vec<Alert>,
}

#[derive(Debug, Serialize)]
pub struct AlertPayload {
    pub alert: Alert,
}

/// GET /api/alerts - 告警列表 (按状态/类型过滤，时间倒序)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<AppResponse<AlertsPayload>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let alerts = alerts::find_all(state.pool(), query.status, query.kind, limit).await?;
    Ok(ok(AlertsPayload { alerts }))
}

/// PATCH /api/alerts/{id}/acknowledge - 确认 (pending -> acknowledged)
pub async fn acknowledge(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<AppResponse<AlertPayload>> {
    let alert = alerts::acknowledge(state.pool(), id).await?;
    Ok(ok(AlertPayload { alert }))
}

/// PATCH /api/alerts/{id}/resolve - 解决 (终态)
pub async fn resolve(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<AppResponse<AlertPayload>> {
    let alert = alerts::resolve(state.pool(), id).await?;
    Ok(ok(AlertPayload { alert }))
}

/// PATCH /api/alerts/{id}/dismiss - 忽略 (终态，可从 pending 直达)
pub async fn dismiss(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<AppResponse<AlertPayload>> {
    let alert = alerts::dismiss(state.pool(), id).await?;
    Ok(ok(AlertPayload { alert }))
}
