//! Waste Log API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::waste_logs;
use crate::utils::time::date_range_millis;
use crate::utils::{AppResponse, AppResult, ok, ok_with_message};
use shared::models::{WasteLog, WasteLogCreate};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WasteLogsPayload {
    pub waste_logs: Vec<WasteLog>,
}

#[derive(Debug, Serialize)]
pub struct WasteLogPayload {
    pub waste_log: WasteLog,
}

/// GET /api/waste-logs - 报损记录 (按业务时区的日期区间)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<AppResponse<WasteLogsPayload>> {
    let (start, end) = date_range_millis(
        query.start_date.as_deref(),
        query.end_date.as_deref(),
        state.config.timezone,
    )?;
    let waste_logs = waste_logs::find_in_range(state.pool(), start, end).await?;
    Ok(ok(WasteLogsPayload { waste_logs }))
}

/// POST /api/waste-logs - 登记报损
///
/// 商品名和操作员名都在此刻快照，之后的档案变更不回写。
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<WasteLogCreate>,
) -> AppResult<AppResponse<WasteLogPayload>> {
    let waste_log =
        waste_logs::create(state.pool(), payload, current.id, &current.username).await?;

    tracing::info!(
        waste_log_id = waste_log.id,
        product_id = waste_log.product_id,
        quantity = waste_log.quantity,
        recorded_by = current.id,
        "Waste recorded"
    );

    Ok(ok_with_message(WasteLogPayload { waste_log }, "Waste recorded"))
}
