//! Sales Report Handlers

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::repository::reports;
use crate::money;
use crate::utils::time::{day_end_millis, day_start_millis, parse_date};
use crate::utils::{AppError, AppResponse, AppResult, ok};
use shared::models::SalesSummary;

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryPayload {
    pub summary: SalesSummary,
}

/// GET /api/reports/sales-summary - 区间销售汇总
///
/// 只统计已结账且已支付的订单，按业务时区的结账日归账。
pub async fn sales_summary(
    State(state): State<ServerState>,
    Query(query): Query<SummaryQuery>,
) -> AppResult<AppResponse<SummaryPayload>> {
    let tz = state.config.timezone;
    let start_day = parse_date(&query.start_date)?;
    let end_day = parse_date(&query.end_date)?;
    if start_day > end_day {
        return Err(AppError::validation("start_date is after end_date"));
    }

    let start = day_start_millis(start_day, tz);
    let end = day_end_millis(end_day, tz);

    let aggregate = reports::sales_aggregate(state.pool(), start, end).await?;

    let average_ticket = if aggregate.order_count > 0 {
        money::round_money(aggregate.gross_revenue / aggregate.order_count as f64)
    } else {
        0.0
    };

    Ok(ok(SummaryPayload {
        summary: SalesSummary {
            start_date: query.start_date,
            end_date: query.end_date,
            order_count: aggregate.order_count,
            gross_revenue: aggregate.gross_revenue,
            average_ticket,
            discount_total: aggregate.discount_total,
            service_charge_total: aggregate.service_charge_total,
            payment_breakdowns: aggregate.payment_breakdowns,
        },
    }))
}
