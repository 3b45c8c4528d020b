//! Cash Register API Handlers
//!
//! 每笔成功的钱箱操作都由 repository 在单一事务里记账，
//! 这里只负责鉴权上下文、差异告警和事件广播。

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{alerts, cash_registers};
use crate::money;
use crate::utils::time::date_range_millis;
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_with_message};
use shared::models::{
    AlertCreate, CashDrain, CashMovement, CashRegister, CashRegisterClose, CashRegisterCreate,
    CashRegisterOpen, CashTransaction,
};
use shared::realtime::RealtimeEvent;

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegistersPayload {
    pub registers: Vec<CashRegister>,
}

#[derive(Debug, Serialize)]
pub struct RegisterPayload {
    pub register: CashRegister,
}

/// Ledger operations return the refreshed register and the appended entry
#[derive(Debug, Serialize)]
pub struct RegisterOpPayload {
    pub register: CashRegister,
    pub transaction: CashTransaction,
}

#[derive(Debug, Serialize)]
pub struct TransactionsPayload {
    pub transactions: Vec<CashTransaction>,
}

/// GET /api/cash-registers - 获取所有收银点
pub async fn list(
    State(state): State<ServerState>,
) -> AppResult<AppResponse<RegistersPayload>> {
    let registers = cash_registers::find_all(state.pool()).await?;
    Ok(ok(RegistersPayload { registers }))
}

/// GET /api/cash-registers/{id} - 获取单个收银点
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<AppResponse<RegisterPayload>> {
    let register = cash_registers::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Register {id} not found")))?;
    Ok(ok(RegisterPayload { register }))
}

/// POST /api/cash-registers - 创建收银点
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CashRegisterCreate>,
) -> AppResult<AppResponse<RegisterPayload>> {
    let register = cash_registers::create(state.pool(), &payload.identifier).await?;
    Ok(ok_with_message(RegisterPayload { register }, "Register created"))
}

/// POST /api/cash-registers/{id}/open - 开箱
pub async fn open(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<CashRegisterOpen>,
) -> AppResult<AppResponse<RegisterOpPayload>> {
    let (register, transaction) = cash_registers::open_register(
        state.pool(),
        id,
        payload.opening_balance,
        current.id,
        &current.username,
    )
    .await?;

    state.publish(RealtimeEvent::cash_register_update(
        register.id,
        transaction.kind,
        register.current_balance,
    ));

    tracing::info!(
        register_id = register.id,
        opening_balance = transaction.amount,
        user_id = current.id,
        "Register opened"
    );

    Ok(ok_with_message(
        RegisterOpPayload { register, transaction },
        "Register opened",
    ))
}

/// POST /api/cash-registers/{id}/close - 关箱
///
/// `cash_count` 是实点金额；与账面余额不符时登记差异告警，
/// 告警失败只记日志，不回滚已完成的关箱。
pub async fn close(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<CashRegisterClose>,
) -> AppResult<AppResponse<RegisterOpPayload>> {
    let (register, transaction) = cash_registers::close_register(
        state.pool(),
        id,
        payload.closing_balance,
        current.id,
        &current.username,
    )
    .await?;

    if let Some(cash_count) = payload.cash_count
        && !money::money_eq(cash_count, transaction.previous_balance)
    {
        let alert = AlertCreate::cash_discrepancy(
            &register,
            transaction.previous_balance,
            cash_count,
            current.id,
        );
        if let Err(e) = alerts::create(state.pool(), alert).await {
            tracing::error!(register_id = register.id, error = %e, "Failed to record cash discrepancy alert");
        }
    }

    state.publish(RealtimeEvent::cash_register_update(
        register.id,
        transaction.kind,
        register.current_balance,
    ));

    tracing::info!(
        register_id = register.id,
        closing_balance = transaction.amount,
        user_id = current.id,
        "Register closed"
    );

    Ok(ok_with_message(
        RegisterOpPayload { register, transaction },
        "Register closed",
    ))
}

/// POST /api/cash-registers/{id}/deposit - 存入现金
pub async fn deposit(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<CashMovement>,
) -> AppResult<AppResponse<RegisterOpPayload>> {
    let (register, transaction) = cash_registers::deposit(
        state.pool(),
        id,
        payload.amount,
        payload.description,
        current.id,
        &current.username,
    )
    .await?;

    state.publish(RealtimeEvent::cash_register_update(
        register.id,
        transaction.kind,
        register.current_balance,
    ));

    Ok(ok(RegisterOpPayload { register, transaction }))
}

/// POST /api/cash-registers/{id}/withdraw - 取出现金
pub async fn withdraw(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<CashMovement>,
) -> AppResult<AppResponse<RegisterOpPayload>> {
    let (register, transaction) = cash_registers::withdraw(
        state.pool(),
        id,
        payload.amount,
        payload.description,
        current.id,
        &current.username,
    )
    .await?;

    state.publish(RealtimeEvent::cash_register_update(
        register.id,
        transaction.kind,
        register.current_balance,
    ));

    Ok(ok(RegisterOpPayload { register, transaction }))
}

/// POST /api/cash-registers/{id}/drain - 抽大钞 (sangria)
pub async fn drain(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<CashDrain>,
) -> AppResult<AppResponse<RegisterOpPayload>> {
    let (register, transaction) = cash_registers::drain(
        state.pool(),
        id,
        payload.amount,
        &payload.destination,
        current.id,
        &current.username,
    )
    .await?;

    state.publish(RealtimeEvent::cash_register_update(
        register.id,
        transaction.kind,
        register.current_balance,
    ));

    tracing::info!(
        register_id = register.id,
        amount = transaction.amount,
        destination = %payload.destination,
        user_id = current.id,
        "Register drained"
    );

    Ok(ok(RegisterOpPayload { register, transaction }))
}

/// GET /api/cash-registers/{id}/transactions - 流水 (按业务时区的日期区间)
pub async fn transactions(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Query(query): Query<TransactionsQuery>,
) -> AppResult<AppResponse<TransactionsPayload>> {
    // 404 before an empty list when the register itself is unknown
    if cash_registers::find_by_id(state.pool(), id).await?.is_none() {
        return Err(AppError::not_found(format!("Register {id} not found")));
    }

    let (start, end) = date_range_millis(
        query.start_date.as_deref(),
        query.end_date.as_deref(),
        state.config.timezone,
    )?;
    let transactions = cash_registers::find_transactions(state.pool(), id, start, end).await?;
    Ok(ok(TransactionsPayload { transactions }))
}
