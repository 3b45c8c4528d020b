//! Customer API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::repository::customers;
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_message, ok_with_message};
use shared::models::{Customer, CustomerCreate, CustomerUpdate};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Matches name or phone, case-insensitive substring
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CustomersPayload {
    pub customers: Vec<Customer>,
}

#[derive(Debug, Serialize)]
pub struct CustomerPayload {
    pub customer: Customer,
}

/// GET /api/customers - 客户列表 (可按姓名/电话搜索)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<AppResponse<CustomersPayload>> {
    let customers = customers::find_all(state.pool(), query.search.as_deref()).await?;
    Ok(ok(CustomersPayload { customers }))
}

/// GET /api/customers/{id} - 获取单个客户
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<AppResponse<CustomerPayload>> {
    let customer = customers::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Customer {id} not found")))?;
    Ok(ok(CustomerPayload { customer }))
}

/// POST /api/customers - 创建客户档案
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CustomerCreate>,
) -> AppResult<AppResponse<CustomerPayload>> {
    let customer = customers::create(state.pool(), payload).await?;
    Ok(ok_with_message(CustomerPayload { customer }, "Customer created"))
}

/// PUT /api/customers/{id} - 更新客户档案
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CustomerUpdate>,
) -> AppResult<AppResponse<CustomerPayload>> {
    let customer = customers::update(state.pool(), id, payload).await?;
    Ok(ok(CustomerPayload { customer }))
}

/// DELETE /api/customers/{id} - 停用客户档案 (软删除)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<AppResponse<()>> {
    customers::deactivate(state.pool(), id).await?;
    Ok(ok_message("Customer deactivated"))
}
