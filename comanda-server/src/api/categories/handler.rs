//! Category API handlers (菜单分类)

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::repository::categories;
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_message, ok_with_message};
use shared::models::{Category, CategoryCreate, CategoryUpdate};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Serialize)]
pub struct CategoriesPayload {
    pub categories: Vec<Category>,
}

#[derive(Debug, Serialize)]
pub struct CategoryPayload {
    pub category: Category,
}

/// GET /api/categories - 分类列表，默认只含启用项
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<AppResponse<CategoriesPayload>> {
    let categories = categories::find_all(state.pool(), query.include_inactive).await?;
    Ok(ok(CategoriesPayload { categories }))
}

/// GET /api/categories/{id} - 获取单个分类
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<AppResponse<CategoryPayload>> {
    let category = categories::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Category {id} not found")))?;
    Ok(ok(CategoryPayload { category }))
}

/// POST /api/categories - 新建分类
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CategoryCreate>,
) -> AppResult<AppResponse<CategoryPayload>> {
    let category = categories::create(state.pool(), payload).await?;
    Ok(ok_with_message(CategoryPayload { category }, "Category created"))
}

/// PUT /api/categories/{id} - 更新分类
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryUpdate>,
) -> AppResult<AppResponse<CategoryPayload>> {
    let category = categories::update(state.pool(), id, payload).await?;
    Ok(ok(CategoryPayload { category }))
}

/// DELETE /api/categories/{id} - 停用分类 (软删除)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<AppResponse<()>> {
    categories::deactivate(state.pool(), id).await?;
    Ok(ok_message("Category deactivated"))
}
