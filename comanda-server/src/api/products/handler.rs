//! Product API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::core::ServerState;
use crate::db::repository::products;
use crate::utils::{AppError, AppResponse, AppResult, ok, ok_message, ok_with_message};
use shared::models::{Product, ProductAvailability, ProductCreate, ProductUpdate};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category_id: Option<i64>,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Serialize)]
pub struct ProductsPayload {
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct ProductPayload {
    pub product: Product,
}

/// GET /api/products - 获取商品列表 (可按分类过滤)
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<AppResponse<ProductsPayload>> {
    let products =
        products::find_all(state.pool(), query.category_id, query.include_inactive).await?;
    Ok(ok(ProductsPayload { products }))
}

/// GET /api/products/{id} - 获取单个商品
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<AppResponse<ProductPayload>> {
    let product = products::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id} not found")))?;
    Ok(ok(ProductPayload { product }))
}

/// POST /api/products - 创建商品
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ProductCreate>,
) -> AppResult<AppResponse<ProductPayload>> {
    let product = products::create(state.pool(), payload).await?;
    Ok(ok_with_message(ProductPayload { product }, "Product created"))
}

/// PUT /api/products/{id} - 更新商品
///
/// 改价只影响之后的点单；已点条目保留下单时的价格快照。
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<AppResponse<ProductPayload>> {
    let product = products::update(state.pool(), id, payload).await?;
    Ok(ok(ProductPayload { product }))
}

/// PATCH /api/products/{id}/availability - 估清/恢复供应
pub async fn set_availability(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProductAvailability>,
) -> AppResult<AppResponse<ProductPayload>> {
    let product = products::set_availability(state.pool(), id, payload.is_available).await?;

    tracing::info!(
        product_id = product.id,
        is_available = product.is_available,
        "Product availability changed"
    );

    Ok(ok(ProductPayload { product }))
}

/// DELETE /api/products/{id} - 停用商品 (软删除)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<AppResponse<()>> {
    products::deactivate(state.pool(), id).await?;
    Ok(ok_message("Product deactivated"))
}
