//! 错误类型与响应封套
//!
//! [`AppError`] 是 handler 层唯一的错误类型，[`AppResponse`] 是唯一的
//! 响应封套 (`{success, message?, ...payload}`)。仓储层的 [`RepoError`]
//! 经 `From` 映射成对应的 HTTP 状态。
//!
//! ```ignore
//! Err(AppError::not_found("Order not found"))   // 404 封套
//! Ok(ok(TablePayload { table }))                // 200 封套
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::db::repository::RepoError;

/// API 统一响应结构
///
/// Success and error bodies both carry `success`; the payload is
/// flattened into the top level:
///
/// ```json
/// { "success": true, "message": "Register opened", "register": { ... } }
/// ```
#[derive(Debug, Serialize)]
pub struct AppResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> IntoResponse for AppResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// 应用错误枚举
///
/// | 分类 | HTTP | 说明 |
/// |------|------|------|
/// | 认证错误 | 401 | 未登录、令牌过期、无效令牌 |
/// | 权限错误 | 403 | 角色/权限不足 |
/// | 资源不存在 | 404 | 实体缺失 |
/// | 验证失败 | 400 | 字段缺失或非法 |
/// | 状态冲突 | 400 | 当前实体状态下操作非法 (余额不足等) |
/// | 重复资源 | 409 | 唯一约束冲突 |
/// | 系统错误 | 500 | 数据库/内部错误 |
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== 认证 / 授权 ==========
    #[error("Authentication required")]
    Unauthorized,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    // ========== 业务错误 ==========
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Operation invalid for the entity's current state — closed order,
    /// closed register, insufficient balance, ...
    #[error("Invalid state: {0}")]
    InvalidState(String),

    // ========== 服务端错误 ==========
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Result alias used by handlers
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Please login first".to_string()),
            AppError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token expired".to_string()),
            AppError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),

            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),

            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::InvalidState(msg) => (StatusCode::BAD_REQUEST, msg.clone()),

            // 5xx 不把内部细节透给客户端，只记日志
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error escalated to 500");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error escalated to 500");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(AppResponse::<()> {
            success: false,
            message: Some(message),
            data: None,
        });

        (status, body).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound(msg) => AppError::NotFound(msg),
            RepoError::Duplicate(msg) => AppError::Conflict(msg),
            RepoError::Validation(msg) => AppError::Validation(msg),
            RepoError::State(msg) => AppError::InvalidState(msg),
            RepoError::Database(msg) => AppError::Database(msg),
        }
    }
}

// ========== 快捷构造 ==========

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Unified message to prevent username enumeration during login
    pub fn invalid_credentials() -> Self {
        Self::Validation("Invalid username or password".to_string())
    }
}

// ========== 成功封套 ==========

/// 带 payload 的成功响应
pub fn ok<T: Serialize>(data: T) -> AppResponse<T> {
    AppResponse {
        success: true,
        message: None,
        data: Some(data),
    }
}

/// 带 payload 和提示消息的成功响应
pub fn ok_with_message<T: Serialize>(data: T, message: impl Into<String>) -> AppResponse<T> {
    AppResponse {
        success: true,
        message: Some(message.into()),
        data: Some(data),
    }
}

/// 只有提示消息、没有 payload 的成功响应
pub fn ok_message(message: impl Into<String>) -> AppResponse<()> {
    AppResponse {
        success: true,
        message: Some(message.into()),
        data: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Payload {
        value: i64,
    }

    #[test]
    fn success_envelope_flattens_payload() {
        let body = serde_json::to_value(ok(Payload { value: 7 })).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["value"], 7);
        assert!(body.get("message").is_none());
        assert!(body.get("data").is_none());
    }

    #[test]
    fn message_only_envelope_has_no_payload_keys() {
        let body = serde_json::to_value(ok_message("done")).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "done");
    }
}
