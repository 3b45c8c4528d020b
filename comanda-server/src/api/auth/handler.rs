//! Authentication Handlers
//!
//! Handles login and current-user lookup. Logout is client-side token
//! removal; there is no server session to destroy.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::auth::{CurrentUser, role_permissions};
use crate::core::ServerState;
use crate::db::repository::users;
use crate::security_log;
use crate::utils::{AppError, AppResponse, AppResult, ok};
use shared::models::{LoginRequest, UserResponse};

/// Login response with JWT token
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// POST /api/auth/login - 登录换取令牌
///
/// 失败时统一返回 "Invalid username or password"，避免用户名枚举；
/// 账号停用返回 403。
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<AppResponse<LoginResponse>> {
    let user = users::find_by_username(state.pool(), &req.username)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| {
            security_log!("WARN", "login_unknown_user", username = req.username.clone());
            AppError::invalid_credentials()
        })?;

    if !user.is_active {
        security_log!(
            "WARN",
            "login_disabled_account",
            user_id = user.id,
            username = user.username.clone()
        );
        return Err(AppError::forbidden("Account has been disabled"));
    }

    let password_valid = users::verify_password(&user.password_hash, &req.password)
        .map_err(|e| AppError::internal(format!("Password verification failed: {e}")))?;
    if !password_valid {
        security_log!(
            "WARN",
            "login_bad_password",
            user_id = user.id,
            username = user.username.clone()
        );
        return Err(AppError::invalid_credentials());
    }

    let permissions = role_permissions(user.role);
    let token = state
        .jwt()
        .generate_token(user.id, &user.username, user.role.as_str(), &permissions)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))?;

    tracing::info!(
        user_id = user.id,
        username = %user.username,
        role = user.role.as_str(),
        "User logged in successfully"
    );

    Ok(ok(LoginResponse {
        token,
        user: user.into(),
    }))
}

/// GET /api/auth/me - 当前登录用户
///
/// Re-reads the user row so role/name edits and deactivation apply
/// without waiting for the token to expire.
pub async fn me(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<AppResponse<UserPayload>> {
    let user = users::find_by_id(state.pool(), current.id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found(format!("User {} not found", current.id)))?;

    if !user.is_active {
        return Err(AppError::forbidden("Account has been disabled"));
    }

    Ok(ok(UserPayload { user: user.into() }))
}

#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub user: UserResponse,
}
