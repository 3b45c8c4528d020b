//! User Administration Handlers
//!
//! 永远只对外返回 [`UserResponse`]，密码哈希不出仓库层。

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::users;
use crate::security_log;
use crate::utils::{AppResponse, AppResult, ok, ok_message, ok_with_message};
use shared::models::{UserCreate, UserPasswordReset, UserResponse, UserUpdate};

#[derive(Debug, Serialize)]
pub struct UsersPayload {
    pub users: Vec<UserResponse>,
}

#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub user: UserResponse,
}

/// GET /api/users - 用户列表 (含停用账号)
pub async fn list(State(state): State<ServerState>) -> AppResult<AppResponse<UsersPayload>> {
    let users = users::find_all(state.pool()).await?;
    Ok(ok(UsersPayload {
        users: users.into_iter().map(UserResponse::from).collect(),
    }))
}

/// POST /api/users - 创建用户
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<UserCreate>,
) -> AppResult<AppResponse<UserPayload>> {
    let user = users::create(state.pool(), payload).await?;

    security_log!(
        "INFO",
        "user_created",
        user_id = user.id,
        username = user.username.clone(),
        role = user.role.as_str(),
        created_by = current.id
    );

    Ok(ok_with_message(
        UserPayload { user: user.into() },
        "User created",
    ))
}

/// PUT /api/users/{id} - 更新用户 (角色/显示名/启停)
///
/// 最后一名在职管理员不可降级或停用。
pub async fn update(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdate>,
) -> AppResult<AppResponse<UserPayload>> {
    let role_change = payload.role;
    let user = users::update(state.pool(), id, payload).await?;

    if let Some(role) = role_change {
        security_log!(
            "INFO",
            "user_role_changed",
            user_id = user.id,
            new_role = role.as_str(),
            changed_by = current.id
        );
    }

    Ok(ok(UserPayload { user: user.into() }))
}

/// POST /api/users/{id}/password - 重置密码
pub async fn reset_password(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<UserPasswordReset>,
) -> AppResult<AppResponse<()>> {
    users::reset_password(state.pool(), id, &payload.password).await?;

    security_log!(
        "INFO",
        "password_reset",
        user_id = id,
        reset_by = current.id
    );

    Ok(ok_message("Password reset"))
}

/// DELETE /api/users/{id} - 停用账号 (软删除)
pub async fn delete(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<AppResponse<()>> {
    users::deactivate(state.pool(), id).await?;

    security_log!(
        "INFO",
        "user_deactivated",
        user_id = id,
        deactivated_by = current.id
    );

    Ok(ok_message("User deactivated"))
}
