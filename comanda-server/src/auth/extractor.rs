//! CurrentUser 提取器
//!
//! 处理函数签名里写 `user: CurrentUser` 即可拿到已认证用户。
//! 正常请求走 `require_auth` 中间件，扩展里已有现成的；没经过
//! 中间件的路由退回自行验证 Bearer 头，错误映射与中间件一致。

use axum::{extract::FromRequestParts, http, http::request::Parts};

use crate::auth::CurrentUser;
use crate::auth::middleware::user_from_bearer;
use crate::core::ServerState;
use crate::utils::AppError;

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(cached) = parts.extensions.get::<CurrentUser>() {
            return Ok(cached.clone());
        }

        let bearer = parts.headers.get(http::header::AUTHORIZATION);
        let user = user_from_bearer(state, bearer.and_then(|v| v.to_str().ok()), &parts.uri)?;
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
