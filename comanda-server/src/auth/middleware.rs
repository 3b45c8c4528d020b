//! 认证中间件
//!
//! `require_auth` 全局挂在 Router 上，负责把 Bearer 令牌换成请求
//! 扩展里的 [`CurrentUser`]；`require_permission` 按路由追加，只做
//! 权限判断。Bearer 头的解析验证收敛在 [`user_from_bearer`]，
//! extractor 复用同一套错误映射。

use axum::{
    extract::{Request, State},
    http,
    middleware::Next,
    response::Response,
};

use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;
use crate::utils::AppError;

/// 认证放行规则
///
/// - CORS 预检 (`OPTIONS *`)
/// - 非 `/api/` 路径：静态 404 和 `/ws` (WebSocket 在升级时自行校验 token)
/// - `/api/auth/login` 和 `/api/health`
fn skips_auth(method: &http::Method, path: &str) -> bool {
    method == http::Method::OPTIONS
        || !path.starts_with("/api/")
        || path == "/api/auth/login"
        || path.starts_with("/api/health")
}

/// Bearer 头 → 已验证的 [`CurrentUser`]
///
/// 缺头 401 Unauthorized，过期 TokenExpired，其余 InvalidToken；
/// 失败都会写 security 日志。
pub(super) fn user_from_bearer(
    state: &ServerState,
    auth_header: Option<&str>,
    uri: &http::Uri,
) -> Result<CurrentUser, AppError> {
    let Some(header) = auth_header else {
        security_log!("WARN", "auth_missing", uri = uri.to_string());
        return Err(AppError::Unauthorized);
    };
    let token = JwtService::extract_from_header(header)
        .ok_or_else(|| AppError::InvalidToken("Invalid authorization header".to_string()))?;

    let claims = state.jwt().validate_token(token).map_err(|e| {
        security_log!(
            "WARN",
            "auth_failed",
            error = e.to_string(),
            uri = uri.to_string()
        );
        match e {
            JwtError::ExpiredToken => AppError::TokenExpired,
            _ => AppError::InvalidToken("Invalid token".to_string()),
        }
    })?;

    CurrentUser::try_from(claims)
        .map_err(|e| AppError::InvalidToken(format!("Malformed JWT claims: {e}")))
}

/// 认证中间件
///
/// 除放行路径外的所有请求都要携带有效令牌；验证通过后
/// [`CurrentUser`] 注入请求扩展，供 extractor 和权限层取用。
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if skips_auth(req.method(), req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    let user = user_from_bearer(&state, auth_header, req.uri())?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// 按路由挂的权限检查层
///
/// 要求 `require_auth` 已经注入 [`CurrentUser`]；权限不足返回
/// 403 并写 security 日志。
///
/// ```ignore
/// .layer(middleware::from_fn(require_permission("menu:manage")))
/// ```
pub fn require_permission(
    permission: &'static str,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req
                .extensions()
                .get::<CurrentUser>()
                .ok_or(AppError::Unauthorized)?;

            if user.has_permission(permission) {
                return Ok(next.run(req).await);
            }

            security_log!(
                "WARN",
                "permission_denied",
                user_id = user.id,
                username = user.username.clone(),
                required_permission = permission
            );
            Err(AppError::forbidden(format!(
                "Permission denied: {permission}"
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_paths_skip_auth() {
        let get = http::Method::GET;
        assert!(skips_auth(&http::Method::OPTIONS, "/api/orders"));
        assert!(skips_auth(&get, "/ws"));
        assert!(skips_auth(&get, "/api/auth/login"));
        assert!(skips_auth(&get, "/api/health"));
    }

    #[test]
    fn api_paths_require_auth() {
        let get = http::Method::GET;
        assert!(!skips_auth(&get, "/api/orders"));
        assert!(!skips_auth(&get, "/api/auth/me"));
        assert!(!skips_auth(&http::Method::POST, "/api/tables/1/open"));
    }
}
