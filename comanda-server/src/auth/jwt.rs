//! JWT 令牌服务
//!
//! HS256 签名。密钥和有效期来自应用配置，环境变量的读取统一放在
//! `core::config`，这里只做编解码。
//!
//! 解码强制校验 iss/aud/exp；`Validation` 在构造服务时配好，之后复用。

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 默认令牌签发者
pub const DEFAULT_ISSUER: &str = "comanda-server";
/// 默认令牌受众
pub const DEFAULT_AUDIENCE: &str = "comanda-clients";

/// JWT 配置
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// 签名密钥 (至少 32 字节)
    pub secret: String,
    /// 令牌有效期 (分钟)
    pub expiration_minutes: i64,
    pub issuer: String,
    pub audience: String,
}

impl JwtConfig {
    pub fn new(secret: String, expiration_minutes: i64) -> Self {
        Self {
            secret,
            expiration_minutes,
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
        }
    }
}

/// 令牌负载
///
/// 标准声明 (sub/exp/iat/iss/aud) 加上鉴权需要的用户快照。
/// permissions 是逗号分隔串，令牌里不放嵌套结构。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 用户 ID (十进制字符串)
    pub sub: String,
    pub username: String,
    pub role: String,
    pub permissions: String,
    pub token_type: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

/// JWT 错误
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),
}

/// JWT 令牌服务
#[derive(Clone)]
pub struct JwtService {
    pub config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtService {
    pub fn with_config(config: JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            config,
        }
    }

    /// 为登录成功的用户签发访问令牌
    pub fn generate_token(
        &self,
        user_id: i64,
        username: &str,
        role: &str,
        permissions: &[String],
    ) -> Result<String, JwtError> {
        let issued_at = Utc::now();
        let expires_at = issued_at + Duration::minutes(self.config.expiration_minutes);

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            role: role.to_string(),
            permissions: permissions.join(","),
            token_type: "access".to_string(),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| JwtError::GenerationFailed(e.to_string()))
    }

    /// 验证签名和 iss/aud/exp，返回解码后的负载
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
                ErrorKind::InvalidSignature => JwtError::InvalidSignature,
                _ => JwtError::InvalidToken(e.to_string()),
            })
    }

    /// 从 `Authorization: Bearer <token>` 头取出令牌部分
    pub fn extract_from_header(header: &str) -> Option<&str> {
        header.strip_prefix("Bearer ")
    }
}

/// 当前用户上下文
///
/// 认证中间件解出 [`Claims`] 后转成这个结构塞进请求扩展，
/// 处理函数通过 extractor 取用。
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub permissions: Vec<String>,
}

impl TryFrom<Claims> for CurrentUser {
    type Error = JwtError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims
            .sub
            .parse()
            .map_err(|_| JwtError::InvalidToken(format!("non-numeric subject: {}", claims.sub)))?;

        let permissions = claims
            .permissions
            .split(',')
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            id,
            username: claims.username,
            role: claims.role,
            permissions,
        })
    }
}

impl CurrentUser {
    /// 管理员 (`role == "admin"`) 绕过所有权限检查
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    /// 权限检查
    ///
    /// 授权项有三种形式：精确 (`orders:close`)、资源通配
    /// (`orders:*`)、全量 (`all`)。
    pub fn has_permission(&self, permission: &str) -> bool {
        if self.is_admin() {
            return true;
        }
        self.permissions.iter().any(|granted| {
            granted == "all"
                || granted == permission
                || granted.strip_suffix(":*").is_some_and(|prefix| {
                    permission
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with(':'))
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_with(expiration_minutes: i64) -> JwtService {
        JwtService::with_config(JwtConfig::new(
            "unit-test-secret-key-0123456789-abcdef".to_string(),
            expiration_minutes,
        ))
    }

    #[test]
    fn test_roundtrip_preserves_claims() {
        let service = service_with(60);
        let permissions = vec!["menu:manage".to_string(), "reports:view".to_string()];

        let token = service
            .generate_token(123, "joao", "manager", &permissions)
            .expect("generate token");
        let claims = service.validate_token(&token).expect("validate token");

        assert_eq!(claims.sub, "123");
        assert_eq!(claims.username, "joao");
        assert_eq!(claims.role, "manager");
        assert_eq!(claims.permissions, "menu:manage,reports:view");

        let user = CurrentUser::try_from(claims).expect("claims should convert");
        assert_eq!(user.id, 123);
        assert_eq!(user.permissions.len(), 2);
    }

    #[test]
    fn test_validation_rejects_wrong_secret() {
        let service = service_with(60);
        let other = JwtService::with_config(JwtConfig::new(
            "a-completely-different-secret-key-xyz!".to_string(),
            60,
        ));

        let token = service.generate_token(1, "ana", "waiter", &[]).expect("generate token");
        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_reported_as_such() {
        // 负有效期签出来的令牌一出生就过期 (超出默认 leeway)
        let service = service_with(-10);
        let token = service.generate_token(1, "ana", "waiter", &[]).expect("generate token");
        assert!(matches!(
            service.validate_token(&token),
            Err(JwtError::ExpiredToken)
        ));
    }

    #[test]
    fn test_wildcard_permissions() {
        let user = CurrentUser {
            id: 1,
            username: "joao".to_string(),
            role: "waiter".to_string(),
            permissions: vec!["waste:record".to_string(), "products:*".to_string()],
        };

        assert!(user.has_permission("waste:record"));
        assert!(user.has_permission("products:create"));
        assert!(!user.has_permission("users:manage"));
        // 通配符只在资源段边界上匹配
        assert!(!user.has_permission("productsextra:create"));
    }

    #[test]
    fn test_all_grant_and_admin_role() {
        let cashier = CurrentUser {
            id: 2,
            username: "maria".to_string(),
            role: "cashier".to_string(),
            permissions: vec!["all".to_string()],
        };
        assert!(cashier.has_permission("users:manage"));

        let admin = CurrentUser {
            id: 1,
            username: "admin".to_string(),
            role: "admin".to_string(),
            permissions: vec![],
        };
        assert!(admin.is_admin());
        assert!(admin.has_permission("menu:manage"));
    }

    #[test]
    fn test_non_numeric_subject_rejected() {
        let claims = Claims {
            sub: "not-a-number".to_string(),
            username: "x".to_string(),
            role: "waiter".to_string(),
            permissions: String::new(),
            token_type: "access".to_string(),
            exp: 0,
            iat: 0,
            iss: DEFAULT_ISSUER.to_string(),
            aud: DEFAULT_AUDIENCE.to_string(),
        };

        assert!(CurrentUser::try_from(claims).is_err());
    }
}
