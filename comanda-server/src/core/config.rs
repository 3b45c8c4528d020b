use std::path::PathBuf;

use chrono_tz::Tz;
use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::auth::JwtConfig;

/// JWT 密钥最小长度 (HS256)
const MIN_JWT_SECRET_LEN: usize = 32;

/// 服务器配置 - 后端的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HOST | 0.0.0.0 | 监听地址 |
/// | PORT | 3000 | HTTP 服务端口 |
/// | WORK_DIR | ./data | 工作目录 (数据库、日志、备份) |
/// | DATABASE_PATH | {WORK_DIR}/database/comanda.db | 数据库文件 (支持 :memory:) |
/// | TIMEZONE | America/Sao_Paulo | 营业时区 (IANA 名称) |
/// | JWT_SECRET | (随机生成) | JWT 密钥，至少 32 字符 |
/// | JWT_EXPIRATION_MINUTES | 1440 | 令牌有效期(分钟) |
/// | ADMIN_PASSWORD | admin123 | 初始管理员密码 (仅首次播种) |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/var/lib/comanda PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 监听地址
    pub host: String,
    /// HTTP API 服务端口
    pub port: u16,
    /// 工作目录，存储数据库、日志和备份文件
    pub work_dir: String,
    /// 数据库文件路径覆盖 (未设置时使用 work_dir/database/comanda.db)
    pub database_path: Option<String>,
    /// 营业时区，报表的"营业日"边界按此时区计算
    pub timezone: Tz,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 初始管理员密码 (首次启动播种用)
    pub admin_password: String,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 日志级别
    pub log_level: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        let jwt_secret = resolve_jwt_secret();
        let jwt_expiration_minutes = std::env::var("JWT_EXPIRATION_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1440);

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            database_path: std::env::var("DATABASE_PATH").ok(),
            timezone: resolve_timezone(),
            jwt: JwtConfig::new(jwt_secret, jwt_expiration_minutes),
            admin_password: std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.port = port;
        config
    }

    /// 数据库文件路径
    ///
    /// `DATABASE_PATH` 显式设置时原样使用 (支持 `:memory:`)，
    /// 否则落在 work_dir/database/ 下
    pub fn database_file(&self) -> String {
        match &self.database_path {
            Some(path) => path.clone(),
            None => self
                .database_dir()
                .join("comanda.db")
                .to_string_lossy()
                .into_owned(),
        }
    }

    /// 数据库目录 work_dir/database
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// 日志目录 work_dir/logs
    pub fn logs_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 备份目录 work_dir/backups
    pub fn backups_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("backups")
    }

    /// 创建工作目录结构 (database/, logs/, backups/)
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        std::fs::create_dir_all(self.backups_dir())?;
        Ok(())
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// 解析 TIMEZONE 环境变量，非法名称回退到默认时区
fn resolve_timezone() -> Tz {
    match std::env::var("TIMEZONE") {
        Ok(name) => match name.parse::<Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                tracing::warn!(
                    timezone = %name,
                    "Unknown TIMEZONE, falling back to America/Sao_Paulo"
                );
                chrono_tz::America::Sao_Paulo
            }
        },
        Err(_) => chrono_tz::America::Sao_Paulo,
    }
}

/// 解析 JWT_SECRET 环境变量
///
/// 未设置或过短时生成一次性随机密钥：令牌在重启后全部失效，
/// 生产环境必须显式配置。
fn resolve_jwt_secret() -> String {
    match std::env::var("JWT_SECRET") {
        Ok(secret) if secret.len() >= MIN_JWT_SECRET_LEN => secret,
        Ok(_) => {
            tracing::warn!(
                "JWT_SECRET is shorter than {} characters; using a generated ephemeral secret",
                MIN_JWT_SECRET_LEN
            );
            generate_secret()
        }
        Err(_) => {
            tracing::warn!(
                "JWT_SECRET not set; using a generated ephemeral secret (tokens will not survive restarts)"
            );
            generate_secret()
        }
    }
}

/// 生成 64 字符随机密钥
fn generate_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secret_is_long_enough() {
        let secret = generate_secret();
        assert_eq!(secret.len(), 64);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn database_file_prefers_explicit_path() {
        let mut config = Config::with_overrides("/tmp/comanda-test", 0);
        config.database_path = Some(":memory:".into());
        assert_eq!(config.database_file(), ":memory:");

        config.database_path = None;
        assert!(config.database_file().ends_with("database/comanda.db"));
    }
}
