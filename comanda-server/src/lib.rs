//! Comanda Server - 餐厅销售点后端
//!
//! # 总览
//!
//! 单体后端，SQLite 单库，职责按模块切分：
//!
//! - **餐桌与订单** (`api/tables`, `api/orders`): 开台、点单、结账的完整流程
//! - **金额计算** (`money`): Decimal 精确运算，f64 只出现在存储边界
//! - **现金账本** (`api/cash_registers`): 收银机开关班与现金流水
//! - **告警监控** (`monitor`): 长时占台 / 高额订单定时扫描
//! - **实时推送** (`realtime`): 房间模型的 WebSocket 广播
//! - **认证** (`auth`): JWT 登录、Argon2 口令哈希、权限中间件
//! - **接口层** (`api`): REST 路由与 handler
//!
//! # 模块结构
//!
//! ```text
//! comanda-server/src/
//! ├── core/          # 配置、状态、服务器、后台任务
//! ├── auth/          # 登录、令牌、权限
//! ├── api/           # REST 路由与 handler
//! ├── realtime/      # WebSocket 推送
//! ├── monitor.rs     # 告警扫描
//! ├── money/         # 金额运算
//! ├── db/            # 连接池、迁移、仓储
//! └── utils/         # 错误、校验、时间、日志
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod money;
pub mod monitor;
pub mod realtime;
pub mod utils;

// 常用类型在 crate 根重导出，main.rs 和集成测试直接取用
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use monitor::AlertMonitor;
pub use realtime::Broadcaster;
pub use utils::logger::{init_logger, init_logger_with_file};
pub use utils::{AppError, AppResponse, AppResult};

// 安全事件走独立 target，RUST_LOG=security=debug 可单独调级
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            event = $event,
            level = $level,
            $($key = $value),*
        );
    };
}

/// 设置运行环境
///
/// 1. 加载 `.env` (不存在时静默跳过，生产环境用真实环境变量)
/// 2. 创建日志目录 (`{WORK_DIR}/logs`，默认 `./data/logs`)
/// 3. 初始化日志 (级别由 `LOG_LEVEL` 控制，默认 `info`)
pub fn setup_environment() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into());
    let log_dir = std::path::Path::new(&work_dir).join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
    utils::logger::init_logger_with_file(Some(&log_level), log_dir.to_str());

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
   ______                                __
  / ____/___  ____ ___  ____ _____  ____/ /___ _
 / /   / __ \/ __ `__ \/ __ `/ __ \/ __  / __ `/
/ /___/ /_/ / / / / / / /_/ / / / / /_/ / /_/ /
\____/\____/_/ /_/ /_/\__,_/_/ /_/\__,_/\__,_/
    "#
    );
}
