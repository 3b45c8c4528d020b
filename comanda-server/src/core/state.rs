use std::path::PathBuf;
use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::JwtService;
use crate::core::tasks::BackgroundTasks;
use crate::core::Config;
use crate::db::{DbService, seed};
use crate::monitor::AlertMonitor;
use crate::realtime::Broadcaster;
use crate::utils::AppResult;
use shared::realtime::RealtimeEvent;
use shared::util::now_millis;

/// 服务器状态 - 持有所有服务的共享引用
///
/// ServerState 是后端的核心数据结构，通过 axum state 注入到每个
/// 处理器。Clone 是浅拷贝 (pool 和 broadcaster 内部都是 Arc)。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | DbService | SQLite 连接池 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
/// | broadcaster | Broadcaster | 实时事件广播 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 数据库服务
    pub db: DbService,
    /// JWT 认证服务 (Arc 共享所有权)
    pub jwt_service: Arc<JwtService>,
    /// 实时事件广播器
    pub broadcaster: Broadcaster,
    /// 进程启动时间 (Unix 毫秒)，健康检查用
    started_at: i64,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构 (database/, logs/, backups/)
    /// 2. 数据库连接池 + 迁移
    /// 3. 管理员播种 (无活跃管理员时)
    /// 4. JWT 服务和广播器
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        config.ensure_work_dir_structure().map_err(|e| {
            crate::utils::AppError::internal(format!(
                "Failed to create work directory structure: {e}"
            ))
        })?;

        let db = DbService::new(&config.database_file()).await?;

        seed::ensure_admin_user(&db.pool, &config.admin_password).await?;

        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let broadcaster = Broadcaster::new();

        Ok(Self {
            config: config.clone(),
            db,
            jwt_service,
            broadcaster,
            started_at: now_millis(),
        })
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 的监听循环之前调用。
    ///
    /// 启动的任务：告警监控的三个定时扫描
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        let monitor = AlertMonitor::new(self.db.pool.clone());
        monitor.spawn_on(&mut tasks);

        tasks.log_summary();
        tasks
    }

    /// 获取数据库连接池
    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    /// 获取 JWT 服务
    pub fn jwt(&self) -> &JwtService {
        &self.jwt_service
    }

    /// 获取工作目录
    pub fn work_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.work_dir)
    }

    /// 广播实时事件
    ///
    /// 变更已提交后调用；没有订阅者时静默丢弃。
    /// 客户端把事件当作失效提示，错过的事件靠重新拉取补偿。
    pub fn publish(&self, event: RealtimeEvent) {
        self.broadcaster.publish(event);
    }

    /// 进程运行时长(秒)，健康检查用
    pub fn uptime_seconds(&self) -> i64 {
        (now_millis() - self.started_at) / 1000
    }
}
