//! 告警监控调度器
//!
//! 定时扫描数据库产生运营告警，按固定节奏轮询而非事件驱动：
//! 扫描是幂等的，单次失败只影响本轮。
//!
//! | 扫描 | 周期 | 规则 |
//! |------|------|------|
//! | 长时占台 | 15 分钟 | 占用超 2h 且订单未付款；同桌同类活跃告警 30 分钟内不重复 |
//! | 高额订单 | 30 分钟 | 1 小时内开的 open 订单总额 ≥ 500；每单终身只告警一次 |
//! | 清理 | 24 小时 | 终结 (resolved/dismissed) 超 30 天的告警硬删除 |
//!
//! 两种去重策略刻意不同：占台告警解决后可以再次触发（窗口去重），
//! 高额订单一单一报（终身去重）。
//!
//! 扫描函数接收 `now` 参数，测试可以注入时钟；循环传墙钟时间。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::core::BackgroundTasks;
use crate::db::repository::{RepoResult, alerts, orders, tables};
use shared::models::{AlertCreate, AlertKind, PaymentStatus};
use shared::util::now_millis;

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// 长时占台扫描周期
const LONG_DURATION_SCAN_INTERVAL: Duration = Duration::from_secs(15 * 60);
/// 高额订单扫描周期
const HIGH_VALUE_SCAN_INTERVAL: Duration = Duration::from_secs(30 * 60);
/// 清理周期
const CLEANUP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// 占用超过该时长且未付款的餐台触发告警
const TABLE_OCCUPATION_THRESHOLD_MS: i64 = 2 * HOUR_MS;
/// 同一餐台同类活跃告警的去重窗口
const TABLE_ALERT_DEDUP_WINDOW_MS: i64 = 30 * MINUTE_MS;
/// 高额订单阈值
const HIGH_VALUE_THRESHOLD: f64 = 500.0;
/// 高额扫描只看这个时间窗内开的订单
const HIGH_VALUE_ORDER_AGE_MS: i64 = HOUR_MS;
/// 终结告警的保留时长
const RESOLVED_RETENTION_MS: i64 = 30 * DAY_MS;

/// 告警监控器
///
/// `spawn_on` 把三个扫描循环登记到 [`BackgroundTasks`]。
/// 每个循环都响应关机令牌和 `wake` 信号（测试/运维立即触发一轮）。
pub struct AlertMonitor {
    pool: SqlitePool,
    wake: Arc<Notify>,
}

impl AlertMonitor {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            wake: Arc::new(Notify::new()),
        }
    }

    /// 唤醒句柄：notify_waiters 让所有扫描立即跑一轮
    pub fn wake_handle(&self) -> Arc<Notify> {
        self.wake.clone()
    }

    /// 注册三个定时扫描任务
    pub fn spawn_on(self, tasks: &mut BackgroundTasks) {
        let shutdown = tasks.shutdown_token();

        {
            let pool = self.pool.clone();
            let wake = self.wake.clone();
            let token = shutdown.clone();
            tasks.spawn("alert_long_duration_scan", async move {
                run_scan_loop(
                    "long_duration",
                    LONG_DURATION_SCAN_INTERVAL,
                    token,
                    wake,
                    move |now| {
                        let pool = pool.clone();
                        async move { scan_long_duration_tables(&pool, now).await }
                    },
                )
                .await;
            });
        }

        {
            let pool = self.pool.clone();
            let wake = self.wake.clone();
            let token = shutdown.clone();
            tasks.spawn("alert_high_value_scan", async move {
                run_scan_loop(
                    "high_value",
                    HIGH_VALUE_SCAN_INTERVAL,
                    token,
                    wake,
                    move |now| {
                        let pool = pool.clone();
                        async move { scan_high_value_orders(&pool, now).await }
                    },
                )
                .await;
            });
        }

        {
            let pool = self.pool;
            let wake = self.wake;
            tasks.spawn("alert_cleanup", async move {
                run_scan_loop("cleanup", CLEANUP_INTERVAL, shutdown, wake, move |now| {
                    let pool = pool.clone();
                    async move { cleanup_expired_alerts(&pool, now).await }
                })
                .await;
            });
        }
    }
}

/// 通用扫描循环：启动先跑一轮，然后按周期触发
///
/// 扫描错误记日志后吞掉，绝不终止循环或进程。
async fn run_scan_loop<F, Fut>(
    name: &'static str,
    interval: Duration,
    shutdown: CancellationToken,
    wake: Arc<Notify>,
    scan: F,
) where
    F: Fn(i64) -> Fut,
    Fut: Future<Output = RepoResult<u64>>,
{
    tracing::info!(scan = name, interval_secs = interval.as_secs(), "Alert scan started");

    tick(name, &scan).await;

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                tick(name, &scan).await;
            }
            _ = wake.notified() => {
                tracing::debug!(scan = name, "Immediate scan requested");
                tick(name, &scan).await;
            }
            _ = shutdown.cancelled() => {
                tracing::info!(scan = name, "Alert scan received shutdown signal");
                return;
            }
        }
    }
}

async fn tick<F, Fut>(name: &'static str, scan: &F)
where
    F: Fn(i64) -> Fut,
    Fut: Future<Output = RepoResult<u64>>,
{
    match scan(now_millis()).await {
        Ok(0) => tracing::debug!(scan = name, "Scan completed, nothing to report"),
        Ok(affected) => tracing::info!(scan = name, affected, "Scan completed"),
        Err(e) => tracing::error!(scan = name, error = %e, "Scan failed"),
    }
}

/// 长时占台扫描
///
/// 占用/待付款超过 2 小时且当前订单未付款的餐台，创建
/// `long_table_occupation` 告警。同一餐台 30 分钟内已有同类
/// 活跃 (pending/acknowledged) 告警则跳过。
///
/// 返回创建的告警数。
pub async fn scan_long_duration_tables(pool: &SqlitePool, now: i64) -> RepoResult<u64> {
    let opened_before = now - TABLE_OCCUPATION_THRESHOLD_MS;
    let stale = tables::find_stale_open(pool, opened_before).await?;

    let mut created = 0u64;
    for table in stale {
        let (Some(open_time), Some(order_id)) = (table.open_time, table.current_order_id) else {
            continue;
        };

        // 已付款的不催
        let Some(order) = orders::find_by_id(pool, order_id).await? else {
            continue;
        };
        if order.payment_status == PaymentStatus::Paid {
            continue;
        }

        let window_start = now - TABLE_ALERT_DEDUP_WINDOW_MS;
        if alerts::has_live_table_alert(pool, AlertKind::LongTableOccupation, table.id, window_start)
            .await?
        {
            continue;
        }

        let minutes_open = (now - open_time) / MINUTE_MS;
        alerts::create(
            pool,
            AlertCreate::long_table_occupation(&table, &order, minutes_open),
        )
        .await?;
        created += 1;
    }
    Ok(created)
}

/// 高额订单扫描
///
/// 最近 1 小时内开的、总额 ≥ 500 的 open 订单，每单创建一条
/// `high_value_order` 告警 — 终身去重，不看告警状态。
///
/// 返回创建的告警数。
pub async fn scan_high_value_orders(pool: &SqlitePool, now: i64) -> RepoResult<u64> {
    let created_after = now - HIGH_VALUE_ORDER_AGE_MS;
    let candidates = orders::find_high_value_open(pool, HIGH_VALUE_THRESHOLD, created_after).await?;

    let mut created = 0u64;
    for order in candidates {
        if alerts::has_order_alert(pool, AlertKind::HighValueOrder, order.id).await? {
            continue;
        }
        alerts::create(pool, AlertCreate::high_value_order(&order)).await?;
        created += 1;
    }
    Ok(created)
}

/// 清理扫描：硬删除终结超过 30 天的告警，返回删除行数
pub async fn cleanup_expired_alerts(pool: &SqlitePool, now: i64) -> RepoResult<u64> {
    let cutoff = now - RESOLVED_RETENTION_MS;
    alerts::cleanup_terminal_before(pool, cutoff).await
}
