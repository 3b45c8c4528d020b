//! 后台任务注册表
//!
//! 服务器的常驻任务 (告警监控的三个扫描循环) 统一在这里登记，
//! 共享一个取消令牌；关机时先广播取消，再逐个等待退出。
//!
//! 任务闭包自己负责监听令牌。注册表只兜底两件事：捕获 panic
//! (单个扫描崩溃不能带走进程)，以及给退出等待设上限，不响应
//! 取消的任务记错误后放弃等待。

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// 关机时单个任务的退出等待上限
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// 后台任务注册表
///
/// `ServerState::start_background_tasks` 构造并填充，
/// `Server::run` 在监听循环结束后调用 [`shutdown`](Self::shutdown)。
pub struct BackgroundTasks {
    named: Vec<(&'static str, JoinHandle<()>)>,
    shutdown: CancellationToken,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self {
            named: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// 任务内部监听这个令牌退出
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// 登记并启动一个常驻任务
    ///
    /// future 包一层 panic 捕获；常驻任务在收到取消信号之前就
    /// 返回视为异常，记 warn。
    pub fn spawn<F>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.shutdown.clone();
        let handle = tokio::spawn(async move {
            match AssertUnwindSafe(future).catch_unwind().await {
                Ok(()) if token.is_cancelled() => {}
                Ok(()) => {
                    tracing::warn!(task = name, "Background task exited before shutdown");
                }
                Err(payload) => {
                    tracing::error!(
                        task = name,
                        panic = %panic_message(&payload),
                        "Background task panicked"
                    );
                }
            }
        });
        tracing::debug!(task = name, "Background task registered");
        self.named.push((name, handle));
    }

    pub fn len(&self) -> usize {
        self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.named.is_empty()
    }

    /// 启动完成后打一行摘要
    pub fn log_summary(&self) {
        let names: Vec<&str> = self.named.iter().map(|(name, _)| *name).collect();
        tracing::info!(count = names.len(), tasks = ?names, "Background tasks running");
    }

    /// 广播取消信号并逐个等待任务退出
    pub async fn shutdown(self) {
        tracing::info!(count = self.named.len(), "Stopping background tasks");
        self.shutdown.cancel();

        for (name, handle) in self.named {
            match tokio::time::timeout(SHUTDOWN_GRACE, handle).await {
                Ok(Ok(())) => tracing::debug!(task = name, "Background task stopped"),
                Ok(Err(e)) if e.is_cancelled() => {
                    tracing::debug!(task = name, "Background task aborted");
                }
                Ok(Err(e)) => {
                    tracing::error!(task = name, error = ?e, "Background task join failed");
                }
                Err(_) => {
                    tracing::error!(task = name, "Background task ignored shutdown signal");
                }
            }
        }

        tracing::info!("Background tasks stopped");
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutdown_cancels_waiting_tasks() {
        let mut tasks = BackgroundTasks::new();
        let token = tasks.shutdown_token();
        tasks.spawn("waiter", async move {
            token.cancelled().await;
        });

        assert_eq!(tasks.len(), 1);
        tasks.shutdown().await;
    }

    #[tokio::test]
    async fn panicking_task_does_not_poison_shutdown() {
        let mut tasks = BackgroundTasks::new();
        tasks.spawn("bomb", async {
            panic!("boom");
        });
        // panic 在包装层被吃掉，shutdown 仍要正常完成
        tasks.shutdown().await;
    }
}
