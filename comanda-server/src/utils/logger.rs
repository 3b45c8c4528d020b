//! 日志初始化
//!
//! tracing 全局订阅器。级别优先读 `RUST_LOG` (支持按 target 过滤，
//! 例如 `RUST_LOG=info,security=debug`)，未设置时用传入的默认级别。
//!
//! 给了日志目录就同时写按天滚动的文件 (`comanda-server.YYYY-MM-DD`)；
//! 目录不存在时退回纯控制台输出，不报错。

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// 控制台输出，默认级别
pub fn init_logger() {
    init_logger_with_file(None, None);
}

/// 初始化全局日志订阅器
///
/// `log_level` 只在 `RUST_LOG` 未设置时生效；`log_dir` 指向已存在的
/// 目录时附加按天滚动的文件输出。
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) {
    let fallback = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match log_dir.map(Path::new).filter(|dir| dir.exists()) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "comanda-server");
            builder.with_writer(appender).init();
        }
        None => builder.init(),
    }
}
