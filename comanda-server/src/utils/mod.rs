//! 工具模块 - 通用工具函数和类型
//!
//! # 内容
//!
//! - [`AppError`] / [`AppResult`] - 应用错误类型
//! - [`AppResponse`] - `{success, message?, ...payload}` 响应结构
//! - 日志、时间、输入验证工具

pub mod error;
pub mod logger;
pub mod time;
pub mod validation;

pub use error::{AppError, AppResponse, AppResult};
pub use error::{ok, ok_message, ok_with_message};
