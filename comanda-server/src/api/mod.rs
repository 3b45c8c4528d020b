//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 认证相关接口
//! - [`tables`] - 桌台管理接口
//! - [`orders`] - 订单管理接口
//! - [`order_items`] - 订单条目(出品)接口
//! - [`categories`] - 分类管理接口
//! - [`products`] - 商品管理接口
//! - [`cash_registers`] - 收银机/钱箱接口
//! - [`alerts`] - 告警管理接口
//! - [`customers`] - 客户档案接口
//! - [`waste_logs`] - 报损登记接口
//! - [`reports`] - 销售报表接口
//! - [`backups`] - 备份导出接口
//! - [`users`] - 用户管理接口

pub mod auth;
pub mod health;

// Floor operations
pub mod order_items;
pub mod orders;
pub mod tables;

// Catalog
pub mod categories;
pub mod products;

// Money
pub mod cash_registers;

// Back office
pub mod alerts;
pub mod backups;
pub mod customers;
pub mod reports;
pub mod users;
pub mod waste_logs;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};
