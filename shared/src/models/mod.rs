//! Data models
//!
//! Shared between comanda-server and frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` snowflakes, all timestamps `i64` Unix milliseconds.

pub mod alert;
pub mod backup;
pub mod cash_register;
pub mod category;
pub mod customer;
pub mod dining_table;
pub mod order;
pub mod order_item;
pub mod product;
pub mod report;
pub mod user;
pub mod waste_log;

// Re-exports
pub use alert::*;
pub use backup::*;
pub use cash_register::*;
pub use category::*;
pub use customer::*;
pub use dining_table::*;
pub use order::*;
pub use order_item::*;
pub use product::*;
pub use report::*;
pub use user::*;
pub use waste_log::*;
