//! Shared types for the Comanda POS backend
//!
//! Data models, the realtime wire protocol, and ID/time utilities used by
//! the server and by integration tests. Enable the `db` feature to get
//! `sqlx::FromRow` derives on the model types.

pub mod models;
pub mod realtime;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Realtime re-exports (for convenient access)
pub use realtime::{ClientMessage, RealtimeEvent, Room, ServerMessage};

// Utility re-exports
pub use util::{now_millis, snowflake_id};
