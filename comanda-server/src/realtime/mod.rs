//! 实时推送 - 房间模型的发布/订阅
//!
//! [`Broadcaster`] 是与传输层解耦的发布/订阅中心；[`ws`] 把它接到
//! WebSocket 端点上。事件类型和房间映射在 `shared::realtime` 定义，
//! 测试无需真实连接即可驱动广播器。

pub mod broadcaster;
pub mod ws;

pub use broadcaster::{Broadcaster, ConnectionInfo, RoomSubscription};
