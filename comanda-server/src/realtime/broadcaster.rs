//! 实时事件广播器
//!
//! # 架构
//!
//! ```text
//! handler ──▶ publish() ──▶ broadcast::Sender<RealtimeEvent>
//!                                    │
//!                        ┌───────────┴───────────┐
//!                        ▼                       ▼
//!              RoomSubscription          RoomSubscription
//!              (joined: tables)          (joined: kitchen, reports)
//!                        │                       │
//!                        ▼                       ▼
//!                  WebSocket 连接           WebSocket 连接
//! ```
//!
//! 发布方对传输层一无所知：事件带着目标房间进入广播通道，
//! 每个订阅端在 `recv()` 里按自己加入的房间过滤。慢消费者会
//! 经历 broadcast 通道的滞后丢弃，客户端靠重新拉取补偿。

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use shared::realtime::{RealtimeEvent, Room};

/// Capacity of the broadcast channel
const CHANNEL_CAPACITY: usize = 1024;

/// 一条活跃连接的诊断信息
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub user_id: i64,
    pub username: String,
    pub connected_at: i64,
}

/// 事件广播器 - 发布/订阅中心
///
/// Clone 是浅拷贝；所有克隆共享同一个通道和连接注册表。
#[derive(Debug, Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<RealtimeEvent>,
    /// 活跃连接注册表 (连接 ID -> 诊断信息)
    connections: Arc<DashMap<Uuid, ConnectionInfo>>,
}

impl Broadcaster {
    /// 创建默认容量的广播器
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    /// 创建指定容量的广播器
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            connections: Arc::new(DashMap::new()),
        }
    }

    /// 发布事件到所有订阅者
    ///
    /// 返回收到事件的订阅者数量；没有订阅者时返回 0 (不是错误，
    /// 空餐厅也要能正常下单)。
    pub fn publish(&self, event: RealtimeEvent) -> usize {
        let event_name = event.message.event_name();
        match self.tx.send(event) {
            Ok(receivers) => {
                tracing::debug!(event = event_name, receivers, "Realtime event published");
                receivers
            }
            Err(_) => 0,
        }
    }

    /// 创建一个新订阅，初始不加入任何房间
    pub fn subscribe(&self) -> RoomSubscription {
        RoomSubscription {
            rx: self.tx.subscribe(),
            rooms: HashSet::new(),
        }
    }

    /// 登记一条连接，返回其诊断 ID
    pub fn register_connection(&self, info: ConnectionInfo) -> Uuid {
        let id = Uuid::new_v4();
        self.connections.insert(id, info);
        id
    }

    /// 注销一条连接
    pub fn unregister_connection(&self, id: &Uuid) {
        self.connections.remove(id);
    }

    /// 当前活跃连接数
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

/// 带房间过滤的事件订阅
///
/// 每个 WebSocket 连接持有一个。`join` 幂等；`recv` 只返回目标
/// 房间与已加入房间有交集的事件。
pub struct RoomSubscription {
    rx: broadcast::Receiver<RealtimeEvent>,
    rooms: HashSet<Room>,
}

impl RoomSubscription {
    /// 加入房间；重复加入是空操作，返回 false
    pub fn join(&mut self, room: Room) -> bool {
        self.rooms.insert(room)
    }

    /// 已加入的房间集合
    pub fn joined(&self) -> &HashSet<Room> {
        &self.rooms
    }

    /// 等待下一个目标包含已加入房间的事件
    ///
    /// 滞后丢弃 (Lagged) 记录警告后继续——客户端把事件当失效
    /// 提示，漏掉的靠重新拉取。通道关闭时返回 `None`。
    pub async fn recv(&mut self) -> Option<RealtimeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.targets_any(&self.rooms) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Realtime subscriber lagged, events dropped");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{CashTransactionKind, TableStatus};

    #[tokio::test]
    async fn events_reach_only_joined_rooms() {
        let broadcaster = Broadcaster::new();

        let mut reports = broadcaster.subscribe();
        reports.join(Room::Reports);

        let mut kitchen = broadcaster.subscribe();
        kitchen.join(Room::Kitchen);

        // cash 事件目标是 cash + reports
        broadcaster.publish(RealtimeEvent::cash_register_update(
            1,
            CashTransactionKind::Deposit,
            150.0,
        ));
        // 随后一个 kitchen 能收到的事件，用于证明上一个被过滤掉了
        broadcaster.publish(RealtimeEvent::new_order(10, 2));

        let first = reports.recv().await.unwrap();
        assert_eq!(first.message.event_name(), "cashRegisterUpdate");

        let first_kitchen = kitchen.recv().await.unwrap();
        assert_eq!(first_kitchen.message.event_name(), "newOrder");
    }

    #[tokio::test]
    async fn join_is_idempotent() {
        let broadcaster = Broadcaster::new();
        let mut sub = broadcaster.subscribe();

        assert!(sub.join(Room::Tables));
        assert!(!sub.join(Room::Tables));
        assert_eq!(sub.joined().len(), 1);

        broadcaster.publish(RealtimeEvent::table_update(3, TableStatus::Occupied));
        let event = sub.recv().await.unwrap();
        assert_eq!(event.message.event_name(), "tableUpdate");
    }

    #[tokio::test]
    async fn specific_table_room_filters_by_id() {
        let broadcaster = Broadcaster::new();
        let mut table_five = broadcaster.subscribe();
        table_five.join(Room::Table(5));

        // 另一桌的更新不应到达
        broadcaster.publish(RealtimeEvent::order_update(100, 7, 25.0));
        broadcaster.publish(RealtimeEvent::order_update(101, 5, 40.0));

        let event = table_five.recv().await.unwrap();
        match event.message {
            shared::realtime::ServerMessage::OrderUpdate { table_id, .. } => {
                assert_eq!(table_id, 5)
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn connection_registry_tracks_count() {
        let broadcaster = Broadcaster::new();
        assert_eq!(broadcaster.connection_count(), 0);

        let id = broadcaster.register_connection(ConnectionInfo {
            user_id: 1,
            username: "garcom".into(),
            connected_at: 0,
        });
        assert_eq!(broadcaster.connection_count(), 1);

        broadcaster.unregister_connection(&id);
        assert_eq!(broadcaster.connection_count(), 0);
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let broadcaster = Broadcaster::new();
        let reached = broadcaster.publish(RealtimeEvent::table_update(1, TableStatus::Free));
        assert_eq!(reached, 0);
    }
}
