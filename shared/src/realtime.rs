//! Realtime wire protocol (实时推送协议)
//!
//! Typed messages exchanged over the WebSocket channel, plus the room
//! model used to scope fan-out. The broadcaster itself lives server-side;
//! these types are shared so clients and tests speak the same wire format.
//!
//! 客户端把收到的事件当作"失效提示"(invalidation hint)，触发重新拉取，
//! 而不是权威增量 —— 传输层不保证投递或顺序。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::{CashTransactionKind, OrderItemStatus, TableStatus};
use crate::util::now_millis;

// ==================== Rooms ====================

/// Named broadcast group (广播房间)
///
/// Clients join rooms explicitly; events are published to one or more
/// rooms and delivered only to connections that joined them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    /// Floor overview screens
    Tables,
    /// Kitchen display
    Kitchen,
    /// One specific table's detail view
    Table(i64),
    /// Management dashboards
    Reports,
    /// Register operations screens
    Cash,
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tables => write!(f, "tables"),
            Self::Kitchen => write!(f, "kitchen"),
            Self::Table(id) => write!(f, "table-{}", id),
            Self::Reports => write!(f, "reports"),
            Self::Cash => write!(f, "cash"),
        }
    }
}

impl FromStr for Room {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tables" => Ok(Self::Tables),
            "kitchen" => Ok(Self::Kitchen),
            "reports" => Ok(Self::Reports),
            "cash" => Ok(Self::Cash),
            other => match other.strip_prefix("table-") {
                Some(id) => id.parse::<i64>().map(Self::Table).map_err(|_| ()),
                None => Err(()),
            },
        }
    }
}

// ==================== Client -> Server ====================

/// Messages a connected client may send (客户端 -> 服务端)
///
/// Join messages are idempotent: joining an already-joined room is a
/// no-op. `requestDataUpdate` asks for a unicast `dataUpdate` hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientMessage {
    #[serde(rename = "joinTableRoom")]
    JoinTableRoom,
    #[serde(rename = "joinKitchenRoom")]
    JoinKitchenRoom,
    #[serde(rename = "joinSpecificTable")]
    JoinSpecificTable {
        #[serde(rename = "tableId")]
        table_id: i64,
    },
    #[serde(rename = "joinReportsRoom")]
    JoinReportsRoom,
    #[serde(rename = "joinCashRoom")]
    JoinCashRoom,
    #[serde(rename = "requestDataUpdate")]
    RequestDataUpdate,
}

impl ClientMessage {
    /// The room a join message targets; `None` for non-join messages
    pub fn join_room(&self) -> Option<Room> {
        match self {
            Self::JoinTableRoom => Some(Room::Tables),
            Self::JoinKitchenRoom => Some(Room::Kitchen),
            Self::JoinSpecificTable { table_id } => Some(Room::Table(*table_id)),
            Self::JoinReportsRoom => Some(Room::Reports),
            Self::JoinCashRoom => Some(Room::Cash),
            Self::RequestDataUpdate => None,
        }
    }
}

// ==================== Server -> Client ====================

/// Typed server events (服务端 -> 客户端)
///
/// Every payload carries the relevant IDs and a server timestamp (Unix
/// millis). Clients re-fetch on receipt; payloads are hints, not deltas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerMessage {
    #[serde(rename = "tableUpdate", rename_all = "camelCase")]
    TableUpdate {
        table_id: i64,
        status: TableStatus,
        timestamp: i64,
    },
    #[serde(rename = "orderUpdate", rename_all = "camelCase")]
    OrderUpdate {
        order_id: i64,
        table_id: i64,
        total: f64,
        timestamp: i64,
    },
    #[serde(rename = "orderStatusChanged", rename_all = "camelCase")]
    OrderStatusChanged {
        order_id: i64,
        table_id: i64,
        item_id: i64,
        status: OrderItemStatus,
        timestamp: i64,
    },
    #[serde(rename = "newOrder", rename_all = "camelCase")]
    NewOrder {
        order_id: i64,
        table_id: i64,
        timestamp: i64,
    },
    #[serde(rename = "cashRegisterUpdate", rename_all = "camelCase")]
    CashRegisterUpdate {
        register_id: i64,
        kind: CashTransactionKind,
        balance: f64,
        timestamp: i64,
    },
    #[serde(rename = "dataUpdate", rename_all = "camelCase")]
    DataUpdate { timestamp: i64 },
}

impl ServerMessage {
    /// Event name as it appears on the wire
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::TableUpdate { .. } => "tableUpdate",
            Self::OrderUpdate { .. } => "orderUpdate",
            Self::OrderStatusChanged { .. } => "orderStatusChanged",
            Self::NewOrder { .. } => "newOrder",
            Self::CashRegisterUpdate { .. } => "cashRegisterUpdate",
            Self::DataUpdate { .. } => "dataUpdate",
        }
    }
}

// ==================== Routed Event ====================

/// A server message bound to its target rooms (随路由信息的事件)
///
/// The room mapping is fixed per event source and encoded here in the
/// constructors so no call site can get the fan-out wrong:
///
/// | Source | Rooms |
/// |--------|-------|
/// | Table state change | `tables` |
/// | New order | `kitchen`, `reports` |
/// | Item/order change | `table-{id}`, `kitchen`, `reports` |
/// | Cash transaction | `cash`, `reports` |
#[derive(Debug, Clone)]
pub struct RealtimeEvent {
    /// For log correlation only, never on the wire
    pub id: Uuid,
    pub rooms: Vec<Room>,
    pub message: ServerMessage,
}

impl RealtimeEvent {
    fn new(rooms: Vec<Room>, message: ServerMessage) -> Self {
        Self {
            id: Uuid::new_v4(),
            rooms,
            message,
        }
    }

    /// Table status changed (opened, payment requested, closed)
    pub fn table_update(table_id: i64, status: TableStatus) -> Self {
        Self::new(
            vec![Room::Tables],
            ServerMessage::TableUpdate {
                table_id,
                status,
                timestamp: now_millis(),
            },
        )
    }

    /// A fresh order was opened for a table
    pub fn new_order(order_id: i64, table_id: i64) -> Self {
        Self::new(
            vec![Room::Kitchen, Room::Reports],
            ServerMessage::NewOrder {
                order_id,
                table_id,
                timestamp: now_millis(),
            },
        )
    }

    /// Order content changed (item added/removed, adjustments, close)
    pub fn order_update(order_id: i64, table_id: i64, total: f64) -> Self {
        Self::new(
            vec![Room::Table(table_id), Room::Kitchen, Room::Reports],
            ServerMessage::OrderUpdate {
                order_id,
                table_id,
                total,
                timestamp: now_millis(),
            },
        )
    }

    /// A line item moved through the kitchen workflow
    pub fn order_status_changed(
        order_id: i64,
        table_id: i64,
        item_id: i64,
        status: OrderItemStatus,
    ) -> Self {
        Self::new(
            vec![Room::Table(table_id), Room::Kitchen, Room::Reports],
            ServerMessage::OrderStatusChanged {
                order_id,
                table_id,
                item_id,
                status,
                timestamp: now_millis(),
            },
        )
    }

    /// A ledger operation went through
    pub fn cash_register_update(
        register_id: i64,
        kind: CashTransactionKind,
        balance: f64,
    ) -> Self {
        Self::new(
            vec![Room::Cash, Room::Reports],
            ServerMessage::CashRegisterUpdate {
                register_id,
                kind,
                balance,
                timestamp: now_millis(),
            },
        )
    }

    /// Unicast refresh hint, answering `requestDataUpdate`
    pub fn data_update() -> Self {
        Self::new(
            vec![],
            ServerMessage::DataUpdate {
                timestamp: now_millis(),
            },
        )
    }

    /// Whether a connection joined to `joined` should receive this event
    pub fn targets_any(&self, joined: &std::collections::HashSet<Room>) -> bool {
        self.rooms.iter().any(|r| joined.contains(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn room_display_round_trip() {
        for room in [
            Room::Tables,
            Room::Kitchen,
            Room::Table(42),
            Room::Reports,
            Room::Cash,
        ] {
            let parsed: Room = room.to_string().parse().unwrap();
            assert_eq!(parsed, room);
        }
        assert!("table-".parse::<Room>().is_err());
        assert!("lobby".parse::<Room>().is_err());
    }

    #[test]
    fn client_join_messages_map_to_rooms() {
        assert_eq!(ClientMessage::JoinKitchenRoom.join_room(), Some(Room::Kitchen));
        assert_eq!(
            ClientMessage::JoinSpecificTable { table_id: 7 }.join_room(),
            Some(Room::Table(7))
        );
        assert_eq!(ClientMessage::RequestDataUpdate.join_room(), None);
    }

    #[test]
    fn client_message_wire_format() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"event":"joinSpecificTable","data":{"tableId":3}}"#).unwrap();
        assert_eq!(msg, ClientMessage::JoinSpecificTable { table_id: 3 });

        let msg: ClientMessage = serde_json::from_str(r#"{"event":"joinCashRoom"}"#).unwrap();
        assert_eq!(msg, ClientMessage::JoinCashRoom);
    }

    #[test]
    fn server_message_wire_format_is_camel_case() {
        let event = RealtimeEvent::order_status_changed(1, 2, 3, OrderItemStatus::Ready);
        let json = serde_json::to_string(&event.message).unwrap();
        assert!(json.contains(r#""event":"orderStatusChanged""#));
        assert!(json.contains(r#""orderId":1"#));
        assert!(json.contains(r#""tableId":2"#));
        assert!(json.contains(r#""itemId":3"#));
        assert!(json.contains(r#""timestamp""#));
    }

    #[test]
    fn event_room_mapping() {
        let cash = RealtimeEvent::cash_register_update(1, CashTransactionKind::Deposit, 10.0);
        assert_eq!(cash.rooms, vec![Room::Cash, Room::Reports]);

        let item = RealtimeEvent::order_status_changed(1, 5, 3, OrderItemStatus::Preparing);
        assert_eq!(
            item.rooms,
            vec![Room::Table(5), Room::Kitchen, Room::Reports]
        );

        let mut joined = HashSet::new();
        joined.insert(Room::Reports);
        assert!(cash.targets_any(&joined));

        let mut kitchen_only = HashSet::new();
        kitchen_only.insert(Room::Kitchen);
        assert!(!cash.targets_any(&kitchen_only));
    }
}
