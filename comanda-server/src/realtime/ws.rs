//! WebSocket endpoint — 实时事件推送
//!
//! GET /ws?token=<JWT>
//! 令牌放 query 参数：浏览器的 WebSocket API 发不了自定义请求头。
//!
//! 协议:
//! - Client → Server: [`ClientMessage`] (joinTableRoom, joinKitchenRoom,
//!   joinSpecificTable, joinReportsRoom, joinCashRoom, requestDataUpdate)
//! - Server → Client: [`ServerMessage`] (tableUpdate, orderUpdate,
//!   orderStatusChanged, newOrder, cashRegisterUpdate, dataUpdate)
//!
//! 连接在升级前验证令牌；加入房间是幂等的；`requestDataUpdate`
//! 只回给发起连接一个 `dataUpdate` 单播。

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::time::Duration;

use crate::auth::{CurrentUser, JwtError};
use crate::core::ServerState;
use crate::realtime::broadcaster::ConnectionInfo;
use crate::security_log;
use crate::utils::{AppError, AppResult};
use shared::realtime::{ClientMessage, RealtimeEvent, ServerMessage};
use shared::util::now_millis;

/// 心跳间隔
const PING_INTERVAL: Duration = Duration::from_secs(30);

pub fn router() -> Router<ServerState> {
    Router::new().route("/ws", get(handle_ws))
}

#[derive(Deserialize)]
pub struct WsAuthQuery {
    token: String,
}

/// GET /ws?token=<JWT> — upgrade to WebSocket
async fn handle_ws(
    State(state): State<ServerState>,
    Query(query): Query<WsAuthQuery>,
    ws: WebSocketUpgrade,
) -> AppResult<impl IntoResponse> {
    // 升级前先验令牌，坏令牌直接拒绝 HTTP 握手
    let claims = state.jwt().validate_token(&query.token).map_err(|e| {
        security_log!("WARN", "ws_auth_failed", error = format!("{}", e));
        match e {
            JwtError::ExpiredToken => AppError::TokenExpired,
            _ => AppError::InvalidToken("Invalid token".to_string()),
        }
    })?;
    let user = CurrentUser::try_from(claims)
        .map_err(|e| AppError::InvalidToken(format!("Malformed JWT claims: {}", e)))?;

    Ok(ws.on_upgrade(move |socket| ws_session(socket, state, user)))
}

async fn ws_session(socket: WebSocket, state: ServerState, user: CurrentUser) {
    let (mut sink, mut stream) = socket.split();

    let mut subscription = state.broadcaster.subscribe();
    let conn_id = state.broadcaster.register_connection(ConnectionInfo {
        user_id: user.id,
        username: user.username.clone(),
        connected_at: now_millis(),
    });

    tracing::info!(
        username = %user.username,
        connections = state.broadcaster.connection_count(),
        "WebSocket connected"
    );

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // interval 的第一跳是立即的，吞掉

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }

            // 广播通道里目标命中已加入房间的事件
            event = subscription.recv() => {
                match event {
                    Some(event) => {
                        if send_message(&mut sink, &event.message).await.is_err() {
                            break;
                        }
                    }
                    None => break, // broadcaster dropped
                }
            }

            // 客户端消息
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let client_msg: ClientMessage = match serde_json::from_str(&text) {
                            Ok(m) => m,
                            Err(e) => {
                                tracing::debug!(username = %user.username, "Ignoring invalid client message: {e}");
                                continue;
                            }
                        };

                        match client_msg.join_room() {
                            Some(room) => {
                                if subscription.join(room) {
                                    tracing::debug!(username = %user.username, room = %room, "Joined room");
                                }
                            }
                            None => {
                                // requestDataUpdate: 单播失效提示给发起连接
                                let hint = RealtimeEvent::data_update();
                                if send_message(&mut sink, &hint.message).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::warn!(username = %user.username, "WebSocket error: {e}");
                        break;
                    }
                    _ => {} // Binary, Pong — ignore
                }
            }
        }
    }

    // Send Close frame (best-effort)
    let _ = sink.close().await;

    state.broadcaster.unregister_connection(&conn_id);
    tracing::info!(
        username = %user.username,
        connections = state.broadcaster.connection_count(),
        "WebSocket disconnected"
    );
}

async fn send_message<S>(sink: &mut S, message: &ServerMessage) -> Result<(), ()>
where
    S: futures::Sink<Message, Error = axum::Error> + Unpin,
{
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to serialize server message: {e}");
            return Ok(()); // drop the frame, keep the connection
        }
    };
    sink.send(Message::Text(json.into())).await.map_err(|e| {
        tracing::debug!("WebSocket send failed: {e}");
    })
}
