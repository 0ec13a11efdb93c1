//! WebSocket upgrade handler and per-viewer event loop.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::time;

use crate::config::MAX_HEARTBEAT_INTERVAL_MS;
use crate::AppState;

use super::events::{
    ClientMessage, EventName, GatewayMessage, HeartbeatPayload, ReadyPayload, OP_HEARTBEAT,
};
use super::fanout::ChannelHandle;
use super::session::ViewerSession;

/// Close codes (4000-range for application-level).
const CLOSE_UNKNOWN_ERROR: u16 = 4000;
const CLOSE_UNKNOWN_OPCODE: u16 = 4001;
const CLOSE_SESSION_TIMEOUT: u16 = 4009;

type WsSink = SplitSink<WebSocket, Message>;
type WsStream = SplitStream<WebSocket>;

pub fn router() -> Router<AppState> {
    Router::new().route("/gateway", get(ws_upgrade))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: AppState) {
    let (mut ws_tx, ws_rx) = socket.split();

    // Subscribe before READY so every comment published after the viewer
    // sees READY is delivered.
    let channel = state.hub.subscribe();
    let mut session = ViewerSession::new(channel.viewer_id().to_string());

    tracing::info!(
        viewer_id = %session.viewer_id,
        live = state.hub.live_channels(),
        "viewer connected"
    );

    let heartbeat_interval = state.config.heartbeat_interval_ms;
    let ready_seq = session.next_seq();
    let ready = ReadyPayload {
        viewer_id: &session.viewer_id,
        heartbeat_interval,
    };
    let ready_msg = GatewayMessage::dispatch(
        EventName::READY,
        ready_seq,
        serde_json::to_value(&ready).unwrap_or_default(),
    );

    if send_message(&mut ws_tx, &ready_msg).await {
        run_session(&mut session, channel, ws_tx, ws_rx, heartbeat_interval).await;
    }

    state.hub.unsubscribe(&session.viewer_id);

    tracing::info!(
        viewer_id = %session.viewer_id,
        connected_ms = session.connected_at.elapsed().as_millis() as u64,
        live = state.hub.live_channels(),
        "viewer disconnected"
    );
}

/// Main viewer loop: read client messages, forward hub events, enforce heartbeat.
async fn run_session(
    session: &mut ViewerSession,
    mut channel: ChannelHandle,
    mut ws_tx: WsSink,
    mut ws_rx: WsStream,
    heartbeat_interval_ms: u64,
) {
    let heartbeat_deadline = heartbeat_deadline(heartbeat_interval_ms);
    let mut heartbeat_timer = time::interval(heartbeat_deadline);
    heartbeat_timer.tick().await; // First tick fires immediately; skip it.
    let mut got_heartbeat = true;

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let client_msg: ClientMessage = match serde_json::from_str(text.as_str()) {
                            Ok(m) => m,
                            Err(_) => {
                                let _ = send_close(&mut ws_tx, CLOSE_UNKNOWN_ERROR, "Invalid JSON").await;
                                break;
                            }
                        };

                        match client_msg.op {
                            OP_HEARTBEAT => {
                                got_heartbeat = true;
                                let payload: HeartbeatPayload =
                                    serde_json::from_value(client_msg.d).unwrap_or(HeartbeatPayload { seq: 0 });
                                if !send_message(&mut ws_tx, &GatewayMessage::heartbeat_ack(payload.seq)).await {
                                    break;
                                }
                            }
                            _ => {
                                let _ = send_close(&mut ws_tx, CLOSE_UNKNOWN_OPCODE, "Unknown opcode").await;
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(?e, viewer_id = %session.viewer_id, "ws read error");
                        break;
                    }
                    // Ping/Pong are answered by the socket; binary frames are ignored.
                    Some(Ok(_)) => continue,
                }
            }

            // Comment pushed by the hub.
            event = channel.recv() => {
                let Some(comment) = event else {
                    // The hub dropped this channel.
                    break;
                };
                let data = match serde_json::to_value(&*comment) {
                    Ok(v) => v,
                    Err(err) => {
                        tracing::error!(?err, sequence = comment.sequence, "failed to encode comment");
                        continue;
                    }
                };
                let msg = GatewayMessage::dispatch(EventName::NEW_COMMENT, session.next_seq(), data);
                if !send_message(&mut ws_tx, &msg).await {
                    tracing::debug!(
                        viewer_id = %session.viewer_id,
                        sequence = comment.sequence,
                        "viewer send failed"
                    );
                    break;
                }
            }

            _ = heartbeat_timer.tick() => {
                if !got_heartbeat {
                    tracing::debug!(
                        viewer_id = %session.viewer_id,
                        "heartbeat timeout, closing connection"
                    );
                    let _ = send_close(&mut ws_tx, CLOSE_SESSION_TIMEOUT, "Heartbeat timeout").await;
                    break;
                }
                got_heartbeat = false;
            }
        }
    }
}

/// A client must heartbeat within 1.5× the announced interval.
fn heartbeat_deadline(interval_ms: u64) -> Duration {
    let interval_ms = interval_ms.clamp(1, MAX_HEARTBEAT_INTERVAL_MS);
    Duration::from_millis(interval_ms.saturating_mul(3) / 2)
}

/// Serialize and send a gateway message. Returns `false` if the socket is gone.
async fn send_message(ws_tx: &mut WsSink, msg: &GatewayMessage) -> bool {
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(err) => {
            tracing::error!(?err, "failed to encode gateway message");
            return false;
        }
    };
    ws_tx.send(Message::Text(json.into())).await.is_ok()
}

/// Send a WebSocket close frame with a code and reason.
async fn send_close(ws_tx: &mut WsSink, code: u16, reason: &str) -> Result<(), axum::Error> {
    let close_msg = Message::Close(Some(axum::extract::ws::CloseFrame {
        code,
        reason: reason.to_string().into(),
    }));
    ws_tx.send(close_msg).await
}
