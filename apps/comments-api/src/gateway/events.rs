//! Gateway opcodes, event names, and wire-format messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Opcodes
// ---------------------------------------------------------------------------

pub const OP_DISPATCH: u8 = 0;
pub const OP_HEARTBEAT: u8 = 1;
pub const OP_HEARTBEAT_ACK: u8 = 6;

// ---------------------------------------------------------------------------
// Server → Client message
// ---------------------------------------------------------------------------

/// A message sent from the server to the viewer over WebSocket.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayMessage {
    pub op: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
    pub d: Value,
}

impl GatewayMessage {
    /// Build a DISPATCH message (op=0).
    pub fn dispatch(event_name: &str, seq: u64, data: Value) -> Self {
        Self {
            op: OP_DISPATCH,
            t: Some(event_name.to_string()),
            s: Some(seq),
            d: data,
        }
    }

    /// Build a HEARTBEAT_ACK message (op=6).
    pub fn heartbeat_ack(seq: u64) -> Self {
        Self {
            op: OP_HEARTBEAT_ACK,
            t: None,
            s: None,
            d: serde_json::json!({ "ack": seq }),
        }
    }
}

// ---------------------------------------------------------------------------
// Client → Server message
// ---------------------------------------------------------------------------

/// A message received from the viewer over WebSocket.
#[derive(Debug, Deserialize)]
pub struct ClientMessage {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
}

#[derive(Debug, Deserialize)]
pub struct HeartbeatPayload {
    #[serde(default)]
    pub seq: u64,
}

// ---------------------------------------------------------------------------
// Dispatch payloads
// ---------------------------------------------------------------------------

/// READY, sent once right after the upgrade.
#[derive(Debug, Serialize)]
pub struct ReadyPayload<'a> {
    pub viewer_id: &'a str,
    pub heartbeat_interval: u64,
}

/// Event names dispatched to viewers.
pub struct EventName;

impl EventName {
    pub const READY: &'static str = "READY";
    pub const NEW_COMMENT: &'static str = "newComment";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_serializes_with_name_and_seq() {
        let msg = GatewayMessage::dispatch(EventName::NEW_COMMENT, 3, serde_json::json!({"x": 1}));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, serde_json::json!({"op": 0, "t": "newComment", "s": 3, "d": {"x": 1}}));
    }

    #[test]
    fn heartbeat_ack_omits_name_and_seq() {
        let json = serde_json::to_value(GatewayMessage::heartbeat_ack(9)).unwrap();
        assert_eq!(json, serde_json::json!({"op": 6, "d": {"ack": 9}}));
    }

    #[test]
    fn client_message_defaults_missing_payload() {
        let msg: ClientMessage = serde_json::from_str(r#"{"op":1}"#).unwrap();
        assert_eq!(msg.op, OP_HEARTBEAT);
        assert!(msg.d.is_null());
        let hb: HeartbeatPayload = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(hb.seq, 0);
    }
}
