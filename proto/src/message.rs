use felund_crypto::EncEnvelope;
use serde::{Deserialize, Serialize};

/// The reserved channel that carries control-channel events (§4.4).
pub const CONTROL_CHANNEL: &str = "__control";

/// A content-addressed, immutable chat message.
///
/// `enc` is present only when the sender negotiated session encryption for
/// the connection it first arrived over; `display_name`/`text` are then the
/// values *before* encryption and callers MUST treat them as untrusted
/// placeholders, not the authoritative content, when `enc` is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub msg_id: String,
    pub circle_id: String,
    pub channel_id: String,
    pub author_node_id: String,
    pub display_name: String,
    pub created_ts: u64,
    pub text: String,
    pub mac: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enc: Option<EncEnvelope>,
}

impl ChatMessage {
    pub fn is_control(&self) -> bool {
        self.channel_id == CONTROL_CHANNEL
    }
}

/// A remote peer's last-known endpoint, as exchanged in `PEERS` frames.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeerRecord {
    pub node_id: String,
    pub addr: String,
    pub last_seen: u64,
}

/// A blind ciphertext envelope as exchanged with an anchor.
///
/// `blob` is the serialized [`ChatMessage`] as the anchor received it; the
/// anchor never parses it beyond what it needs for retention bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnchorEnvelope {
    pub circle_id: String,
    pub msg_id: String,
    pub created_ts: u64,
    pub blob: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_channel_is_detected() {
        let msg = ChatMessage {
            msg_id: "m".into(),
            circle_id: "c".into(),
            channel_id: CONTROL_CHANNEL.into(),
            author_node_id: "a".into(),
            display_name: "alice".into(),
            created_ts: 1,
            text: "{}".into(),
            mac: "mac".into(),
            enc: None,
        };
        assert!(msg.is_control());
    }

    #[test]
    fn message_round_trips_through_json() {
        let msg = ChatMessage {
            msg_id: "m".into(),
            circle_id: "c".into(),
            channel_id: "general".into(),
            author_node_id: "a".into(),
            display_name: "alice".into(),
            created_ts: 1,
            text: "hello".into(),
            mac: "mac".into(),
            enc: None,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("\"enc\""));
        let back: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
