use crate::message::{AnchorEnvelope, ChatMessage, PeerRecord};
use serde::{Deserialize, Serialize};

/// Every frame that can cross the wire during a sync round (§4.5, §6).
///
/// Internally tagged on `"t"`. `Unknown` is the forward-compatible catch-all
/// serde falls back to for any tag value not listed below; the protocol
/// state machine treats it as a protocol violation and closes the
/// connection, it is never matched as a legitimate phase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t")]
pub enum Frame {
    #[serde(rename = "HELLO")]
    Hello {
        node_id: String,
        circle_id: String,
        listen_addr: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client_nonce: Option<String>,
        can_anchor: bool,
    },
    #[serde(rename = "CHALLENGE")]
    Challenge { server_nonce: String },
    #[serde(rename = "HELLO_AUTH")]
    HelloAuth { token: String },
    #[serde(rename = "WELCOME")]
    Welcome {
        node_id: String,
        enc_ready: bool,
        can_anchor: bool,
    },
    #[serde(rename = "ERROR")]
    Error { err: String },
    #[serde(rename = "PEERS")]
    Peers { peers: Vec<PeerRecord> },
    #[serde(rename = "MSGS_HAVE")]
    MsgsHave { msg_ids: Vec<String> },
    #[serde(rename = "MSGS_REQ")]
    MsgsReq { msg_ids: Vec<String> },
    #[serde(rename = "MSGS_SEND")]
    MsgsSend { messages: Vec<ChatMessage> },
    #[serde(rename = "ANCHOR_PUSH")]
    AnchorPush { envelopes: Vec<AnchorEnvelope> },
    #[serde(rename = "ANCHOR_PUSH_ACK")]
    AnchorPushAck {},
    #[serde(rename = "ANCHOR_PULL")]
    AnchorPull { since: u64 },
    #[serde(rename = "ANCHOR_MSGS")]
    AnchorMsgs {
        envelopes: Vec<AnchorEnvelope>,
        server_time: u64,
    },
    #[serde(other)]
    Unknown,
}

impl Frame {
    /// The `"t"` tag this frame serializes under, for logging.
    pub fn tag(&self) -> &'static str {
        match self {
            Frame::Hello { .. } => "HELLO",
            Frame::Challenge { .. } => "CHALLENGE",
            Frame::HelloAuth { .. } => "HELLO_AUTH",
            Frame::Welcome { .. } => "WELCOME",
            Frame::Error { .. } => "ERROR",
            Frame::Peers { .. } => "PEERS",
            Frame::MsgsHave { .. } => "MSGS_HAVE",
            Frame::MsgsReq { .. } => "MSGS_REQ",
            Frame::MsgsSend { .. } => "MSGS_SEND",
            Frame::AnchorPush { .. } => "ANCHOR_PUSH",
            Frame::AnchorPushAck {} => "ANCHOR_PUSH_ACK",
            Frame::AnchorPull { .. } => "ANCHOR_PULL",
            Frame::AnchorMsgs { .. } => "ANCHOR_MSGS",
            Frame::Unknown => "UNKNOWN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_round_trips_with_tag() {
        let frame = Frame::Hello {
            node_id: "n1".into(),
            circle_id: "c1".into(),
            listen_addr: "127.0.0.1:9000".into(),
            client_nonce: Some("abc".into()),
            can_anchor: true,
        };
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("\"t\":\"HELLO\""));
        let back: Frame = serde_json::from_str(&json).unwrap();
        assert_eq!(back, frame);
    }

    #[test]
    fn unrecognized_tag_becomes_unknown() {
        let frame: Frame = serde_json::from_str(r#"{"t":"NOT_A_REAL_FRAME"}"#).unwrap();
        assert_eq!(frame, Frame::Unknown);
        assert_eq!(frame.tag(), "UNKNOWN");
    }

    #[test]
    fn anchor_push_ack_has_no_fields() {
        let frame = Frame::AnchorPushAck {};
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(json, r#"{"t":"ANCHOR_PUSH_ACK"}"#);
    }
}
