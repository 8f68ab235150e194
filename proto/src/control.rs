use serde::{Deserialize, Serialize};

/// The operations a `CHANNEL_EVT` control message can carry (§4.4).
///
/// `Unknown` catches any value not in this list so a future client posting
/// a newer op doesn't break parsing for this version; the op is dropped by
/// the applying side rather than propagated, per §4.4's validation rules.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOp {
    Create,
    Join,
    Leave,
    Request,
    Approve,
    Rename,
    #[serde(other)]
    Unknown,
}

/// A channel's access mode (§3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    Public,
    Key,
    Invite,
}

/// The body of a `CHANNEL_EVT` control message. Which fields are meaningful
/// depends on `op`; unused fields are `None` rather than enforced absent,
/// since the event travels as plain JSON and extra fields are harmless.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelEvt {
    pub op: ChannelOp,
    pub channel_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_mode: Option<AccessMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_node_id: Option<String>,
    /// The plaintext key supplied by a `join` request against a `key`-access channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// New display name, for `op: rename`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// The decoded `text` of a message on the `__control` channel (§4.4).
///
/// `Unknown` is the forward-compatible fallback for a `kind` this version
/// doesn't recognise; it is dropped, never re-gossiped with its meaning
/// reinterpreted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind")]
pub enum ControlEvent {
    #[serde(rename = "CHANNEL_EVT")]
    ChannelEvt(ChannelEvt),
    #[serde(rename = "CIRCLE_NAME_EVT")]
    CircleNameEvt { name: String },
    #[serde(rename = "ANCHOR_ANNOUNCE")]
    AnchorAnnounce {
        can_anchor: bool,
        public_reachable: bool,
        is_mobile: bool,
        announced_at: u64,
    },
    #[serde(other)]
    Unknown,
}

/// Parse a message's `text` field as a control event.
///
/// Malformed JSON is silently ignored (§4.4): the caller gets `None` and
/// simply drops the message rather than propagating a parse error.
pub fn parse_control_event(text: &str) -> Option<ControlEvent> {
    serde_json::from_str(text).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_create_round_trips() {
        let evt = ControlEvent::ChannelEvt(ChannelEvt {
            op: ChannelOp::Create,
            channel_id: "planning".into(),
            access_mode: Some(AccessMode::Invite),
            key_hash: None,
            target_node_id: None,
            key: None,
            display_name: None,
        });
        let json = serde_json::to_string(&evt).unwrap();
        assert_eq!(parse_control_event(&json), Some(evt));
    }

    #[test]
    fn unknown_kind_parses_as_unknown_not_error() {
        let evt = parse_control_event(r#"{"kind":"SOMETHING_NEW","x":1}"#);
        assert_eq!(evt, Some(ControlEvent::Unknown));
    }

    #[test]
    fn unknown_op_parses_as_unknown_op() {
        let evt = parse_control_event(r#"{"kind":"CHANNEL_EVT","op":"nuke","channel_id":"general"}"#);
        match evt {
            Some(ControlEvent::ChannelEvt(body)) => assert_eq!(body.op, ChannelOp::Unknown),
            other => panic!("unexpected parse result: {other:?}"),
        }
    }

    #[test]
    fn malformed_json_returns_none() {
        assert_eq!(parse_control_event("not json"), None);
    }

    #[test]
    fn anchor_announce_round_trips() {
        let evt = ControlEvent::AnchorAnnounce {
            can_anchor: true,
            public_reachable: true,
            is_mobile: false,
            announced_at: 1_700_000_000,
        };
        let json = serde_json::to_string(&evt).unwrap();
        assert_eq!(parse_control_event(&json), Some(evt));
    }
}
