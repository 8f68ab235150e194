use felund_common::{CircleId, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Local node identity and the two environment-sourced paths it carries (§3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub node_id: NodeId,
    pub bind: String,
    pub port: u16,
    pub display_name: String,
    pub can_anchor: bool,
    pub public_reachable: bool,
    pub is_mobile: bool,
    #[serde(default)]
    pub rendezvous_base: String,
}

impl NodeConfig {
    pub fn new(bind: impl Into<String>, port: u16) -> Self {
        Self {
            node_id: NodeId::random(),
            bind: bind.into(),
            port,
            display_name: "anon".to_string(),
            can_anchor: false,
            public_reachable: false,
            is_mobile: false,
            rendezvous_base: String::new(),
        }
    }
}

/// A circle this node belongs to (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Circle {
    pub circle_id: CircleId,
    pub secret_hex: String,
    #[serde(default)]
    pub name: String,
}

/// A known peer's last-advertised endpoint (§3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PeerEntry {
    pub addr: String,
    pub last_seen: u64,
}

/// A named sub-topic within a circle (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    pub channel_id: String,
    pub created_by: String,
    pub created_ts: u64,
    pub access_mode: AccessMode,
    #[serde(default)]
    pub key_hash: String,
    #[serde(default)]
    pub members: HashSet<String>,
    #[serde(default)]
    pub pending: HashSet<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    Public,
    Key,
    Invite,
}

impl From<felund_proto::AccessMode> for AccessMode {
    fn from(mode: felund_proto::AccessMode) -> Self {
        match mode {
            felund_proto::AccessMode::Public => AccessMode::Public,
            felund_proto::AccessMode::Key => AccessMode::Key,
            felund_proto::AccessMode::Invite => AccessMode::Invite,
        }
    }
}

/// The last announcement this node has seen from a candidate anchor (§3, §4.7).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnchorRecordEntry {
    pub can_anchor: bool,
    pub public_reachable: bool,
    pub is_mobile: bool,
    pub announced_at: u64,
    pub last_seen_ts: u64,
}

pub(crate) type CirclePeerTable = HashMap<String, PeerEntry>;
pub(crate) type CircleChannelTable = HashMap<String, Channel>;
pub(crate) type CircleAnchorTable = HashMap<String, AnchorRecordEntry>;

pub fn is_valid_channel_id(channel_id: &str) -> bool {
    if channel_id.is_empty() || channel_id.len() > 32 {
        return false;
    }
    if channel_id.starts_with("__") {
        return false;
    }
    channel_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
