use crate::error::StoreError;
use crate::types::{
    is_valid_channel_id, AccessMode, AnchorRecordEntry, Channel, Circle, NodeConfig, PeerEntry,
};
use felund_common::{now_unix, CircleId, MessageId};
use felund_crypto::{make_message_mac, make_token, verify_message_mac, MacFields};
use felund_proto::{
    parse_control_event, ChannelEvt, ChannelOp, ChatMessage, ControlEvent, PeerRecord,
    CONTROL_CHANNEL,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Messages older than this are pruned on every insert and at load/save (§3 Lifecycle).
pub const MESSAGE_MAX_AGE_SECS: u64 = 30 * 24 * 3600;
/// Per-circle message cap; oldest dropped first once exceeded (§3 Lifecycle).
pub const MAX_MESSAGES_PER_CIRCLE: usize = 1000;

/// What happened to a message offered to [`SharedState::insert_message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
    Rejected,
}

/// The full in-memory state of one node, as described in §3.
///
/// Every table is keyed by the plain wire string (`circle_id`, `node_id`,
/// `msg_id`) rather than the typed `HexId` wrappers: the data arrives off
/// the network as strings and round-trips through JSON persistence the same
/// way, so re-validating on every lookup would buy nothing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeState {
    pub node: NodeConfig,
    pub circles: HashMap<String, Circle>,
    pub peers: HashMap<String, HashMap<String, PeerEntry>>,
    pub messages: HashMap<String, HashMap<String, ChatMessage>>,
    pub channels: HashMap<String, HashMap<String, Channel>>,
    pub anchor_records: HashMap<String, HashMap<String, AnchorRecordEntry>>,
    #[serde(default)]
    pub display_names: HashMap<String, String>,
}

impl NodeState {
    pub fn new(node: NodeConfig) -> Self {
        let node_id = node.node_id.to_string();
        let display_name = node.display_name.clone();
        let mut display_names = HashMap::new();
        display_names.insert(node_id, display_name);
        Self {
            node,
            circles: HashMap::new(),
            peers: HashMap::new(),
            messages: HashMap::new(),
            channels: HashMap::new(),
            anchor_records: HashMap::new(),
            display_names,
        }
    }

    fn ensure_general(&mut self, circle_id: &str) {
        let channels = self.channels.entry(circle_id.to_string()).or_default();
        if !channels.contains_key("general") {
            channels.insert(
                "general".to_string(),
                Channel {
                    channel_id: "general".to_string(),
                    created_by: self.node.node_id.to_string(),
                    created_ts: now_unix(),
                    access_mode: AccessMode::Public,
                    key_hash: String::new(),
                    members: Default::default(),
                    pending: Default::default(),
                },
            );
        }
    }

    /// Drop expired and over-count messages for `circle_id` (§3 Lifecycle).
    fn prune_circle_messages(&mut self, circle_id: &str) {
        let Some(table) = self.messages.get_mut(circle_id) else {
            return;
        };
        let now = now_unix();
        table.retain(|_, m| now.saturating_sub(m.created_ts) <= MESSAGE_MAX_AGE_SECS);
        if table.len() > MAX_MESSAGES_PER_CIRCLE {
            let mut ids: Vec<(u64, String)> = table
                .values()
                .map(|m| (m.created_ts, m.msg_id.clone()))
                .collect();
            ids.sort();
            let drop_count = ids.len() - MAX_MESSAGES_PER_CIRCLE;
            for (_, id) in ids.into_iter().take(drop_count) {
                table.remove(&id);
            }
        }
    }

    fn apply_channel_evt(&mut self, circle_id: &str, author: &str, evt: &ChannelEvt) {
        self.ensure_general(circle_id);
        let channel_id = evt.channel_id.to_lowercase();

        if evt.op == ChannelOp::Create {
            if !is_valid_channel_id(&channel_id) {
                return;
            }
            let access_mode: AccessMode = evt.access_mode.map(Into::into).unwrap_or(AccessMode::Public);
            let key_hash = if access_mode == AccessMode::Key {
                evt.key_hash.clone().unwrap_or_default()
            } else {
                String::new()
            };
            let channels = self.channels.entry(circle_id.to_string()).or_default();
            let channel = channels.entry(channel_id.clone()).or_insert_with(|| Channel {
                channel_id: channel_id.clone(),
                created_by: author.to_string(),
                created_ts: now_unix(),
                access_mode,
                key_hash,
                members: Default::default(),
                pending: Default::default(),
            });
            channel.members.insert(author.to_string());
            return;
        }

        if evt.op == ChannelOp::Rename {
            if let Some(name) = &evt.display_name {
                self.display_names
                    .insert(author.to_string(), name.chars().take(40).collect());
            }
            return;
        }

        if !is_valid_channel_id(&channel_id) {
            return;
        }
        let channels = self.channels.entry(circle_id.to_string()).or_default();
        let channel = match channels.get_mut(&channel_id) {
            Some(c) => c,
            None => return,
        };

        match evt.op {
            ChannelOp::Join => {
                let authorized = match channel.access_mode {
                    AccessMode::Public => true,
                    AccessMode::Key => evt
                        .key
                        .as_ref()
                        .map(|k| sha256_hex(k.as_bytes()) == channel.key_hash)
                        .unwrap_or(false),
                    AccessMode::Invite => false,
                };
                if authorized {
                    channel.members.insert(author.to_string());
                    channel.pending.remove(author);
                }
            }
            ChannelOp::Leave => {
                if channel_id != "general" {
                    channel.members.remove(author);
                    channel.pending.remove(author);
                }
            }
            ChannelOp::Request => {
                channel.pending.insert(author.to_string());
            }
            ChannelOp::Approve => {
                if author == channel.created_by {
                    if let Some(target) = &evt.target_node_id {
                        channel.pending.remove(target);
                        channel.members.insert(target.clone());
                    }
                }
            }
            ChannelOp::Create | ChannelOp::Rename | ChannelOp::Unknown => {}
        }
    }

    fn apply_circle_name_evt(&mut self, circle_id: &str, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        if let Some(circle) = self.circles.get_mut(circle_id) {
            if circle.name.is_empty() {
                circle.name = name.to_string();
            }
        }
    }

    fn apply_anchor_announce(
        &mut self,
        circle_id: &str,
        author: &str,
        can_anchor: bool,
        public_reachable: bool,
        is_mobile: bool,
        announced_at: u64,
    ) {
        let table = self.anchor_records.entry(circle_id.to_string()).or_default();
        let now = now_unix();
        match table.get_mut(author) {
            Some(existing) => {
                existing.last_seen_ts = now;
                if announced_at > existing.announced_at {
                    existing.can_anchor = can_anchor;
                    existing.public_reachable = public_reachable;
                    existing.is_mobile = is_mobile;
                    existing.announced_at = announced_at;
                }
            }
            None => {
                table.insert(
                    author.to_string(),
                    AnchorRecordEntry {
                        can_anchor,
                        public_reachable,
                        is_mobile,
                        announced_at,
                        last_seen_ts: now,
                    },
                );
            }
        }
    }

    fn apply_control_text(&mut self, circle_id: &str, author: &str, text: &str) {
        match parse_control_event(text) {
            Some(ControlEvent::ChannelEvt(evt)) => self.apply_channel_evt(circle_id, author, &evt),
            Some(ControlEvent::CircleNameEvt { name }) => self.apply_circle_name_evt(circle_id, &name),
            Some(ControlEvent::AnchorAnnounce {
                can_anchor,
                public_reachable,
                is_mobile,
                announced_at,
            }) => self.apply_anchor_announce(
                circle_id,
                author,
                can_anchor,
                public_reachable,
                is_mobile,
                announced_at,
            ),
            Some(ControlEvent::Unknown) | None => {}
        }
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// A thread-safe handle to a node's state, owning the single mutex described
/// in §4.3/§5. No method here ever hands a caller a raw `&NodeState`.
#[derive(Debug, Clone)]
pub struct SharedState {
    inner: Arc<Mutex<NodeState>>,
}

impl SharedState {
    pub fn new(node: NodeConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(NodeState::new(node))),
        }
    }

    pub fn from_state(state: NodeState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Clone the whole state out from under the lock, for the persistence collaborator.
    pub fn snapshot(&self) -> NodeState {
        self.inner.lock().unwrap().clone()
    }

    pub fn node_id(&self) -> String {
        self.inner.lock().unwrap().node.node_id.to_string()
    }

    pub fn node_config(&self) -> NodeConfig {
        self.inner.lock().unwrap().node.clone()
    }

    pub fn create_circle(&self, secret_hex: &str, name: Option<String>) -> CircleId {
        let circle_id = CircleId::from_secret_hex(secret_hex);
        let mut guard = self.inner.lock().unwrap();
        guard.circles.insert(
            circle_id.to_string(),
            Circle {
                circle_id: circle_id.clone(),
                secret_hex: secret_hex.to_string(),
                name: name.unwrap_or_default(),
            },
        );
        guard.ensure_general(&circle_id.to_string());
        circle_id
    }

    pub fn has_circle(&self, circle_id: &str) -> bool {
        self.inner.lock().unwrap().circles.contains_key(circle_id)
    }

    pub fn circle_secret(&self, circle_id: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .circles
            .get(circle_id)
            .map(|c| c.secret_hex.clone())
    }

    /// Merge CLI/env overrides onto the node's own configuration. Anything
    /// left `None` keeps whatever was already loaded or freshly defaulted.
    pub fn configure_node(
        &self,
        bind: Option<String>,
        port: Option<u16>,
        display_name: Option<String>,
        can_anchor: Option<bool>,
        public_reachable: Option<bool>,
        rendezvous_base: Option<String>,
    ) {
        let mut guard = self.inner.lock().unwrap();
        if let Some(bind) = bind {
            guard.node.bind = bind;
        }
        if let Some(port) = port {
            guard.node.port = port;
        }
        if let Some(name) = display_name {
            let node_id = guard.node.node_id.to_string();
            guard.node.display_name = name.clone();
            guard.display_names.insert(node_id, name);
        }
        if let Some(flag) = can_anchor {
            guard.node.can_anchor = flag;
        }
        if let Some(flag) = public_reachable {
            guard.node.public_reachable = flag;
        }
        if let Some(base) = rendezvous_base {
            guard.node.rendezvous_base = base;
        }
    }

    /// Prune every circle's message table, dropping expired and
    /// over-quota entries (§3 Lifecycle). Persistence calls this on both
    /// load and save, mirroring insert-time pruning for state that was
    /// never inserted into this process.
    pub fn prune_all_circles(&self) {
        let mut guard = self.inner.lock().unwrap();
        let circle_ids: Vec<String> = guard.circles.keys().cloned().collect();
        for circle_id in circle_ids {
            guard.prune_circle_messages(&circle_id);
        }
    }

    pub fn list_circle_ids(&self) -> Vec<String> {
        self.inner.lock().unwrap().circles.keys().cloned().collect()
    }

    /// Compute a fresh handshake token for a client connecting to `circle_id`.
    pub fn make_handshake_token(
        &self,
        circle_id: &str,
        node_id: &str,
        server_nonce: &str,
    ) -> Result<String, StoreError> {
        let secret = self
            .circle_secret(circle_id)
            .ok_or_else(|| StoreError::UnknownCircle(circle_id.to_string()))?;
        make_token(&secret, node_id, circle_id, server_nonce).map_err(|_| StoreError::CryptoFailure)
    }

    /// Merge a gossiped or rendezvous-discovered peer record.
    ///
    /// Returns `true` when the record was applied: `last_seen` is
    /// monotonically non-decreasing and ties favour the existing record
    /// (§4.5).
    pub fn merge_peer(&self, circle_id: &str, record: &PeerRecord) -> bool {
        let mut guard = self.inner.lock().unwrap();
        let table = guard.peers.entry(circle_id.to_string()).or_default();
        match table.get(&record.node_id) {
            Some(existing) if existing.last_seen >= record.last_seen => false,
            _ => {
                table.insert(
                    record.node_id.clone(),
                    PeerEntry {
                        addr: record.addr.clone(),
                        last_seen: record.last_seen,
                    },
                );
                true
            }
        }
    }

    pub fn top_peers(&self, circle_id: &str, limit: usize) -> Vec<PeerRecord> {
        let guard = self.inner.lock().unwrap();
        let Some(table) = guard.peers.get(circle_id) else {
            return Vec::new();
        };
        let mut peers: Vec<PeerRecord> = table
            .iter()
            .map(|(node_id, entry)| PeerRecord {
                node_id: node_id.clone(),
                addr: entry.addr.clone(),
                last_seen: entry.last_seen,
            })
            .collect();
        peers.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        peers.truncate(limit);
        peers
    }

    pub fn known_msg_ids(&self, circle_id: &str) -> Vec<String> {
        let guard = self.inner.lock().unwrap();
        guard
            .messages
            .get(circle_id)
            .map(|table| table.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// `offered \ known`, preserving offered order.
    pub fn missing_ids(&self, circle_id: &str, offered: &[String]) -> Vec<String> {
        let guard = self.inner.lock().unwrap();
        let known = guard.messages.get(circle_id);
        offered
            .iter()
            .filter(|id| !known.map(|t| t.contains_key(*id)).unwrap_or(false))
            .cloned()
            .collect()
    }

    pub fn get_messages(&self, circle_id: &str, ids: &[String]) -> Vec<ChatMessage> {
        let guard = self.inner.lock().unwrap();
        let Some(table) = guard.messages.get(circle_id) else {
            return Vec::new();
        };
        ids.iter().filter_map(|id| table.get(id).cloned()).collect()
    }

    pub fn messages_for_channel(&self, circle_id: &str, channel_id: &str) -> Vec<ChatMessage> {
        let guard = self.inner.lock().unwrap();
        let mut msgs: Vec<ChatMessage> = guard
            .messages
            .get(circle_id)
            .into_iter()
            .flat_map(|t| t.values())
            .filter(|m| m.channel_id == channel_id)
            .cloned()
            .collect();
        msgs.sort_by_key(|m| (m.created_ts, m.msg_id.clone()));
        msgs
    }

    /// Every message currently held for a circle, newest last.
    pub fn all_messages(&self, circle_id: &str) -> Vec<ChatMessage> {
        let guard = self.inner.lock().unwrap();
        let mut msgs: Vec<ChatMessage> = guard
            .messages
            .get(circle_id)
            .into_iter()
            .flat_map(|t| t.values())
            .cloned()
            .collect();
        msgs.sort_by_key(|m| (m.created_ts, m.msg_id.clone()));
        msgs
    }

    /// Validate, merge, and (if accepted) dispatch control-event side effects
    /// for a message received from a peer or read back from persistence.
    ///
    /// A message is accepted when either its MAC verifies over its plaintext
    /// fields, or (when it carries an `enc` envelope) the envelope decrypts
    /// under the circle secret — §3's admission invariant.
    pub fn insert_message(&self, circle_id: &str, mut msg: ChatMessage) -> InsertOutcome {
        let mut guard = self.inner.lock().unwrap();
        let Some(circle) = guard.circles.get(circle_id) else {
            return InsertOutcome::Rejected;
        };
        let secret_hex = circle.secret_hex.clone();

        if guard
            .messages
            .get(circle_id)
            .map(|t| t.contains_key(&msg.msg_id))
            .unwrap_or(false)
        {
            return InsertOutcome::Duplicate;
        }

        let mac_fields = MacFields {
            msg_id: &msg.msg_id,
            circle_id: &msg.circle_id,
            channel_id: &msg.channel_id,
            author_node_id: &msg.author_node_id,
            display_name: &msg.display_name,
            created_ts: msg.created_ts,
            text: &msg.text,
        };
        let mut authorized = verify_message_mac(&secret_hex, mac_fields, &msg.mac);

        if !authorized {
            if let Some(env) = msg.enc.clone() {
                let aad = felund_crypto::MessageFields {
                    msg_id: &msg.msg_id,
                    circle_id: &msg.circle_id,
                    channel_id: &msg.channel_id,
                    author_node_id: &msg.author_node_id,
                    created_ts: msg.created_ts,
                };
                if let Ok((name, text)) =
                    felund_crypto::decrypt_message_fields(&secret_hex, aad, &env)
                {
                    msg.display_name = name;
                    msg.text = text;
                    authorized = true;
                }
            }
        }

        if !authorized {
            return InsertOutcome::Rejected;
        }

        guard
            .messages
            .entry(circle_id.to_string())
            .or_default()
            .insert(msg.msg_id.clone(), msg.clone());
        guard.prune_circle_messages(circle_id);

        guard
            .display_names
            .insert(msg.author_node_id.clone(), msg.display_name.clone());

        if msg.channel_id == CONTROL_CHANNEL {
            guard.apply_control_text(circle_id, &msg.author_node_id, &msg.text);
        }

        InsertOutcome::Inserted
    }

    fn sign_message(
        &self,
        circle_id: &str,
        channel_id: &str,
        text: String,
        enc: bool,
    ) -> Result<ChatMessage, StoreError> {
        let guard = self.inner.lock().unwrap();
        let node_id_typed = guard.node.node_id.clone();
        let node_id = node_id_typed.to_string();
        let display_name = guard.node.display_name.clone();
        let circle = guard
            .circles
            .get(circle_id)
            .ok_or_else(|| StoreError::UnknownCircle(circle_id.to_string()))?
            .clone();

        let created_ts = now_unix();
        let msg_id = MessageId::new(&node_id_typed, created_ts).to_string();

        let enc_envelope = if enc {
            let aad = felund_crypto::MessageFields {
                msg_id: &msg_id,
                circle_id,
                channel_id,
                author_node_id: &node_id,
                created_ts,
            };
            Some(
                felund_crypto::encrypt_message_fields(
                    &circle.secret_hex,
                    aad,
                    &display_name,
                    &text,
                )
                .map_err(|_| StoreError::CryptoFailure)?,
            )
        } else {
            None
        };

        let mac_fields = MacFields {
            msg_id: &msg_id,
            circle_id,
            channel_id,
            author_node_id: &node_id,
            display_name: &display_name,
            created_ts,
            text: &text,
        };
        let mac = make_message_mac(&circle.secret_hex, mac_fields).map_err(|_| StoreError::CryptoFailure)?;

        let msg = ChatMessage {
            msg_id,
            circle_id: circle_id.to_string(),
            channel_id: channel_id.to_string(),
            author_node_id: node_id,
            display_name,
            created_ts,
            text,
            mac,
            enc: enc_envelope,
        };
        drop(guard);
        Ok(msg)
    }

    pub fn send_message(
        &self,
        circle_id: &str,
        channel_id: &str,
        text: &str,
        encrypt: bool,
    ) -> Result<ChatMessage, StoreError> {
        let msg = self.sign_message(circle_id, channel_id, text.to_string(), encrypt)?;
        match self.insert_message(circle_id, msg.clone()) {
            InsertOutcome::Inserted | InsertOutcome::Duplicate => Ok(msg),
            InsertOutcome::Rejected => Err(StoreError::BadMac),
        }
    }

    fn post_control_event(&self, circle_id: &str, event: &ControlEvent) -> Result<ChatMessage, StoreError> {
        let text = serde_json::to_string(event).map_err(|_| StoreError::CryptoFailure)?;
        self.send_message(circle_id, CONTROL_CHANNEL, &text, false)
    }

    pub fn create_channel(
        &self,
        circle_id: &str,
        channel_id: &str,
        access_mode: felund_proto::AccessMode,
        key_hash: Option<String>,
    ) -> Result<ChatMessage, StoreError> {
        if !is_valid_channel_id(channel_id) {
            return Err(StoreError::InvalidChannelId(channel_id.to_string()));
        }
        let evt = ControlEvent::ChannelEvt(ChannelEvt {
            op: ChannelOp::Create,
            channel_id: channel_id.to_string(),
            access_mode: Some(access_mode),
            key_hash,
            target_node_id: None,
            key: None,
            display_name: None,
        });
        self.post_control_event(circle_id, &evt)
    }

    /// Join a `public`/`key` channel directly, or post a pending request for `invite` channels.
    pub fn join_channel(
        &self,
        circle_id: &str,
        channel_id: &str,
        key: Option<String>,
    ) -> Result<ChatMessage, StoreError> {
        let access_mode = {
            let guard = self.inner.lock().unwrap();
            guard
                .channels
                .get(circle_id)
                .and_then(|t| t.get(channel_id))
                .map(|c| c.access_mode)
        };
        let op = match access_mode {
            Some(AccessMode::Invite) | None => ChannelOp::Request,
            Some(AccessMode::Public) | Some(AccessMode::Key) => ChannelOp::Join,
        };
        let evt = ControlEvent::ChannelEvt(ChannelEvt {
            op,
            channel_id: channel_id.to_string(),
            access_mode: None,
            key_hash: None,
            target_node_id: None,
            key,
            display_name: None,
        });
        self.post_control_event(circle_id, &evt)
    }

    pub fn approve_join(
        &self,
        circle_id: &str,
        channel_id: &str,
        target_node_id: &str,
    ) -> Result<ChatMessage, StoreError> {
        let evt = ControlEvent::ChannelEvt(ChannelEvt {
            op: ChannelOp::Approve,
            channel_id: channel_id.to_string(),
            access_mode: None,
            key_hash: None,
            target_node_id: Some(target_node_id.to_string()),
            key: None,
            display_name: None,
        });
        self.post_control_event(circle_id, &evt)
    }

    pub fn leave_channel(&self, circle_id: &str, channel_id: &str) -> Result<ChatMessage, StoreError> {
        if channel_id == "general" {
            return Err(StoreError::CannotLeaveGeneral);
        }
        let evt = ControlEvent::ChannelEvt(ChannelEvt {
            op: ChannelOp::Leave,
            channel_id: channel_id.to_string(),
            access_mode: None,
            key_hash: None,
            target_node_id: None,
            key: None,
            display_name: None,
        });
        self.post_control_event(circle_id, &evt)
    }

    pub fn rename_node(&self, circle_id: &str, new_name: &str) -> Result<ChatMessage, StoreError> {
        {
            let mut guard = self.inner.lock().unwrap();
            guard.node.display_name = new_name.to_string();
            let node_id = guard.node.node_id.to_string();
            guard.display_names.insert(node_id, new_name.to_string());
        }
        let evt = ControlEvent::ChannelEvt(ChannelEvt {
            op: ChannelOp::Rename,
            channel_id: "general".to_string(),
            access_mode: None,
            key_hash: None,
            target_node_id: None,
            key: None,
            display_name: Some(new_name.to_string()),
        });
        self.post_control_event(circle_id, &evt)
    }

    pub fn set_circle_name(&self, circle_id: &str, name: &str) -> Result<ChatMessage, StoreError> {
        {
            let mut guard = self.inner.lock().unwrap();
            if let Some(circle) = guard.circles.get_mut(circle_id) {
                circle.name = name.to_string();
            }
        }
        self.post_control_event(circle_id, &ControlEvent::CircleNameEvt { name: name.to_string() })
    }

    pub fn announce_anchor(&self, circle_id: &str) -> Result<ChatMessage, StoreError> {
        let (can_anchor, public_reachable, is_mobile) = {
            let guard = self.inner.lock().unwrap();
            (
                guard.node.can_anchor,
                guard.node.public_reachable,
                guard.node.is_mobile,
            )
        };
        let evt = ControlEvent::AnchorAnnounce {
            can_anchor,
            public_reachable,
            is_mobile,
            announced_at: now_unix(),
        };
        self.post_control_event(circle_id, &evt)
    }

    pub fn anchor_candidates(&self, circle_id: &str) -> Vec<(String, AnchorRecordEntry)> {
        self.inner
            .lock()
            .unwrap()
            .anchor_records
            .get(circle_id)
            .map(|t| t.iter().map(|(k, v)| (k.clone(), *v)).collect())
            .unwrap_or_default()
    }

    pub fn peer_addr(&self, circle_id: &str, node_id: &str) -> Option<String> {
        self.inner
            .lock()
            .unwrap()
            .peers
            .get(circle_id)
            .and_then(|t| t.get(node_id))
            .map(|e| e.addr.clone())
    }

    pub fn network_display_name(&self, node_id: &str) -> Option<String> {
        self.inner.lock().unwrap().display_names.get(node_id).cloned()
    }
}
