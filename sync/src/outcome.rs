/// What one completed anti-entropy round accomplished, for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub peer_node_id: String,
    pub encrypted: bool,
    pub peers_merged: usize,
    pub messages_received: usize,
    pub messages_sent: usize,
    pub anchor_envelopes_pushed: usize,
    pub anchor_envelopes_pulled: usize,
}
