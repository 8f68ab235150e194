use std::time::Duration;

/// Tunables for the gossip scheduler (§4.6). All defaults match the spec's
/// named intervals; nothing here is read from the environment, unlike the
/// two paths (`FELUND_STATE_DIR`, `FELUND_API_BASE`) that gate persistence
/// and rendezvous at the node level.
#[derive(Debug, Clone)]
pub struct GossipConfig {
    /// How often the dial loop runs one round against every known circle.
    pub gossip_interval: Duration,
    /// How many gossip rounds pass between anchor announcements.
    pub anchor_announce_rounds: u32,
    /// How often the rendezvous refresh loop runs, when enabled.
    pub rendezvous_interval: Duration,
    /// How many of the most recently seen peers to dial per circle per round.
    pub fanout: usize,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            gossip_interval: Duration::from_secs(5),
            anchor_announce_rounds: 12,
            rendezvous_interval: Duration::from_secs(60),
            fanout: 5,
        }
    }
}
