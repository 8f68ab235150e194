use displaydoc::Display;
use thiserror::Error;

/// Aggregates the per-crate error enums at the one boundary that talks to
/// an operator instead of to the wire or the store (§7).
#[derive(Debug, Display, Error)]
pub enum NodeError {
    /// persistence failure: {0}
    Persist(#[from] felund_persist::PersistError),
    /// gossip scheduler failure: {0}
    Gossip(#[from] felund_gossip::GossipError),
    /// store failure: {0}
    Store(#[from] felund_store::StoreError),
    /// invite code failure: {0}
    Invite(#[from] felund_invite::InviteError),
    /// unknown circle {0}
    UnknownCircle(String),
}
