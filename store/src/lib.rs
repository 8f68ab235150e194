//! The shared, mutex-guarded state store for a Felund node: circles,
//! per-circle peers, messages, channels, and anchor candidacy records, plus
//! the logic that applies control-channel events to them.
//!
//! This crate never touches the network; it is driven by the sync and
//! gossip layers and read back by the persistence collaborator.

mod error;
mod state;
mod types;

pub use error::StoreError;
pub use state::{
    sha256_hex, InsertOutcome, NodeState, SharedState, MAX_MESSAGES_PER_CIRCLE,
    MESSAGE_MAX_AGE_SECS,
};
pub use types::{
    is_valid_channel_id, AccessMode, AnchorRecordEntry, Channel, Circle, NodeConfig, PeerEntry,
};
