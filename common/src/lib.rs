//! Shared identifiers, time helpers, and wire-address parsing used across
//! every Felund crate.
//!
//! Nothing in this crate talks to the network or touches the circle secret;
//! it is the bottom of the dependency graph described in the system overview.

mod addr;
mod ids;
mod time;

pub use addr::{canonical_peer_addr, detect_local_ip, parse_host_port, public_addr_hint, AddrError};
pub use ids::{CircleId, HexId, MessageId, NodeId};
pub use time::now_unix;
