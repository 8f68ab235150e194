//! Anchor candidate ranking, cooldown-hysteresis selection, and the blind
//! envelope store a node keeps while acting as an anchor for a circle.
//!
//! This crate never reads circle secrets or message plaintext: candidate
//! scoring only looks at capability flags, and the envelope store only
//! looks at timing metadata for retention.

mod retention;
mod selection;

pub use retention::{EnvelopeStore, ANCHOR_MAX_AGE_SECS, ANCHOR_MAX_BYTES, ANCHOR_MAX_MSGS};
pub use selection::{rank_candidates, AnchorSelector, ANCHOR_COOLDOWN_SECS, ANCHOR_STALENESS_SECS};
