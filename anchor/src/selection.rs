use felund_store::AnchorRecordEntry;
use sha2::{Digest, Sha256};

/// Minimum time an anchor stays selected before a higher-scoring candidate
/// can replace it.
pub const ANCHOR_COOLDOWN_SECS: u64 = 60;
/// An anchor candidate with no announcement in this many seconds is excluded.
pub const ANCHOR_STALENESS_SECS: u64 = 20;

/// A deterministic tiebreak in `[0, 1)` derived from the node id.
///
/// The candidate a node already has in hand settles ties the same way on
/// every node, which matters for hysteresis: without it, two nodes racing
/// an identical score could each pick a different "best" candidate and
/// never converge on one anchor.
fn tiebreak(node_id: &str) -> f64 {
    let digest = Sha256::digest(node_id.as_bytes());
    let word = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    word as f64 / u32::MAX as f64
}

/// Score one candidate, or `None` if it is stale or not willing to anchor.
fn score(record: &AnchorRecordEntry, node_id: &str, now: u64) -> Option<f64> {
    if !record.can_anchor {
        return None;
    }
    if now.saturating_sub(record.last_seen_ts) > ANCHOR_STALENESS_SECS {
        return None;
    }
    let mut s = 0.0;
    if record.public_reachable {
        s += 8.0;
    }
    if record.can_anchor {
        s += 4.0;
    }
    if !record.is_mobile {
        s += 2.0;
    }
    s += tiebreak(node_id);
    Some(s)
}

/// Rank anchor candidates best-first, excluding stale or non-anchoring nodes.
pub fn rank_candidates(records: &[(String, AnchorRecordEntry)], now: u64) -> Vec<String> {
    let mut scored: Vec<(f64, &str)> = records
        .iter()
        .filter_map(|(node_id, record)| score(record, node_id, now).map(|s| (s, node_id.as_str())))
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().map(|(_, id)| id.to_string()).collect()
}

/// Tracks the currently-selected anchor for one circle and applies cooldown
/// hysteresis (§4.7) so a node doesn't flap between near-tied candidates.
#[derive(Debug, Clone, Default)]
pub struct AnchorSelector {
    current: Option<String>,
    selected_at: u64,
}

impl AnchorSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Recompute the selected anchor given the latest candidate table.
    ///
    /// Keeps the current anchor if it is still a valid (non-stale,
    /// anchor-capable) candidate and the cooldown window hasn't elapsed;
    /// otherwise switches to the best-scoring candidate.
    pub fn select(&mut self, records: &[(String, AnchorRecordEntry)], now: u64) -> Option<&str> {
        let ranked = rank_candidates(records, now);
        let best = ranked.first().cloned();

        let keep_current = self
            .current
            .as_ref()
            .map(|cur| ranked.contains(cur) && now.saturating_sub(self.selected_at) < ANCHOR_COOLDOWN_SECS)
            .unwrap_or(false);

        if !keep_current {
            if self.current != best {
                tracing::debug!(old = ?self.current, new = ?best, "anchor selection changed");
                self.selected_at = now;
            }
            self.current = best;
        }
        self.current.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(can_anchor: bool, public_reachable: bool, is_mobile: bool, last_seen_ts: u64) -> AnchorRecordEntry {
        AnchorRecordEntry {
            can_anchor,
            public_reachable,
            is_mobile,
            announced_at: last_seen_ts,
            last_seen_ts,
        }
    }

    #[test]
    fn stale_candidates_are_excluded() {
        let records = vec![("a".to_string(), record(true, true, false, 0))];
        assert!(rank_candidates(&records, 1000).is_empty());
    }

    #[test]
    fn non_anchor_candidates_are_excluded() {
        let records = vec![("a".to_string(), record(false, true, false, 100))];
        assert!(rank_candidates(&records, 100).is_empty());
    }

    #[test]
    fn public_reachable_outranks_mobile_capable() {
        let records = vec![
            ("mobile".to_string(), record(true, false, true, 100)),
            ("public".to_string(), record(true, true, false, 100)),
        ];
        let ranked = rank_candidates(&records, 100);
        assert_eq!(ranked[0], "public");
    }

    #[test]
    fn hysteresis_keeps_current_anchor_within_cooldown() {
        let mut selector = AnchorSelector::new();
        let mut records = vec![
            ("alpha".to_string(), record(true, true, false, 0)),
            ("beta".to_string(), record(true, true, false, 0)),
        ];
        let first = selector.select(&records, 0).map(str::to_string);
        assert!(first.is_some());

        // Flip capabilities so the other candidate would now score higher,
        // but stay within the cooldown window.
        records.iter_mut().for_each(|(_, r)| r.is_mobile = r.can_anchor);
        let still = selector.select(&records, 10).map(str::to_string);
        assert_eq!(first, still);
    }

    #[test]
    fn switches_after_current_anchor_goes_stale() {
        let mut selector = AnchorSelector::new();
        let records = vec![("alpha".to_string(), record(true, true, false, 0))];
        selector.select(&records, 0);

        let records_after = vec![
            ("alpha".to_string(), record(true, true, false, 0)),
            ("beta".to_string(), record(true, true, false, 1000)),
        ];
        let selected = selector.select(&records_after, 1000);
        assert_eq!(selected, Some("beta"));
    }
}
