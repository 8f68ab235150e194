use felund_proto::AnchorEnvelope;
use std::collections::HashMap;
use std::sync::Mutex;

/// Envelopes older than this are dropped regardless of count or size (§4.7).
pub const ANCHOR_MAX_AGE_SECS: u64 = 24 * 3600;
/// Per-circle envelope count cap; oldest dropped first once exceeded.
pub const ANCHOR_MAX_MSGS: usize = 500;
/// Per-circle serialized-byte cap; oldest dropped first once exceeded.
pub const ANCHOR_MAX_BYTES: usize = 50 * 1024 * 1024;

fn envelope_bytes(env: &AnchorEnvelope) -> usize {
    serde_json::to_vec(env).map(|v| v.len()).unwrap_or(0)
}

/// An envelope plus the local wall-clock time the anchor first stored it.
///
/// `AnchorEnvelope::created_ts` is whatever the original author's clock
/// claimed; comparing `ANCHOR_PULL.since` against that is vulnerable to a
/// sender's clock running behind the anchor's. `received_at` is this
/// anchor's own clock at insertion time and is what retention and `since`
/// filtering both key off instead.
struct StoredEnvelope {
    envelope: AnchorEnvelope,
    received_at: u64,
}

/// A node's blind store of other circles' encrypted envelopes, held only
/// when this node is acting as an anchor.
///
/// The store never looks inside `blob`: it holds ciphertext it cannot
/// decrypt and only needs timing metadata for retention bookkeeping.
#[derive(Default)]
pub struct EnvelopeStore {
    circles: Mutex<HashMap<String, HashMap<String, StoredEnvelope>>>,
}

impl EnvelopeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotently store an envelope, then apply the retention policy.
    ///
    /// A repeated push of the same `msg_id` keeps the original `received_at`:
    /// the first anchor to see a message owns its retention clock.
    pub fn push(&self, envelope: AnchorEnvelope) {
        let circle_id = envelope.circle_id.clone();
        let received_at = felund_common::now_unix();
        let mut guard = self.circles.lock().unwrap();
        let circle_store = guard.entry(circle_id.clone()).or_default();
        circle_store
            .entry(envelope.msg_id.clone())
            .or_insert(StoredEnvelope {
                envelope,
                received_at,
            });
        drop(guard);
        self.prune(&circle_id);
    }

    pub fn push_all(&self, envelopes: impl IntoIterator<Item = AnchorEnvelope>) {
        for env in envelopes {
            self.push(env);
        }
    }

    /// Envelopes received at or after `since` (anchor-local receipt time,
    /// not the envelope's claimed `created_ts`), oldest first.
    pub fn pull_since(&self, circle_id: &str, since: u64) -> Vec<AnchorEnvelope> {
        let guard = self.circles.lock().unwrap();
        let mut stored: Vec<&StoredEnvelope> = guard
            .get(circle_id)
            .into_iter()
            .flat_map(|t| t.values())
            .filter(|e| e.received_at >= since)
            .collect();
        stored.sort_by_key(|e| (e.received_at, e.envelope.msg_id.clone()));
        stored.into_iter().map(|e| e.envelope.clone()).collect()
    }

    pub fn len(&self, circle_id: &str) -> usize {
        self.circles
            .lock()
            .unwrap()
            .get(circle_id)
            .map(|t| t.len())
            .unwrap_or(0)
    }

    /// Apply the three-step retention policy (§4.7): age expiry, then
    /// count cap, then byte-size cap, oldest-received-first at every step.
    fn prune(&self, circle_id: &str) {
        let mut guard = self.circles.lock().unwrap();
        let Some(table) = guard.get_mut(circle_id) else {
            return;
        };
        let now = felund_common::now_unix();

        let before = table.len();
        table.retain(|_, e| now.saturating_sub(e.received_at) <= ANCHOR_MAX_AGE_SECS);
        if table.len() != before {
            tracing::debug!(circle_id, dropped = before - table.len(), "age-expired anchor envelopes");
        }

        if table.len() > ANCHOR_MAX_MSGS {
            let mut ids: Vec<(u64, String)> = table
                .values()
                .map(|e| (e.received_at, e.envelope.msg_id.clone()))
                .collect();
            ids.sort();
            let drop_count = ids.len() - ANCHOR_MAX_MSGS;
            for (_, id) in ids.into_iter().take(drop_count) {
                table.remove(&id);
            }
        }

        let mut total: usize = table.values().map(|e| envelope_bytes(&e.envelope)).sum();
        if total > ANCHOR_MAX_BYTES {
            let mut ids: Vec<(u64, String)> = table
                .values()
                .map(|e| (e.received_at, e.envelope.msg_id.clone()))
                .collect();
            ids.sort();
            for (_, id) in ids {
                if total <= ANCHOR_MAX_BYTES {
                    break;
                }
                if let Some(e) = table.remove(&id) {
                    total = total.saturating_sub(envelope_bytes(&e.envelope));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(circle_id: &str, msg_id: &str, created_ts: u64, blob: &str) -> AnchorEnvelope {
        AnchorEnvelope {
            circle_id: circle_id.to_string(),
            msg_id: msg_id.to_string(),
            created_ts,
            blob: blob.to_string(),
        }
    }

    #[test]
    fn push_is_idempotent_by_msg_id() {
        let store = EnvelopeStore::new();
        store.push(env("c1", "m1", 100, "aaa"));
        store.push(env("c1", "m1", 999, "bbb"));
        assert_eq!(store.len("c1"), 1);
        assert_eq!(store.pull_since("c1", 0)[0].created_ts, 100);
    }

    #[test]
    fn pull_since_keys_off_receipt_time_not_claimed_created_ts() {
        let store = EnvelopeStore::new();
        let now = felund_common::now_unix();
        // A sender clock running far behind still gets pulled by a
        // since-watermark based on when the anchor actually saw it.
        store.push(env("c1", "skewed", now.saturating_sub(10_000), "x"));
        let pulled = store.pull_since("c1", now.saturating_sub(1));
        assert_eq!(pulled.len(), 1);
        assert_eq!(pulled[0].msg_id, "skewed");
    }

    #[test]
    fn age_expiry_is_based_on_receipt_time() {
        let store = EnvelopeStore::new();
        // A message claiming to be ancient is still fresh if the anchor
        // only just received it.
        store.push(env("c1", "claims-old", 0, "x"));
        assert_eq!(store.len("c1"), 1);
    }

    #[test]
    fn count_cap_drops_oldest_received_first() {
        let store = EnvelopeStore::new();
        for i in 0..(ANCHOR_MAX_MSGS + 5) {
            store.push(env("c1", &format!("m{i}"), 0, "x"));
        }
        assert_eq!(store.len("c1"), ANCHOR_MAX_MSGS);
        let pulled = store.pull_since("c1", 0);
        assert!(!pulled.iter().any(|e| e.msg_id == "m0"));
    }
}
