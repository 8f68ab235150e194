//! HTTP client for the optional stateless rendezvous server (§6, §9).
//!
//! The server only ever sees `circle_hint = sha256_hex(circle_id)[:16]`,
//! never the circle id or secret itself.

use displaydoc::Display;
use felund_common::now_unix;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);
const DEFAULT_TTL_SECS: u64 = 120;

#[derive(Debug, Display, Error)]
pub enum RendezvousError {
    /// request to {url} failed: {source}
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Serialize)]
struct Endpoint {
    transport: &'static str,
    host: String,
    port: u16,
    family: &'static str,
    nat: &'static str,
}

#[derive(Debug, Serialize)]
struct Capabilities {
    relay: bool,
    transport: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct RegisterRequest {
    node_id: String,
    circle_hint: String,
    endpoints: Vec<Endpoint>,
    capabilities: Capabilities,
    ttl_s: u64,
}

#[derive(Debug, Serialize)]
struct UnregisterRequest {
    node_id: String,
    circle_hint: String,
}

#[derive(Debug, Deserialize)]
struct PeersResponse {
    #[serde(default)]
    peers: Vec<PeerListing>,
}

#[derive(Debug, Deserialize)]
struct PeerListing {
    #[serde(default)]
    node_id: String,
    #[serde(default)]
    endpoints: Vec<EndpointListing>,
}

#[derive(Debug, Deserialize)]
struct EndpointListing {
    #[serde(default)]
    transport: String,
    #[serde(default)]
    host: String,
    #[serde(default)]
    port: u16,
}

/// `sha256_hex(circle_id)[:16]`, the only circle identifier ever sent over the wire.
pub fn circle_hint(circle_id: &str) -> String {
    let digest = Sha256::digest(circle_id.as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// A thin client bound to one rendezvous server base URL.
#[derive(Debug, Clone)]
pub struct RendezvousClient {
    base_url: String,
    client: reqwest::Client,
}

impl RendezvousClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("reqwest client with no custom TLS config always builds");
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Probe `GET /v1/health` once; purely informational, logged at debug only.
    pub async fn probe_health(&self) {
        let url = format!("{}/v1/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!(%url, "rendezvous server reachable");
            }
            Ok(resp) => {
                tracing::debug!(%url, status = %resp.status(), "rendezvous health probe returned an error status");
            }
            Err(e) => {
                tracing::debug!(%url, error = %e, "rendezvous health probe failed");
            }
        }
    }

    pub async fn register(
        &self,
        node_id: &str,
        circle_id: &str,
        host: &str,
        port: u16,
    ) -> Result<(), RendezvousError> {
        let url = format!("{}/v1/register", self.base_url);
        let family = if host.contains(':') { "ipv6" } else { "ipv4" };
        let body = RegisterRequest {
            node_id: node_id.to_string(),
            circle_hint: circle_hint(circle_id),
            endpoints: vec![Endpoint {
                transport: "tcp",
                host: host.to_string(),
                port,
                family,
                nat: "unknown",
            }],
            capabilities: Capabilities {
                relay: false,
                transport: vec!["tcp"],
            },
            ttl_s: DEFAULT_TTL_SECS,
        };
        self.client
            .post(&url)
            .header("X-Felund-Node", node_id)
            .json(&body)
            .send()
            .await
            .map_err(|source| RendezvousError::Request { url, source })?;
        Ok(())
    }

    pub async fn unregister(&self, node_id: &str, circle_id: &str) -> Result<(), RendezvousError> {
        let url = format!("{}/v1/register", self.base_url);
        let body = UnregisterRequest {
            node_id: node_id.to_string(),
            circle_hint: circle_hint(circle_id),
        };
        self.client
            .delete(&url)
            .header("X-Felund-Node", node_id)
            .json(&body)
            .send()
            .await
            .map_err(|source| RendezvousError::Request { url, source })?;
        Ok(())
    }

    /// Returns `(node_id, addr)` pairs, excluding `self_node_id`.
    pub async fn lookup_peers(
        &self,
        node_id: &str,
        circle_id: &str,
        limit: u32,
    ) -> Result<Vec<(String, String)>, RendezvousError> {
        let url = format!(
            "{}/v1/peers?circle_hint={}&limit={limit}",
            self.base_url,
            circle_hint(circle_id)
        );
        let resp = self
            .client
            .get(&url)
            .header("X-Felund-Node", node_id)
            .send()
            .await
            .map_err(|source| RendezvousError::Request {
                url: url.clone(),
                source,
            })?;
        let parsed: PeersResponse = resp
            .json()
            .await
            .map_err(|source| RendezvousError::Request { url, source })?;

        let mut out = Vec::new();
        for peer in parsed.peers {
            if peer.node_id.is_empty() || peer.node_id == node_id {
                continue;
            }
            let addr = peer
                .endpoints
                .into_iter()
                .find(|e| e.transport == "tcp" && !e.host.is_empty() && e.port > 0)
                .map(|e| format!("{}:{}", e.host, e.port));
            if let Some(addr) = addr {
                out.push((peer.node_id, addr));
            }
        }
        Ok(out)
    }
}

/// Merge discovered `(node_id, addr)` pairs into the peer table exactly
/// like a gossiped `PEERS` frame would (§4.6 rendezvous refresh).
pub fn merge_discovered_peers(
    state: &felund_store::SharedState,
    circle_id: &str,
    discovered: &[(String, String)],
) -> usize {
    let mut merged = 0;
    let now = now_unix();
    for (node_id, addr) in discovered {
        let record = felund_proto::PeerRecord {
            node_id: node_id.clone(),
            addr: addr.clone(),
            last_seen: now,
        };
        if state.merge_peer(circle_id, &record) {
            merged += 1;
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_hint_is_a_short_hex_prefix_and_never_the_circle_id() {
        let hint = circle_hint("some-circle-id");
        assert_eq!(hint.len(), 16);
        assert_ne!(hint, "some-circle-id");
    }

    #[tokio::test]
    async fn merge_discovered_peers_uses_the_monotonic_merge_rule() {
        use felund_store::{NodeConfig, SharedState};

        let state = SharedState::new(NodeConfig::new("127.0.0.1", 0));
        let circle_id = state.create_circle(&"ab".repeat(32), None).to_string();

        let merged = merge_discovered_peers(
            &state,
            &circle_id,
            &[("peer-a".to_string(), "203.0.113.1:9000".to_string())],
        );
        assert_eq!(merged, 1);

        let merged_again = merge_discovered_peers(
            &state,
            &circle_id,
            &[("peer-a".to_string(), "203.0.113.1:9000".to_string())],
        );
        assert_eq!(merged_again, 0, "re-merging an identical record should be a no-op");
    }
}
