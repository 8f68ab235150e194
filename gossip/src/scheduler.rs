use crate::config::GossipConfig;
use crate::error::GossipError;
use felund_anchor::EnvelopeStore;
use felund_rendezvous::{merge_discovered_peers, RendezvousClient};
use felund_store::SharedState;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::interval;

/// Runs the accept loop, dial loop, anchor announcement, and (optional)
/// rendezvous refresh for one node until told to stop (§4.6).
pub struct Scheduler {
    state: SharedState,
    anchor_store: Arc<EnvelopeStore>,
    config: GossipConfig,
    rendezvous: Option<RendezvousClient>,
    persist_dir: Option<PathBuf>,
}

impl Scheduler {
    /// `persist_dir`, when set, saves the node's state after every sync
    /// round (inbound or outbound) in addition to whatever shutdown
    /// handling the caller does, per the chosen open-question resolution
    /// that persistence should not wait only for clean shutdown.
    pub fn new(
        state: SharedState,
        anchor_store: Arc<EnvelopeStore>,
        config: GossipConfig,
        persist_dir: Option<PathBuf>,
    ) -> Self {
        let rendezvous_base = state.node_config().rendezvous_base;
        let rendezvous = if rendezvous_base.trim().is_empty() {
            None
        } else {
            Some(RendezvousClient::new(rendezvous_base))
        };
        Self {
            state,
            anchor_store,
            config,
            rendezvous,
            persist_dir,
        }
    }

    fn save_if_configured(&self) {
        let Some(dir) = &self.persist_dir else {
            return;
        };
        if let Err(e) = felund_persist::save(dir, &self.state) {
            tracing::debug!(error = %e, "failed to persist state after sync round");
        }
    }

    /// Bind the accept listener. Split out from [`Scheduler::serve`] so
    /// callers (and tests) can learn the bound address before the
    /// scheduler's loops start, which matters when the configured port is 0.
    pub async fn bind(&self) -> Result<TcpListener, GossipError> {
        let node = self.state.node_config();
        let bind_addr = format!("{}:{}", node.bind, node.port);
        TcpListener::bind(&bind_addr)
            .await
            .map_err(|source| GossipError::Bind {
                addr: bind_addr,
                source,
            })
    }

    /// Run until `shutdown` is set to `true`, binding its own listener.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<(), GossipError> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }

    /// Run the accept loop, dial loop, anchor announcement, and rendezvous
    /// refresh against an already-bound listener until `shutdown` fires.
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), GossipError> {
        tracing::info!(addr = ?listener.local_addr(), "gossip scheduler listening");

        if let Some(client) = &self.rendezvous {
            client.probe_health().await;
        }

        let mut gossip_tick = interval(self.config.gossip_interval);
        let mut rendezvous_tick = interval(self.config.rendezvous_interval);
        let mut round: u32 = 0;

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer_addr)) => {
                            let state = self.state.clone();
                            let anchor_store = self.anchor_store.clone();
                            let persist_dir = self.persist_dir.clone();
                            tokio::spawn(async move {
                                match felund_sync::accept(stream, &state, &anchor_store).await {
                                    Ok(outcome) => {
                                        tracing::debug!(?outcome, %peer_addr, "inbound sync round completed");
                                    }
                                    Err(e) => {
                                        tracing::debug!(error = %e, %peer_addr, "inbound sync round failed");
                                    }
                                }
                                if let Some(dir) = persist_dir {
                                    if let Err(e) = felund_persist::save(&dir, &state) {
                                        tracing::debug!(error = %e, "failed to persist state after inbound sync round");
                                    }
                                }
                            });
                        }
                        Err(e) => {
                            tracing::debug!(error = %e, "failed to accept inbound connection");
                        }
                    }
                }

                _ = gossip_tick.tick() => {
                    round += 1;
                    self.run_dial_round().await;
                    self.save_if_configured();
                    if self.state.node_config().can_anchor
                        && round % self.config.anchor_announce_rounds == 0
                    {
                        self.announce_anchor_to_all_circles();
                    }
                }

                _ = rendezvous_tick.tick(), if self.rendezvous.is_some() => {
                    self.run_rendezvous_round().await;
                }

                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("gossip scheduler shutting down");
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    async fn run_dial_round(&self) {
        let node_id = self.state.node_id();
        let listen_addr = {
            let node = self.state.node_config();
            felund_common::public_addr_hint(&node.bind, node.port)
        };
        for circle_id in self.state.list_circle_ids() {
            for peer in self.state.top_peers(&circle_id, self.config.fanout) {
                if peer.node_id == node_id {
                    continue;
                }
                match felund_sync::dial(&self.state, &peer.addr, &circle_id, &listen_addr).await {
                    Ok(outcome) => {
                        tracing::debug!(?outcome, peer = %peer.addr, %circle_id, "outbound sync round completed");
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, peer = %peer.addr, %circle_id, "outbound sync round failed");
                    }
                }
            }
        }
    }

    fn announce_anchor_to_all_circles(&self) {
        for circle_id in self.state.list_circle_ids() {
            if let Err(e) = self.state.announce_anchor(&circle_id) {
                tracing::debug!(error = %e, %circle_id, "failed to announce anchor capability");
            }
        }
    }

    async fn run_rendezvous_round(&self) {
        let Some(client) = &self.rendezvous else {
            return;
        };
        let node_id = self.state.node_id();
        let node = self.state.node_config();
        let listen_addr = felund_common::public_addr_hint(&node.bind, node.port);
        let Ok((host, port)) = felund_common::parse_host_port(&listen_addr) else {
            return;
        };

        for circle_id in self.state.list_circle_ids() {
            if let Err(e) = client.register(&node_id, &circle_id, &host, port).await {
                tracing::debug!(error = %e, %circle_id, "rendezvous registration failed");
                continue;
            }
            match client.lookup_peers(&node_id, &circle_id, 50).await {
                Ok(discovered) => {
                    let merged = merge_discovered_peers(&self.state, &circle_id, &discovered);
                    if merged > 0 {
                        tracing::debug!(merged, %circle_id, "merged rendezvous-discovered peers");
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, %circle_id, "rendezvous lookup failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use felund_store::NodeConfig;

    #[tokio::test]
    async fn bind_reports_the_actual_ephemeral_port() {
        let state = SharedState::new(NodeConfig::new("127.0.0.1", 0));
        let scheduler = Scheduler::new(state, Arc::new(EnvelopeStore::new()), GossipConfig::default(), None);
        let listener = scheduler.bind().await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }
}
