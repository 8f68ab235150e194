use felund_anchor::EnvelopeStore;
use felund_gossip::{GossipConfig, Scheduler};
use felund_store::{NodeConfig, SharedState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

fn fast_config() -> GossipConfig {
    GossipConfig {
        gossip_interval: Duration::from_millis(50),
        anchor_announce_rounds: 1000,
        rendezvous_interval: Duration::from_secs(3600),
        fanout: 5,
    }
}

#[tokio::test]
async fn two_schedulers_converge_on_posted_messages() {
    let secret = "33".repeat(32);

    let a_state = SharedState::new(NodeConfig::new("127.0.0.1", 0));
    let circle_id = a_state.create_circle(&secret, None).to_string();
    a_state
        .send_message(&circle_id, "general", "hello from a", false)
        .unwrap();

    let b_state = SharedState::new(NodeConfig::new("127.0.0.1", 0));
    b_state.create_circle(&secret, None);
    b_state
        .send_message(&circle_id, "general", "hello from b", false)
        .unwrap();

    let a_scheduler = Scheduler::new(a_state.clone(), Arc::new(EnvelopeStore::new()), fast_config(), None);
    let b_scheduler = Scheduler::new(b_state.clone(), Arc::new(EnvelopeStore::new()), fast_config(), None);

    let a_listener = a_scheduler.bind().await.unwrap();
    let a_addr = a_listener.local_addr().unwrap().to_string();
    let b_listener = b_scheduler.bind().await.unwrap();

    // Point B at A so B's dial loop discovers A without rendezvous.
    b_state.merge_peer(
        &circle_id,
        &felund_proto::PeerRecord {
            node_id: a_state.node_id(),
            addr: a_addr,
            last_seen: felund_common::now_unix(),
        },
    );

    let (a_tx, a_rx) = watch::channel(false);
    let (b_tx, b_rx) = watch::channel(false);
    let a_task = tokio::spawn(a_scheduler.serve(a_listener, a_rx));
    let b_task = tokio::spawn(b_scheduler.serve(b_listener, b_rx));

    tokio::time::sleep(Duration::from_millis(400)).await;

    a_tx.send(true).unwrap();
    b_tx.send(true).unwrap();
    a_task.await.unwrap().unwrap();
    b_task.await.unwrap().unwrap();

    assert_eq!(a_state.all_messages(&circle_id).len(), 2);
    assert_eq!(b_state.all_messages(&circle_id).len(), 2);
}
