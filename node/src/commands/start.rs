use crate::error::NodeError;
use felund_anchor::EnvelopeStore;
use felund_gossip::{GossipConfig, Scheduler};
use felund_store::SharedState;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

/// Run the node until interrupted: bind the accept loop, start the dial and
/// rendezvous-refresh timers, and save state after every sync round.
pub async fn run(state: SharedState, state_dir: PathBuf) -> Result<(), NodeError> {
    let shutdown_state = state.clone();
    let anchor_store = Arc::new(EnvelopeStore::new());
    let scheduler = Scheduler::new(state, anchor_store, GossipConfig::default(), Some(state_dir.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_task = tokio::spawn(scheduler.run(shutdown_rx));

    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for ctrl-c");
    tracing::info!("shutdown requested");
    let _ = shutdown_tx.send(true);

    scheduler_task.await.expect("scheduler task panicked")?;
    felund_persist::save(&state_dir, &shutdown_state)?;
    Ok(())
}
