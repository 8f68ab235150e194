use crate::error::SyncError;
use crate::outcome::SyncOutcome;
use felund_anchor::EnvelopeStore;
use felund_common::now_unix;
use felund_proto::{AnchorEnvelope, Frame, FrameReader, FrameWriter};
use felund_store::{InsertOutcome, SharedState};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::{timeout, Duration};

/// Cap on envelopes in one `ANCHOR_PUSH` (§4.5 rate limits).
const ANCHOR_PUSH_CAP: usize = 50;
/// Cap on envelopes in one `ANCHOR_MSGS` reply (§4.5 rate limits).
const ANCHOR_MSGS_CAP: usize = 200;
/// Idle budget per frame during the optional anchor phase (§4.5 phase 6, §5).
const ANCHOR_PHASE_TIMEOUT: Duration = Duration::from_secs(3);

/// Phases 3-5: peer and message anti-entropy.
///
/// Identical on both ends of the connection — each side writes its own
/// `PEERS`/`MSGS_HAVE` before reading the other's, so neither blocks
/// waiting for a write the peer hasn't issued yet.
pub async fn exchange_peers_and_messages<R, W>(
    reader: &mut FrameReader<R>,
    writer: &mut FrameWriter<W>,
    state: &SharedState,
    circle_id: &str,
) -> Result<(usize, usize, usize), SyncError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let local_peers = state.top_peers(circle_id, usize::MAX);
    writer.write_frame(&Frame::Peers { peers: local_peers }).await?;

    let local_ids = state.known_msg_ids(circle_id);
    writer
        .write_frame(&Frame::MsgsHave { msg_ids: local_ids })
        .await?;

    let mut peers_merged = 0;
    match reader.read_frame().await? {
        Frame::Peers { peers } => {
            for peer in &peers {
                if state.merge_peer(circle_id, peer) {
                    peers_merged += 1;
                }
            }
        }
        other => {
            return Err(SyncError::UnexpectedFrame {
                phase: "peers",
                tag: other.tag().to_string(),
            })
        }
    }

    let remote_ids = match reader.read_frame().await? {
        Frame::MsgsHave { msg_ids } => msg_ids,
        other => {
            return Err(SyncError::UnexpectedFrame {
                phase: "msgs_have",
                tag: other.tag().to_string(),
            })
        }
    };

    let missing = state.missing_ids(circle_id, &remote_ids);
    writer
        .write_frame(&Frame::MsgsReq { msg_ids: missing })
        .await?;

    let requested = match reader.read_frame().await? {
        Frame::MsgsReq { msg_ids } => msg_ids,
        other => {
            return Err(SyncError::UnexpectedFrame {
                phase: "msgs_req",
                tag: other.tag().to_string(),
            })
        }
    };
    let to_send = state.get_messages(circle_id, &requested);
    let messages_sent = to_send.len();
    writer
        .write_frame(&Frame::MsgsSend { messages: to_send })
        .await?;

    let mut messages_received = 0;
    match reader.read_frame().await? {
        Frame::MsgsSend { messages } => {
            for msg in messages {
                if matches!(
                    state.insert_message(circle_id, msg),
                    InsertOutcome::Inserted
                ) {
                    messages_received += 1;
                }
            }
        }
        other => {
            return Err(SyncError::UnexpectedFrame {
                phase: "msgs_send",
                tag: other.tag().to_string(),
            })
        }
    }

    Ok((peers_merged, messages_received, messages_sent))
}

/// Phase 6, pusher side: offer this node's backup of `circle_id` to a
/// remote that announced `can_anchor`, then pull back anything the anchor
/// holds that this node is missing.
///
/// Any failure here is swallowed and reported as zero activity: the
/// anchor phase is best-effort on top of an already-completed sync round.
pub async fn anchor_push_phase<R, W>(
    reader: &mut FrameReader<R>,
    writer: &mut FrameWriter<W>,
    state: &SharedState,
    circle_id: &str,
    remote_can_anchor: bool,
) -> (usize, usize)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if !remote_can_anchor {
        return (0, 0);
    }
    match run_anchor_push(reader, writer, state, circle_id).await {
        Ok(stats) => stats,
        Err(e) => {
            tracing::debug!(error = %e, "anchor push phase did not complete");
            (0, 0)
        }
    }
}

async fn run_anchor_push<R, W>(
    reader: &mut FrameReader<R>,
    writer: &mut FrameWriter<W>,
    state: &SharedState,
    circle_id: &str,
) -> Result<(usize, usize), SyncError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut messages = state.all_messages(circle_id);
    if messages.len() > ANCHOR_PUSH_CAP {
        let drop_to = messages.len() - ANCHOR_PUSH_CAP;
        messages.drain(0..drop_to);
    }
    let envelopes: Vec<AnchorEnvelope> = messages
        .iter()
        .map(|m| AnchorEnvelope {
            circle_id: circle_id.to_string(),
            msg_id: m.msg_id.clone(),
            created_ts: m.created_ts,
            blob: serde_json::to_string(m).unwrap_or_default(),
        })
        .collect();
    let pushed = envelopes.len();

    writer.write_frame(&Frame::AnchorPush { envelopes }).await?;
    match timeout(ANCHOR_PHASE_TIMEOUT, reader.read_frame()).await {
        Ok(Ok(Frame::AnchorPushAck {})) => {}
        Ok(Ok(other)) => {
            return Err(SyncError::UnexpectedFrame {
                phase: "anchor_push_ack",
                tag: other.tag().to_string(),
            })
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => return Err(SyncError::UnexpectedFrame { phase: "anchor_push_ack", tag: "timeout".into() }),
    }

    writer.write_frame(&Frame::AnchorPull { since: 0 }).await?;
    let pulled = match timeout(ANCHOR_PHASE_TIMEOUT, reader.read_frame()).await {
        Ok(Ok(Frame::AnchorMsgs { envelopes, .. })) => {
            let mut accepted = 0;
            for env in envelopes {
                if let Ok(msg) = serde_json::from_str(&env.blob) {
                    if matches!(
                        state.insert_message(circle_id, msg),
                        InsertOutcome::Inserted
                    ) {
                        accepted += 1;
                    }
                }
            }
            accepted
        }
        Ok(Ok(other)) => {
            return Err(SyncError::UnexpectedFrame {
                phase: "anchor_msgs",
                tag: other.tag().to_string(),
            })
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => return Err(SyncError::UnexpectedFrame { phase: "anchor_msgs", tag: "timeout".into() }),
    };

    Ok((pushed, pulled))
}

/// Phase 6, server side: serve a pusher's `ANCHOR_PUSH`/`ANCHOR_PULL` pair
/// if this node is locally anchor-capable, with a tight per-frame idle
/// budget since the remote may not engage at all.
pub async fn anchor_serve_phase<R, W>(
    reader: &mut FrameReader<R>,
    writer: &mut FrameWriter<W>,
    anchor_store: &EnvelopeStore,
    circle_id: &str,
    locally_can_anchor: bool,
) where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if !locally_can_anchor {
        return;
    }
    if let Err(e) = run_anchor_serve(reader, writer, anchor_store, circle_id).await {
        tracing::debug!(error = %e, "anchor serve phase did not complete");
    }
}

async fn run_anchor_serve<R, W>(
    reader: &mut FrameReader<R>,
    writer: &mut FrameWriter<W>,
    anchor_store: &EnvelopeStore,
    circle_id: &str,
) -> Result<(), SyncError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let envelopes = match timeout(ANCHOR_PHASE_TIMEOUT, reader.read_frame()).await {
        Ok(Ok(Frame::AnchorPush { envelopes })) => envelopes,
        Ok(Ok(other)) => {
            return Err(SyncError::UnexpectedFrame {
                phase: "anchor_push",
                tag: other.tag().to_string(),
            })
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => return Err(SyncError::UnexpectedFrame { phase: "anchor_push", tag: "timeout".into() }),
    };
    anchor_store.push_all(envelopes.into_iter().take(ANCHOR_PUSH_CAP));
    writer.write_frame(&Frame::AnchorPushAck {}).await?;

    let since = match timeout(ANCHOR_PHASE_TIMEOUT, reader.read_frame()).await {
        Ok(Ok(Frame::AnchorPull { since })) => since,
        Ok(Ok(other)) => {
            return Err(SyncError::UnexpectedFrame {
                phase: "anchor_pull",
                tag: other.tag().to_string(),
            })
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => return Err(SyncError::UnexpectedFrame { phase: "anchor_pull", tag: "timeout".into() }),
    };
    let mut envelopes = anchor_store.pull_since(circle_id, since);
    envelopes.truncate(ANCHOR_MSGS_CAP);
    writer
        .write_frame(&Frame::AnchorMsgs {
            envelopes,
            server_time: now_unix(),
        })
        .await?;
    Ok(())
}

pub(crate) fn fold_outcome(
    peer_node_id: String,
    encrypted: bool,
    (peers_merged, messages_received, messages_sent): (usize, usize, usize),
    (anchor_envelopes_pushed, anchor_envelopes_pulled): (usize, usize),
) -> SyncOutcome {
    SyncOutcome {
        peer_node_id,
        encrypted,
        peers_merged,
        messages_received,
        messages_sent,
        anchor_envelopes_pushed,
        anchor_envelopes_pulled,
    }
}
