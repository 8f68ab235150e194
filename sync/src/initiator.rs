use crate::error::SyncError;
use crate::exchange::{anchor_push_phase, exchange_peers_and_messages, fold_outcome};
use crate::nonce::random_nonce_hex;
use crate::outcome::SyncOutcome;
use felund_crypto::{derive_session_key, make_token};
use felund_proto::{Frame, FrameReader, FrameWriter};
use felund_store::SharedState;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Dial `addr` and run a full anti-entropy round for `circle_id` as the
/// connection's initiator (§4.5, initiator column).
pub async fn dial(
    state: &SharedState,
    addr: &str,
    circle_id: &str,
    listen_addr: &str,
) -> Result<SyncOutcome, SyncError> {
    let stream = TcpStream::connect(addr).await?;
    run_initiator(stream, state, circle_id, listen_addr).await
}

async fn run_initiator<S>(
    stream: S,
    state: &SharedState,
    circle_id: &str,
    listen_addr: &str,
) -> Result<SyncOutcome, SyncError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let secret = state
        .circle_secret(circle_id)
        .ok_or_else(|| SyncError::UnknownCircle(circle_id.to_string()))?;
    let node_id = state.node_id();
    let node_config = state.node_config();

    let (read_half, write_half) = tokio::io::split(stream);
    let mut reader = FrameReader::new(read_half);
    let mut writer = FrameWriter::new(write_half);

    let client_nonce = random_nonce_hex();
    writer
        .write_frame(&Frame::Hello {
            node_id: node_id.clone(),
            circle_id: circle_id.to_string(),
            listen_addr: listen_addr.to_string(),
            client_nonce: Some(client_nonce.clone()),
            can_anchor: node_config.can_anchor,
        })
        .await?;

    let server_nonce = match reader.read_frame().await? {
        Frame::Challenge { server_nonce } => server_nonce,
        other => {
            return Err(SyncError::UnexpectedFrame {
                phase: "challenge",
                tag: other.tag().to_string(),
            })
        }
    };

    let token = make_token(&secret, &node_id, circle_id, &server_nonce)
        .map_err(|_| SyncError::AuthFailed)?;
    writer.write_frame(&Frame::HelloAuth { token }).await?;

    let (remote_node_id, enc_ready, remote_can_anchor) = match reader.read_frame().await? {
        Frame::Welcome {
            node_id,
            enc_ready,
            can_anchor,
        } => (node_id, enc_ready, can_anchor),
        Frame::Error { err } => {
            tracing::debug!(%err, "handshake rejected by remote");
            return Err(SyncError::AuthFailed);
        }
        other => {
            return Err(SyncError::UnexpectedFrame {
                phase: "welcome",
                tag: other.tag().to_string(),
            })
        }
    };

    if enc_ready {
        let key = derive_session_key(&secret, &client_nonce, &server_nonce)
            .map_err(|_| SyncError::AuthFailed)?;
        reader.enable_encryption(key);
        writer.enable_encryption(key);
    }

    let core_stats = exchange_peers_and_messages(&mut reader, &mut writer, state, circle_id).await?;
    let anchor_stats = anchor_push_phase(
        &mut reader,
        &mut writer,
        state,
        circle_id,
        remote_can_anchor,
    )
    .await;

    Ok(fold_outcome(remote_node_id, enc_ready, core_stats, anchor_stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responder::accept_on_stream;
    use felund_anchor::EnvelopeStore;
    use felund_store::NodeConfig;
    use std::sync::Arc;

    fn seeded_state(can_anchor: bool) -> SharedState {
        let mut cfg = NodeConfig::new("127.0.0.1", 0);
        cfg.can_anchor = can_anchor;
        SharedState::new(cfg)
    }

    #[tokio::test]
    async fn dials_and_converges_over_an_in_memory_stream() {
        let client_state = seeded_state(false);
        let server_state = seeded_state(false);

        let secret = "ab".repeat(32);
        let circle_id = client_state.create_circle(&secret, None).to_string();
        server_state.create_circle(&secret, None);

        client_state
            .send_message(&circle_id, "general", "hello from client", false)
            .unwrap();
        server_state
            .send_message(&circle_id, "general", "hello from server", false)
            .unwrap();

        let (client_io, server_io) = tokio::io::duplex(1 << 16);
        let server_anchor = Arc::new(EnvelopeStore::new());
        let server_state_clone = server_state.clone();
        let server_task = tokio::spawn(async move {
            accept_on_stream(
                server_io,
                "127.0.0.1".to_string(),
                &server_state_clone,
                &server_anchor,
            )
            .await
        });

        let outcome = run_initiator(client_io, &client_state, &circle_id, "127.0.0.1:9000")
            .await
            .unwrap();
        let server_outcome = server_task.await.unwrap().unwrap();

        assert_eq!(outcome.messages_received, 1);
        assert_eq!(server_outcome.messages_received, 1);
        assert_eq!(client_state.all_messages(&circle_id).len(), 2);
        assert_eq!(server_state.all_messages(&circle_id).len(), 2);
    }

    #[tokio::test]
    async fn wrong_secret_fails_the_handshake() {
        let client_state = seeded_state(false);
        let server_state = seeded_state(false);

        let circle_id = client_state.create_circle(&"ab".repeat(32), None).to_string();
        server_state.create_circle(&"cd".repeat(32), None);

        let (client_io, server_io) = tokio::io::duplex(1 << 16);
        let server_anchor = Arc::new(EnvelopeStore::new());
        let server_state_clone = server_state.clone();
        let server_task = tokio::spawn(async move {
            accept_on_stream(
                server_io,
                "127.0.0.1".to_string(),
                &server_state_clone,
                &server_anchor,
            )
            .await
        });

        let result = run_initiator(client_io, &client_state, &circle_id, "127.0.0.1:9000").await;
        assert!(result.is_err());
        assert!(server_task.await.unwrap().is_err());
    }
}
