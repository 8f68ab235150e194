use crate::error::SyncError;
use crate::exchange::{anchor_serve_phase, exchange_peers_and_messages, fold_outcome};
use crate::nonce::random_nonce_hex;
use crate::outcome::SyncOutcome;
use felund_anchor::EnvelopeStore;
use felund_crypto::{derive_session_key, verify_token};
use felund_proto::{Frame, FrameReader, FrameWriter, PeerRecord};
use felund_store::SharedState;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Accept one inbound TCP connection and run it as the responder side of
/// the handshake (§4.5, responder column).
///
/// The peer's advertised `listen_addr` is never trusted for its host part:
/// only the port survives, paired with the IP this socket actually
/// connected from, so a peer can't gossip itself in under someone else's
/// address.
pub async fn accept(
    stream: TcpStream,
    state: &SharedState,
    anchor_store: &EnvelopeStore,
) -> Result<SyncOutcome, SyncError> {
    let observed_ip = stream.peer_addr()?.ip().to_string();
    run_responder(stream, observed_ip, state, anchor_store).await
}

pub(crate) async fn accept_on_stream<S>(
    stream: S,
    observed_ip: String,
    state: &SharedState,
    anchor_store: &EnvelopeStore,
) -> Result<SyncOutcome, SyncError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    run_responder(stream, observed_ip, state, anchor_store).await
}

async fn run_responder<S>(
    stream: S,
    observed_ip: String,
    state: &SharedState,
    anchor_store: &EnvelopeStore,
) -> Result<SyncOutcome, SyncError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let mut reader = FrameReader::new(read_half);
    let mut writer = FrameWriter::new(write_half);

    let (remote_node_id, circle_id, remote_listen_addr, client_nonce) =
        match reader.read_frame().await? {
            Frame::Hello {
                node_id,
                circle_id,
                listen_addr,
                client_nonce,
                can_anchor: _,
            } => (node_id, circle_id, listen_addr, client_nonce),
            other => {
                return Err(SyncError::UnexpectedFrame {
                    phase: "hello",
                    tag: other.tag().to_string(),
                })
            }
        };

    if !state.has_circle(&circle_id) {
        writer
            .write_frame(&Frame::Error {
                err: "unknown circle".to_string(),
            })
            .await?;
        return Err(SyncError::UnknownCircle(circle_id));
    }

    let server_nonce = random_nonce_hex();
    writer
        .write_frame(&Frame::Challenge {
            server_nonce: server_nonce.clone(),
        })
        .await?;

    let token = match reader.read_frame().await? {
        Frame::HelloAuth { token } => token,
        other => {
            return Err(SyncError::UnexpectedFrame {
                phase: "hello_auth",
                tag: other.tag().to_string(),
            })
        }
    };

    let secret = state
        .circle_secret(&circle_id)
        .ok_or_else(|| SyncError::UnknownCircle(circle_id.clone()))?;
    if !verify_token(&secret, &remote_node_id, &circle_id, &server_nonce, &token) {
        writer
            .write_frame(&Frame::Error {
                err: "auth failed".to_string(),
            })
            .await?;
        return Err(SyncError::AuthFailed);
    }

    let node_config = state.node_config();
    let enc_ready = client_nonce.is_some();
    writer
        .write_frame(&Frame::Welcome {
            node_id: state.node_id(),
            enc_ready,
            can_anchor: node_config.can_anchor,
        })
        .await?;

    if let Some(client_nonce) = &client_nonce {
        let key = derive_session_key(&secret, client_nonce, &server_nonce)
            .map_err(|_| SyncError::AuthFailed)?;
        reader.enable_encryption(key);
        writer.enable_encryption(key);
    }

    let observed_addr = match remote_listen_addr.rsplit_once(':') {
        Some((_, port)) => format!("{observed_ip}:{port}"),
        None => observed_ip,
    };
    state.merge_peer(
        &circle_id,
        &PeerRecord {
            node_id: remote_node_id.clone(),
            addr: observed_addr,
            last_seen: felund_common::now_unix(),
        },
    );

    let core_stats = exchange_peers_and_messages(&mut reader, &mut writer, state, &circle_id).await?;
    anchor_serve_phase(
        &mut reader,
        &mut writer,
        anchor_store,
        &circle_id,
        node_config.can_anchor,
    )
    .await;

    Ok(fold_outcome(remote_node_id, enc_ready, core_stats, (0, 0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use felund_store::NodeConfig;

    #[tokio::test]
    async fn rejects_unknown_circle() {
        let state = SharedState::new(NodeConfig::new("127.0.0.1", 0));
        let anchor = EnvelopeStore::new();

        let (client_io, server_io) = tokio::io::duplex(4096);
        let server = tokio::spawn(async move {
            accept_on_stream(server_io, "127.0.0.1".to_string(), &state, &anchor).await
        });

        let (rh, wh) = tokio::io::split(client_io);
        let mut reader = FrameReader::new(rh);
        let mut writer = FrameWriter::new(wh);
        writer
            .write_frame(&Frame::Hello {
                node_id: "abc".to_string(),
                circle_id: "nope".to_string(),
                listen_addr: "127.0.0.1:1".to_string(),
                client_nonce: None,
                can_anchor: false,
            })
            .await
            .unwrap();
        let reply = reader.read_frame().await.unwrap();
        assert_eq!(reply.tag(), "ERROR");
        assert!(server.await.unwrap().is_err());
    }
}
