use displaydoc::Display;
use thiserror::Error;

/// Errors raised while running one connection's anti-entropy round (§4.5, §4.8).
#[derive(Debug, Display, Error)]
pub enum SyncError {
    /// I/O error: {0}
    Io(#[from] std::io::Error),
    /// frame error: {0}
    Frame(#[from] felund_proto::ProtoError),
    /// circle {0} is not known to this node
    UnknownCircle(String),
    /// handshake authentication failed
    AuthFailed,
    /// unexpected frame during phase {phase}: {tag}
    UnexpectedFrame { phase: &'static str, tag: String },
    /// remote closed the connection before the handshake completed
    HandshakeAborted,
}
