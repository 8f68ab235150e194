use displaydoc::Display;
use thiserror::Error;

/// Errors raised while framing or parsing wire traffic (§4.2, §4.8 kind 1).
#[derive(Debug, Display, Error)]
pub enum ProtoError {
    /// I/O error: {0}
    Io(#[from] std::io::Error),
    /// frame exceeded the {limit}-byte cap
    Oversize { limit: usize },
    /// no frame arrived within the read timeout
    Timeout,
    /// remote peer closed the connection
    ConnectionClosed,
    /// malformed frame JSON: {0}
    MalformedJson(String),
    /// encrypted frame failed to decrypt
    Crypto,
}
