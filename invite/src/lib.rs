//! The `felund1.<base64url>` invite code: a circle secret and a peer
//! address wrapped together so a recipient can join with one paste.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use displaydoc::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const CODE_PREFIX: &str = "felund1.";
const CODE_VERSION: u8 = 1;

/// The only way decoding an invite code can fail; the reason is folded
/// into one string since callers only ever show it to a human.
#[derive(Debug, Display, Error)]
pub enum InviteError {
    /// invalid invite code: {0}
    Invalid(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct InvitePayload {
    v: u8,
    secret: String,
    peer: String,
}

/// Encode a circle secret and a peer's dialable address into a single code.
pub fn make_invite_code(secret_hex: &str, peer_addr: &str) -> String {
    let payload = InvitePayload {
        v: CODE_VERSION,
        secret: secret_hex.to_string(),
        peer: peer_addr.to_string(),
    };
    let raw = serde_json::to_vec(&payload).expect("invite payload always serializes");
    format!("{CODE_PREFIX}{}", URL_SAFE_NO_PAD.encode(raw))
}

/// Decode a code produced by [`make_invite_code`] into `(secret_hex, peer_addr)`.
pub fn parse_invite_code(code: &str) -> Result<(String, String), InviteError> {
    let code = code.trim();
    let token = code
        .strip_prefix(CODE_PREFIX)
        .ok_or_else(|| InviteError::Invalid("missing felund1. prefix".to_string()))?;

    let raw = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| InviteError::Invalid(format!("bad base64: {e}")))?;
    let payload: InvitePayload = serde_json::from_slice(&raw)
        .map_err(|e| InviteError::Invalid(format!("bad payload: {e}")))?;

    if payload.v != CODE_VERSION {
        return Err(InviteError::Invalid(format!(
            "unsupported code version {}",
            payload.v
        )));
    }
    let secret_hex = payload.secret.trim().to_lowercase();
    let peer_addr = payload.peer.trim().to_string();
    if secret_hex.is_empty() || peer_addr.is_empty() {
        return Err(InviteError::Invalid("code missing fields".to_string()));
    }
    hex::decode(&secret_hex).map_err(|_| InviteError::Invalid("secret is not valid hex".to_string()))?;
    if peer_addr.rsplit_once(':').is_none() {
        return Err(InviteError::Invalid("peer address missing a port".to_string()));
    }

    Ok((secret_hex, peer_addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_valid_code() {
        let secret = "ab".repeat(32);
        let code = make_invite_code(&secret, "203.0.113.9:9443");
        assert!(code.starts_with("felund1."));

        let (decoded_secret, decoded_peer) = parse_invite_code(&code).unwrap();
        assert_eq!(decoded_secret, secret);
        assert_eq!(decoded_peer, "203.0.113.9:9443");
    }

    #[test]
    fn rejects_missing_prefix() {
        let err = parse_invite_code("not-a-code").unwrap_err();
        assert!(matches!(err, InviteError::Invalid(_)));
    }

    #[test]
    fn rejects_truncated_base64() {
        let err = parse_invite_code("felund1.not valid base64!!").unwrap_err();
        assert!(matches!(err, InviteError::Invalid(_)));
    }

    #[test]
    fn rejects_wrong_version() {
        let raw = serde_json::to_vec(&InvitePayload {
            v: 2,
            secret: "ab".repeat(32),
            peer: "127.0.0.1:9000".to_string(),
        })
        .unwrap();
        let code = format!("felund1.{}", URL_SAFE_NO_PAD.encode(raw));
        let err = parse_invite_code(&code).unwrap_err();
        assert!(matches!(err, InviteError::Invalid(_)));
    }

    #[test]
    fn rejects_peer_without_port() {
        let secret = "ab".repeat(32);
        let payload = InvitePayload {
            v: 1,
            secret,
            peer: "no-port-here".to_string(),
        };
        let raw = serde_json::to_vec(&payload).unwrap();
        let code = format!("felund1.{}", URL_SAFE_NO_PAD.encode(raw));
        let err = parse_invite_code(&code).unwrap_err();
        assert!(matches!(err, InviteError::Invalid(_)));
    }
}
