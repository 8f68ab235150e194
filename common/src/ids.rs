use rand::RngCore;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

/// A fixed-length, lowercase-hex identifier.
///
/// `N` is the number of hex characters, not bytes. Felund truncates hashes
/// to a prefix rather than carrying the full digest on the wire, so the
/// identifier's length is independent of the hash function used to derive
/// it.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HexId<const N: usize>(String);

/// A value did not decode as an `N`-character lowercase-hex identifier.
#[derive(Debug, thiserror::Error)]
#[error("invalid {n}-char hex id: {value:?}", n = .expected_len)]
pub struct InvalidHexId {
    expected_len: usize,
    value: String,
}

impl<const N: usize> HexId<N> {
    /// Validate and wrap an existing hex string.
    pub fn from_hex(value: impl Into<String>) -> Result<Self, InvalidHexId> {
        let value = value.into();
        if value.len() != N || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(InvalidHexId {
                expected_len: N,
                value,
            });
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    /// Take the first `N` hex characters of `sha256_hex(input)`.
    fn from_sha256_prefix(input: &[u8]) -> Self {
        let digest = Sha256::digest(input);
        let full = hex::encode(digest);
        Self(full[..N].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<const N: usize> fmt::Display for HexId<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<const N: usize> fmt::Debug for HexId<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HexId<{N}>({})", self.0)
    }
}

impl<const N: usize> Serialize for HexId<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de, const N: usize> Deserialize<'de> for HexId<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_hex(raw).map_err(D::Error::custom)
    }
}

/// A node's stable identifier: 24 lowercase-hex characters, generated once
/// at install time and kept for the life of the local installation.
pub type NodeId = HexId<24>;

/// A circle's identifier: the first 24 hex characters of
/// `SHA-256(shared_secret)`. Two nodes holding the same secret necessarily
/// compute the same `CircleId`.
pub type CircleId = HexId<24>;

/// A content-addressed message identifier: 32 hex characters derived from
/// the author, creation timestamp, and a random nonce.
pub type MessageId = HexId<32>;

impl NodeId {
    /// Generate a fresh, random node identifier.
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self::from_sha256_prefix(&bytes)
    }
}

impl CircleId {
    /// Derive the circle identifier that corresponds to a hex-encoded
    /// shared secret.
    pub fn from_secret_hex(secret_hex: &str) -> Self {
        Self::from_sha256_prefix(secret_hex.as_bytes())
    }
}

impl MessageId {
    /// Derive a content-addressed message id from the author, the creation
    /// timestamp, and an explicit random nonce (hex-encoded).
    ///
    /// The nonce is threaded in by the caller rather than generated here so
    /// tests can construct deterministic ids.
    pub fn derive(author: &NodeId, created_ts: u64, nonce_hex: &str) -> Self {
        let payload = format!("{author}|{created_ts}|{nonce_hex}");
        Self::from_sha256_prefix(payload.as_bytes())
    }

    /// Derive a message id using a fresh random nonce.
    pub fn new(author: &NodeId, created_ts: u64) -> Self {
        let mut nonce = [0u8; 8];
        rand::thread_rng().fill_bytes(&mut nonce);
        Self::derive(author, created_ts, &hex::encode(nonce))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_is_24_hex_chars() {
        let id = NodeId::random();
        assert_eq!(id.as_str().len(), 24);
        assert!(id.as_str().bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn circle_id_is_pure_function_of_secret() {
        let secret = "a".repeat(64);
        assert_eq!(
            CircleId::from_secret_hex(&secret),
            CircleId::from_secret_hex(&secret)
        );
        assert_ne!(
            CircleId::from_secret_hex(&secret),
            CircleId::from_secret_hex(&"b".repeat(64))
        );
    }

    #[test]
    fn invalid_hex_id_rejected() {
        assert!(NodeId::from_hex("not-hex-at-all-zzzzzzzz").is_err());
        assert!(NodeId::from_hex("ab").is_err());
    }

    #[test]
    fn round_trips_through_serde_json() {
        let id = NodeId::random();
        let json = serde_json::to_string(&id).unwrap();
        let back: NodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
