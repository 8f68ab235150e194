use rand_core::{OsRng, RngCore};

/// A fresh cryptographically random nonce, hex-encoded.
///
/// Used for both the client and server handshake nonces; §4.5 requires
/// each to be unpredictable since they salt the session-key derivation.
pub fn random_nonce_hex() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
