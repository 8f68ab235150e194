use crate::{decode_secret, CryptoError};
use hkdf::Hkdf;
use sha2::Sha256;

const SESSION_INFO: &[u8] = b"felund-sess-v1";
const MESSAGE_INFO: &[u8] = b"felund-msg-v1";

/// `HKDF-SHA256(secret, info="felund-sess-v1", salt=client_nonce||server_nonce, L=32)`.
///
/// Both nonces MUST be fresh per handshake; reusing a nonce pair collapses
/// to a reused session key and every encrypted frame under it inherits
/// AES-GCM's nonce-reuse vulnerability.
pub fn derive_session_key(
    secret_hex: &str,
    client_nonce_hex: &str,
    server_nonce_hex: &str,
) -> Result<[u8; 32], CryptoError> {
    let secret = decode_secret(secret_hex)?;
    let mut salt = Vec::with_capacity(client_nonce_hex.len() + server_nonce_hex.len());
    salt.extend_from_slice(client_nonce_hex.as_bytes());
    salt.extend_from_slice(server_nonce_hex.as_bytes());

    let hk = Hkdf::<Sha256>::new(Some(&salt), &secret);
    let mut out = [0u8; 32];
    hk.expand(SESSION_INFO, &mut out)
        .expect("32 bytes is a valid HKDF-SHA256 output length");
    Ok(out)
}

/// `HKDF-SHA256(secret, info="felund-msg-v1", salt=∅, L=32)`.
///
/// Unlike the session key, this is stable for the life of the circle secret
/// — it is what protects the `display_name`/`text` pair inside a message's
/// optional `enc` envelope, which must remain decryptable long after the
/// handshake that delivered it.
pub fn derive_message_key(secret_hex: &str) -> Result<[u8; 32], CryptoError> {
    let secret = decode_secret(secret_hex)?;
    let hk = Hkdf::<Sha256>::new(None, &secret);
    let mut out = [0u8; 32];
    hk.expand(MESSAGE_INFO, &mut out)
        .expect("32 bytes is a valid HKDF-SHA256 output length");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_key_is_deterministic() {
        let secret = "ab".repeat(32);
        let a = derive_session_key(&secret, "c1", "s1").unwrap();
        let b = derive_session_key(&secret, "c1", "s1").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn session_key_depends_on_both_nonces() {
        let secret = "ab".repeat(32);
        let a = derive_session_key(&secret, "c1", "s1").unwrap();
        let b = derive_session_key(&secret, "c1", "s2").unwrap();
        let c = derive_session_key(&secret, "c2", "s1").unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn message_key_is_stable_across_sessions() {
        let secret = "ab".repeat(32);
        assert_eq!(
            derive_message_key(&secret).unwrap(),
            derive_message_key(&secret).unwrap()
        );
    }

    #[test]
    fn message_and_session_keys_differ() {
        let secret = "ab".repeat(32);
        let session = derive_session_key(&secret, "c1", "s1").unwrap();
        let message = derive_message_key(&secret).unwrap();
        assert_ne!(session, message);
    }
}
