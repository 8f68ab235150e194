use crate::{decode_secret, CryptoError};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

fn token_payload(node_id: &str, circle_id: &str, nonce: &str) -> Vec<u8> {
    format!("{node_id}|{circle_id}|{nonce}").into_bytes()
}

/// `HMAC_SHA256(secret, node_id|circle_id|nonce)`, hex-encoded.
///
/// This is the handshake's sole proof of circle membership: whoever can
/// compute this over the server's challenge nonce must hold the circle
/// secret.
pub fn make_token(
    secret_hex: &str,
    node_id: &str,
    circle_id: &str,
    nonce: &str,
) -> Result<String, CryptoError> {
    let secret = decode_secret(secret_hex)?;
    let mut mac = HmacSha256::new_from_slice(&secret).expect("HMAC accepts any key length");
    mac.update(&token_payload(node_id, circle_id, nonce));
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a token produced by [`make_token`] using constant-time comparison.
pub fn verify_token(
    secret_hex: &str,
    node_id: &str,
    circle_id: &str,
    nonce: &str,
    token: &str,
) -> bool {
    let Ok(expected) = make_token(secret_hex, node_id, circle_id, nonce) else {
        return false;
    };
    expected.as_bytes().ct_eq(token.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips() {
        let secret = "ab".repeat(32);
        let token = make_token(&secret, "node1", "circle1", "nonce1").unwrap();
        assert!(verify_token(&secret, "node1", "circle1", "nonce1", &token));
    }

    #[test]
    fn bit_flip_fails_verification() {
        let secret = "ab".repeat(32);
        let mut token = make_token(&secret, "node1", "circle1", "nonce1").unwrap();
        let first_byte = token.as_bytes()[0];
        let flipped = if first_byte == b'0' { b'1' } else { b'0' };
        token.replace_range(0..1, std::str::from_utf8(&[flipped]).unwrap());
        assert!(!verify_token(&secret, "node1", "circle1", "nonce1", &token));
    }

    #[test]
    fn wrong_secret_fails() {
        let token = make_token(&"ab".repeat(32), "node1", "circle1", "nonce1").unwrap();
        assert!(!verify_token(&"cd".repeat(32), "node1", "circle1", "nonce1", &token));
    }

    #[test]
    fn malformed_secret_rejected() {
        assert!(make_token("not-hex", "node1", "circle1", "nonce1").is_err());
    }
}
