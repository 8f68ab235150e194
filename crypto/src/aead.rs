use crate::{decode_secret, session::derive_message_key, CryptoError};
use aes_gcm::{
    aead::{generic_array::GenericArray, Aead, KeyInit},
    Aes256Gcm,
};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const NONCE_LEN: usize = 12;

/// The message fields carried as AES-GCM associated data.
///
/// These are exactly the immutable, non-encrypted fields of a chat message:
/// binding them as AAD means an attacker who can't decrypt still can't
/// splice ciphertext from one message onto another's envelope header.
#[derive(Debug, Clone, Copy)]
pub struct MessageFields<'a> {
    pub msg_id: &'a str,
    pub circle_id: &'a str,
    pub channel_id: &'a str,
    pub author_node_id: &'a str,
    pub created_ts: u64,
}

impl MessageFields<'_> {
    fn aad(&self) -> Vec<u8> {
        format!(
            "{}|{}|{}|{}|{}",
            self.msg_id, self.circle_id, self.channel_id, self.author_node_id, self.created_ts
        )
        .into_bytes()
    }
}

/// An encrypted `(display_name, text)` payload, as carried in a message's
/// `enc` field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncEnvelope {
    /// Base64 12-byte nonce.
    pub nonce: String,
    /// Base64 ciphertext, tag included.
    pub ciphertext: String,
    /// Short fingerprint of the derived message key, for future key
    /// rotation; not used to decrypt.
    pub key_id: String,
}

#[derive(Serialize, Deserialize)]
struct PlaintextFields<'a> {
    display_name: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct OwnedPlaintextFields {
    display_name: String,
    text: String,
}

fn key_id_for(key: &[u8; 32]) -> String {
    let digest = Sha256::digest(key);
    hex::encode(&digest[..4])
}

fn cipher_for(key: &[u8; 32]) -> Aes256Gcm {
    Aes256Gcm::new(GenericArray::from_slice(key))
}

/// Encrypt the mutable `(display_name, text)` pair of a message under the
/// circle's derived message key.
pub fn encrypt_message_fields(
    secret_hex: &str,
    fields: MessageFields<'_>,
    display_name: &str,
    text: &str,
) -> Result<EncEnvelope, CryptoError> {
    decode_secret(secret_hex)?;
    let key = derive_message_key(secret_hex)?;
    let cipher = cipher_for(&key);

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = GenericArray::from_slice(&nonce_bytes);

    let plaintext = serde_json::to_vec(&PlaintextFields { display_name, text })
        .map_err(|_| CryptoError::MalformedPlaintext)?;

    let ciphertext = cipher
        .encrypt(
            nonce,
            aes_gcm::aead::Payload {
                msg: &plaintext,
                aad: &fields.aad(),
            },
        )
        .map_err(|_| CryptoError::TagMismatch)?;

    Ok(EncEnvelope {
        nonce: base64_encode(&nonce_bytes),
        ciphertext: base64_encode(&ciphertext),
        key_id: key_id_for(&key),
    })
}

/// Decrypt and authenticate an [`EncEnvelope`], recovering the original
/// `(display_name, text)` pair.
///
/// Fails with [`CryptoError::TagMismatch`] if the envelope was tampered
/// with, and with [`CryptoError::MalformedEnvelope`] if the nonce or
/// ciphertext aren't valid base64.
pub fn decrypt_message_fields(
    secret_hex: &str,
    fields: MessageFields<'_>,
    envelope: &EncEnvelope,
) -> Result<(String, String), CryptoError> {
    let key = derive_message_key(secret_hex)?;
    let cipher = cipher_for(&key);

    let nonce_bytes = base64_decode(&envelope.nonce)?;
    if nonce_bytes.len() != NONCE_LEN {
        return Err(CryptoError::MalformedEnvelope);
    }
    let ciphertext = base64_decode(&envelope.ciphertext)?;
    let nonce = GenericArray::from_slice(&nonce_bytes);

    let plaintext = cipher
        .decrypt(
            nonce,
            aes_gcm::aead::Payload {
                msg: &ciphertext,
                aad: &fields.aad(),
            },
        )
        .map_err(|_| CryptoError::TagMismatch)?;

    let parsed: OwnedPlaintextFields =
        serde_json::from_slice(&plaintext).map_err(|_| CryptoError::MalformedPlaintext)?;
    Ok((parsed.display_name, parsed.text))
}

/// Encrypt an arbitrary frame payload under a session key with no
/// associated data, returning `nonce || ciphertext || tag` as a single
/// buffer ready for base64 framing.
pub fn encrypt_frame(key: &[u8; 32], plaintext: &[u8]) -> Vec<u8> {
    let cipher = cipher_for(key);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = GenericArray::from_slice(&nonce_bytes);
    let mut out = cipher
        .encrypt(nonce, plaintext)
        .expect("AES-256-GCM encryption with a fixed-size key and nonce cannot fail");
    let mut buf = Vec::with_capacity(NONCE_LEN + out.len());
    buf.extend_from_slice(&nonce_bytes);
    buf.append(&mut out);
    buf
}

/// Inverse of [`encrypt_frame`]. `data` must be `nonce || ciphertext || tag`.
pub fn decrypt_frame(key: &[u8; 32], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if data.len() < NONCE_LEN {
        return Err(CryptoError::MalformedEnvelope);
    }
    let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
    let cipher = cipher_for(key);
    let nonce = GenericArray::from_slice(nonce_bytes);
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CryptoError::TagMismatch)
}

fn base64_encode(bytes: &[u8]) -> String {
    use base64::{engine::general_purpose::STANDARD, Engine};
    STANDARD.encode(bytes)
}

fn base64_decode(s: &str) -> Result<Vec<u8>, CryptoError> {
    use base64::{engine::general_purpose::STANDARD, Engine};
    STANDARD.decode(s).map_err(|_| CryptoError::MalformedEnvelope)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> MessageFields<'static> {
        MessageFields {
            msg_id: "m",
            circle_id: "c",
            channel_id: "general",
            author_node_id: "author",
            created_ts: 1_700_000_000,
        }
    }

    #[test]
    fn encrypt_then_decrypt_round_trips() {
        let secret = "ab".repeat(32);
        let env = encrypt_message_fields(&secret, fields(), "alice", "hello world").unwrap();
        let (name, text) = decrypt_message_fields(&secret, fields(), &env).unwrap();
        assert_eq!(name, "alice");
        assert_eq!(text, "hello world");
    }

    #[test]
    fn tampered_ciphertext_fails_tag_check() {
        let secret = "ab".repeat(32);
        let mut env = encrypt_message_fields(&secret, fields(), "alice", "hello world").unwrap();
        let mut raw = base64_decode(&env.ciphertext).unwrap();
        raw[0] ^= 0xFF;
        env.ciphertext = base64_encode(&raw);
        assert_eq!(
            decrypt_message_fields(&secret, fields(), &env).unwrap_err(),
            CryptoError::TagMismatch
        );
    }

    #[test]
    fn mismatched_aad_fails_tag_check() {
        let secret = "ab".repeat(32);
        let env = encrypt_message_fields(&secret, fields(), "alice", "hello world").unwrap();
        let mut wrong_fields = fields();
        wrong_fields.created_ts += 1;
        assert_eq!(
            decrypt_message_fields(&secret, wrong_fields, &env).unwrap_err(),
            CryptoError::TagMismatch
        );
    }

    #[test]
    fn nonces_are_fresh_per_call() {
        let secret = "ab".repeat(32);
        let a = encrypt_message_fields(&secret, fields(), "alice", "hello").unwrap();
        let b = encrypt_message_fields(&secret, fields(), "alice", "hello").unwrap();
        assert_ne!(a.nonce, b.nonce);
    }

    #[test]
    fn frame_round_trips() {
        let key = [7u8; 32];
        let sealed = encrypt_frame(&key, b"{\"t\":\"PEERS\"}");
        let opened = decrypt_frame(&key, &sealed).unwrap();
        assert_eq!(opened, b"{\"t\":\"PEERS\"}");
    }

    #[test]
    fn frame_bit_flip_fails() {
        let key = [7u8; 32];
        let mut sealed = encrypt_frame(&key, b"hello");
        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert_eq!(decrypt_frame(&key, &sealed).unwrap_err(), CryptoError::TagMismatch);
    }
}
