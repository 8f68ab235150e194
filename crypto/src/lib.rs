//! Cryptographic primitives for Felund: handshake tokens, message MACs,
//! session-key derivation, and the optional AES-256-GCM payload envelope.
//!
//! Every function here is a pure transform over bytes the caller already
//! holds; none of them touch the network or the state store. Secret-bearing
//! comparisons (`verify_token`, `verify_message_mac`) use constant-time
//! equality so a timing side channel can't leak which byte of a guess was
//! wrong.

mod aead;
mod error;
mod mac;
mod session;
mod token;

pub use aead::{
    decrypt_frame, decrypt_message_fields, encrypt_frame, encrypt_message_fields, EncEnvelope,
    MessageFields,
};
pub use error::CryptoError;
pub use mac::{make_message_mac, verify_message_mac, MacFields};
pub use session::{derive_message_key, derive_session_key};
pub use token::{make_token, verify_token};

/// Decode a hex-encoded 32-byte circle secret.
///
/// Every derivation in this crate takes the secret in this already-decoded
/// form; callers hold it as hex because that's how it travels through
/// config files and invite codes.
pub(crate) fn decode_secret(secret_hex: &str) -> Result<[u8; 32], CryptoError> {
    let bytes = hex::decode(secret_hex).map_err(|_| CryptoError::MalformedSecret)?;
    bytes
        .try_into()
        .map_err(|_| CryptoError::MalformedSecret)
}
