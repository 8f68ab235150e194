use displaydoc::Display;
use thiserror::Error;

/// Errors produced by the crypto primitives.
///
/// None of these variants carry the secret material that triggered them —
/// only that a check failed — so a caller can log the variant without
/// leaking anything useful to an attacker.
#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// circle secret is not valid hex or not 32 bytes
    MalformedSecret,
    /// AES-GCM authentication tag did not verify
    TagMismatch,
    /// encrypted envelope was not valid base64
    MalformedEnvelope,
    /// decrypted plaintext was not the expected JSON shape
    MalformedPlaintext,
}
