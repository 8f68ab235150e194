use crate::{decode_secret, CryptoError};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// The fields a message's MAC authenticates, borrowed from whatever message
/// type the caller owns.
///
/// The pipe-joined order here is the wire contract: `msg_id|circle_id|
/// channel_id|author_node_id|display_name|created_ts|text`. Changing the
/// order would silently break interop with every existing client.
#[derive(Debug, Clone, Copy)]
pub struct MacFields<'a> {
    pub msg_id: &'a str,
    pub circle_id: &'a str,
    pub channel_id: &'a str,
    pub author_node_id: &'a str,
    pub display_name: &'a str,
    pub created_ts: u64,
    pub text: &'a str,
}

impl MacFields<'_> {
    fn canonical_payload(&self) -> Vec<u8> {
        format!(
            "{}|{}|{}|{}|{}|{}|{}",
            self.msg_id,
            self.circle_id,
            self.channel_id,
            self.author_node_id,
            self.display_name,
            self.created_ts,
            self.text,
        )
        .into_bytes()
    }
}

/// `HMAC_SHA256(secret, <canonical pipe-joined fields>)`, hex-encoded.
pub fn make_message_mac(secret_hex: &str, fields: MacFields<'_>) -> Result<String, CryptoError> {
    let secret = decode_secret(secret_hex)?;
    let mut mac = HmacSha256::new_from_slice(&secret).expect("HMAC accepts any key length");
    mac.update(&fields.canonical_payload());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a message MAC produced by [`make_message_mac`].
///
/// An empty `mac` always fails rather than being treated as "unsigned but
/// trusted" — every message on the wire must carry proof of circle
/// membership.
pub fn verify_message_mac(secret_hex: &str, fields: MacFields<'_>, mac: &str) -> bool {
    if mac.is_empty() {
        return false;
    }
    let Ok(expected) = make_message_mac(secret_hex, fields) else {
        return false;
    };
    expected.as_bytes().ct_eq(mac.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields<'a>(text: &'a str) -> MacFields<'a> {
        MacFields {
            msg_id: "msgid",
            circle_id: "circle",
            channel_id: "general",
            author_node_id: "author",
            display_name: "alice",
            created_ts: 1_700_000_000,
            text,
        }
    }

    #[test]
    fn mac_round_trips() {
        let secret = "ab".repeat(32);
        let mac = make_message_mac(&secret, fields("hello")).unwrap();
        assert!(verify_message_mac(&secret, fields("hello"), &mac));
    }

    #[test]
    fn tampered_text_fails_verification() {
        let secret = "ab".repeat(32);
        let mac = make_message_mac(&secret, fields("hello")).unwrap();
        assert!(!verify_message_mac(&secret, fields("goodbye"), &mac));
    }

    #[test]
    fn field_order_is_part_of_the_contract() {
        // channel_id and author_node_id swapped must not produce the same MAC.
        let secret = "ab".repeat(32);
        let a = MacFields {
            msg_id: "m",
            circle_id: "c",
            channel_id: "x",
            author_node_id: "y",
            display_name: "d",
            created_ts: 1,
            text: "t",
        };
        let b = MacFields {
            msg_id: "m",
            circle_id: "c",
            channel_id: "y",
            author_node_id: "x",
            display_name: "d",
            created_ts: 1,
            text: "t",
        };
        assert_ne!(
            make_message_mac(&secret, a).unwrap(),
            make_message_mac(&secret, b).unwrap()
        );
    }

    #[test]
    fn empty_mac_never_verifies() {
        let secret = "ab".repeat(32);
        assert!(!verify_message_mac(&secret, fields("hello"), ""));
    }
}
