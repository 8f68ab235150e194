use displaydoc::Display;
use thiserror::Error;

/// Errors raised by state-store mutations (§4.3, §4.8).
#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum StoreError {
    /// circle {0} is not known to this node
    UnknownCircle(String),
    /// channel id {0:?} is not a valid channel identifier
    InvalidChannelId(String),
    /// cannot leave the general channel
    CannotLeaveGeneral,
    /// message MAC did not verify
    BadMac,
    /// crypto derivation failed while signing a local message
    CryptoFailure,
}
