//! Wire types for Felund: the frame enum exchanged during a sync round, the
//! newline-delimited (optionally AES-GCM-sealed) framing codec, and the
//! control-channel event vocabulary.
//!
//! This crate owns the shapes that cross the network; it never touches the
//! state store or the circle secret directly (the codec takes an
//! already-derived session key).

mod codec;
mod control;
mod error;
mod frame;
mod message;

pub use codec::{FrameReader, FrameWriter, FRAME_READ_TIMEOUT, MAX_ENCRYPTED_FRAME_BYTES, MAX_PLAINTEXT_FRAME_BYTES};
pub use control::{parse_control_event, AccessMode, ChannelEvt, ChannelOp, ControlEvent};
pub use error::ProtoError;
pub use frame::Frame;
pub use message::{AnchorEnvelope, ChatMessage, PeerRecord, CONTROL_CHANNEL};
