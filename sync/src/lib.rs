mod error;
mod exchange;
mod initiator;
mod nonce;
mod outcome;
mod responder;

pub use error::SyncError;
pub use initiator::dial;
pub use outcome::SyncOutcome;
pub use responder::accept;
