use displaydoc::Display;
use thiserror::Error;

#[derive(Debug, Display, Error)]
pub enum GossipError {
    /// failed to bind listener on {addr}: {source}
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}
