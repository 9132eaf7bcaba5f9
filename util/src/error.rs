use thiserror::Error;

/// Errors shared across the marshalling and pooling primitives.
///
/// Protocol crates (`rtcast-rtp`, `rtcast-rtcp`, `rtcast-fec`) define their
/// own richer error enums and convert into or out of this one only at crate
/// boundaries.
#[derive(Debug, Error)]
pub enum Error {
    #[error("buffer too short: need at least {need} bytes, got {got}")]
    BufferTooShort { need: usize, got: usize },

    #[error("value out of range: {0}")]
    OutOfRange(&'static str),

    #[error("pool exhausted: {0}")]
    PoolExhausted(&'static str),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
