//! Primitives shared by every rtcast crate: wire (un)marshalling traits,
//! signed wraparound comparison for RTP sequence numbers and timestamps,
//! and the bounded, allocation-free pools the real-time path draws from.

pub mod clock;
pub mod error;
pub mod marshal;
pub mod pool;
pub mod wrap;

pub use error::Error;
