//! RTP wire types for rtcast: the fixed header, a full packet, the FEC
//! framing header carried by repair packets, and the PCM (de)packetizer.
//! Grounded on the teacher's `rtp` crate, trimmed to the one payload type
//! and the one extension (none) rtcast actually needs.

pub mod error;
pub mod fec_header;
pub mod header;
pub mod packet;
pub mod packetizer;

pub use error::Error;
pub use fec_header::{FecHeader, FecScheme};
pub use header::Header;
pub use packet::Packet;
pub use packetizer::{Depacketizer, Pcm16Depacketizer, Pcm16Payloader};
