//! Reordering and depacketisation: everything between "packets arrived off
//! the FEC decoder in some order" and "fixed-size PCM frames ready for the
//! resampler" (§4.3, §4.4).

pub mod depacketizer;
pub mod frame;
pub mod jitter_buffer;

pub use depacketizer::FrameAssembler;
pub use frame::{Frame, FrameFlags};
pub use jitter_buffer::{InsertOutcome, JitterBuffer, Slot};
