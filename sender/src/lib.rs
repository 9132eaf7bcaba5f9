//! Sender-side mirror of rtcast's receiver pipeline (§1: "a structural
//! mirror of the receiver's front half ... covered only as an interface
//! boundary", §4.1 mirror, §5 "The sender is symmetric"): slices PCM
//! frames into RTP source packets, protects them with the same block FEC
//! scheme the receiver decodes, and periodically reports sender-side
//! clock/volume state over RTCP.

pub mod encoder;
pub mod error;
pub mod fec_encoder;
pub mod packet_emitter;
pub mod pipeline;
pub mod rtcp_reporter;
pub mod session;

pub use encoder::Encoder;
pub use error::Error;
pub use fec_encoder::FecEncoder;
pub use pipeline::{SenderPipeline, Source};
pub use rtcp_reporter::RtcpReporter;
pub use session::{SenderParams, SenderSession};
