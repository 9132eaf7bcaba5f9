//! RTCP control-channel wire types for rtcast (§6 "Wire formats"): sender
//! reports carrying clock-correlation data, and receiver reports carrying
//! loss/jitter/RTT observations. Grounded on the teacher's `rtcp` crate,
//! narrowed from RFC 3550's general multi-report-block packets to the
//! single-SSRC-per-session shape rtcast actually needs.

pub mod error;
pub mod header;
pub mod report;

pub use error::Error;
pub use report::{ReceiverReport, SenderReport};
