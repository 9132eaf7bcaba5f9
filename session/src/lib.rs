//! Session lifecycle, routing, mixing, and the sink-driven pipeline: the
//! glue that turns the FEC/jitter/resampler stages into a running receiver
//! (§3 "Session", §4.1, §4.7–§4.9, §5).

pub mod error;
pub mod mixer;
pub mod packet;
pub mod pipeline;
pub mod pools;
pub mod router;
pub mod rtcp_reporter;
pub mod session;
pub mod sink_clock;
pub mod watchdog;

pub use error::Error;
pub use mixer::{MixPolicy, Mixer};
pub use pipeline::Pipeline;
pub use pools::PoolSet;
pub use router::{Router, SessionInput};
pub use rtcp_reporter::ReceiverReportTracker;
pub use session::{FecParams, Session, SessionParams, SessionState};
pub use sink_clock::{Sink, SinkClock};
pub use watchdog::Watchdog;
