//! Adaptive resampling: the polyphase kernel that does the actual sample
//! rate conversion (§4.5) and the feedback loop that decides how much
//! conversion to apply on each frame (§4.6).

pub mod error;
pub mod kernel;
pub mod latency_monitor;
pub mod polyphase;

pub use error::Error;
pub use kernel::{ResamplerQuality, SincKernel, SincKernelConfig};
pub use latency_monitor::{LatencyMonitor, Profile, MAX_SCALING, MIN_SCALING};
pub use polyphase::PolyphaseResampler;
