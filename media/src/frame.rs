//! A fixed-duration PCM slice produced by the pipeline for the sink (§3
//! "Frame").

use bytes::Bytes;

bitflags::bitflags! {
    /// Provenance flags for a frame's samples. `INTERPOLATED` and
    /// `SILENCE_FROM_LOSS` together describe how badly the loss-masking
    /// path had to cover for missing audio; `RESAMPLED` just means the
    /// polyphase resampler touched it, which is true of almost every frame
    /// in steady state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FrameFlags: u8 {
        const SILENCE_FROM_LOSS = 0b001;
        const RESAMPLED         = 0b010;
        const INTERPOLATED      = 0b100;
    }
}

/// A contiguous slice of interleaved PCM16 samples (§3 "Frame").
#[derive(Debug, Clone)]
pub struct Frame {
    /// Interleaved 16-bit signed samples, native endianness (the wire's
    /// network byte order is undone by the depacketiser).
    pub samples: Bytes,
    /// Per-channel sample count (i.e. `samples.len() / (2 * channels)`).
    pub sample_count: usize,
    /// Duration of this frame in the stream-timestamp domain (sender clock
    /// ticks, one per sample-per-channel).
    pub duration_ts: u32,
    /// Estimated capture time of this frame's first sample, in the
    /// sender's stream-timestamp domain.
    pub capture_time: u32,
    pub flags: FrameFlags,
}

impl Frame {
    pub fn silence(sample_count: usize, channels: u16, duration_ts: u32, capture_time: u32) -> Self {
        let byte_len = sample_count * channels as usize * 2;
        Frame {
            samples: Bytes::from(vec![0u8; byte_len]),
            sample_count,
            duration_ts,
            capture_time,
            flags: FrameFlags::SILENCE_FROM_LOSS | FrameFlags::INTERPOLATED,
        }
    }

    pub fn is_silence(&self) -> bool {
        self.flags.contains(FrameFlags::SILENCE_FROM_LOSS)
    }
}
