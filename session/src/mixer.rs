//! Sums per-session frames into one output frame (§4.8). All inputs are
//! assumed already resampled to the sink's nominal rate by the time they
//! reach here; the mixer itself only adds.

use bytes::Bytes;

use rtcast_media::{Frame, FrameFlags};

#[derive(Debug, Clone, Copy)]
pub enum MixPolicy {
    /// Clip to `i16` range on overflow.
    Saturating,
    /// Scale every sample by `1 / active_session_count` so `M` sessions at
    /// full scale never clip.
    Normalizing,
}

pub struct Mixer {
    channels: u16,
    policy: MixPolicy,
}

impl Mixer {
    pub fn new(channels: u16, policy: MixPolicy) -> Self {
        Mixer { channels, policy }
    }

    /// Mixes `frames` (one per live session that produced output this
    /// pull) into a single frame. An empty slice produces a silence frame
    /// tagged accordingly.
    pub fn mix(&self, frames: &[Frame], sample_count: usize, duration_ts: u32, capture_time: u32) -> Frame {
        if frames.is_empty() {
            return Frame::silence(sample_count, self.channels, duration_ts, capture_time);
        }

        let total_samples = sample_count * self.channels as usize;
        let mut acc = vec![0i32; total_samples];
        let mut any_interpolated = false;

        for frame in frames {
            any_interpolated |= frame.flags.contains(FrameFlags::INTERPOLATED);
            for (i, chunk) in frame.samples.chunks_exact(2).enumerate().take(total_samples) {
                acc[i] += i16::from_ne_bytes([chunk[0], chunk[1]]) as i32;
            }
        }

        let scale = match self.policy {
            MixPolicy::Saturating => 1.0,
            MixPolicy::Normalizing => 1.0 / frames.len() as f32,
        };

        let mut out = Vec::with_capacity(total_samples * 2);
        for sample in acc {
            let scaled = (sample as f32 * scale).clamp(i16::MIN as f32, i16::MAX as f32);
            out.extend_from_slice(&(scaled as i16).to_ne_bytes());
        }

        let mut flags = FrameFlags::empty();
        if any_interpolated {
            flags |= FrameFlags::INTERPOLATED;
        }

        Frame {
            samples: Bytes::from(out),
            sample_count,
            duration_ts,
            capture_time,
            flags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(samples: &[i16]) -> Frame {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_ne_bytes()).collect();
        Frame {
            samples: bytes.into(),
            sample_count: samples.len(),
            duration_ts: samples.len() as u32,
            capture_time: 0,
            flags: FrameFlags::empty(),
        }
    }

    #[test]
    fn no_sessions_emits_tagged_silence() {
        let mixer = Mixer::new(1, MixPolicy::Saturating);
        let out = mixer.mix(&[], 4, 4, 0);
        assert!(out.is_silence());
        assert!(out.samples.iter().all(|&b| b == 0));
    }

    #[test]
    fn saturating_mix_sums_and_clips() {
        let mixer = Mixer::new(1, MixPolicy::Saturating);
        let a = frame(&[30_000, 1, 1, 1]);
        let b = frame(&[30_000, 1, 1, 1]);
        let out = mixer.mix(&[a, b], 4, 4, 0);
        let first = i16::from_ne_bytes([out.samples[0], out.samples[1]]);
        assert_eq!(first, i16::MAX);
    }

    #[test]
    fn normalizing_mix_never_clips_full_scale_inputs() {
        let mixer = Mixer::new(1, MixPolicy::Normalizing);
        let a = frame(&[i16::MAX; 4]);
        let b = frame(&[i16::MAX; 4]);
        let out = mixer.mix(&[a, b], 4, 4, 0);
        let first = i16::from_ne_bytes([out.samples[0], out.samples[1]]);
        assert_eq!(first, i16::MAX);
    }
}
