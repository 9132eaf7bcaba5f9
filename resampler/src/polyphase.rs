//! The fractional-rate polyphase resampler itself (§4.5): one frame in, one
//! frame out, with phase state carried across calls so a change in `s`
//! between frames never produces an audible discontinuity.

use bytes::Bytes;

use rtcast_media::{Frame, FrameFlags};

use crate::kernel::SincKernel;

/// Per-channel input history plus the fractional read position, all of
/// which must survive across `process_frame` calls for phase continuity.
pub struct PolyphaseResampler {
    kernel: SincKernel,
    channels: usize,
    buffers: Vec<Vec<f32>>,
    read_pos: f64,
}

impl PolyphaseResampler {
    pub fn new(kernel: SincKernel, channels: u16) -> Self {
        let channels = channels.max(1) as usize;
        PolyphaseResampler {
            buffers: vec![Vec::new(); channels],
            read_pos: (kernel.window_size() as f64) - 1.0,
            kernel,
            channels,
        }
    }

    /// Resamples one input frame at scaling factor `s` (input-rate relative
    /// to nominal output-rate), producing a frame of the same sample count.
    /// `s` is expected to already be clamped by the latency monitor.
    pub fn process_frame(&mut self, frame: &Frame, s: f64) -> Frame {
        self.feed(frame);
        let want = frame.sample_count;
        let mut channel_out: Vec<Vec<f32>> = vec![Vec::with_capacity(want); self.channels];

        for _ in 0..want {
            let idx = self.read_pos.floor() as isize;
            let frac = self.read_pos.fract();
            let taps = self.kernel.taps(frac);
            let left = idx - (self.kernel.window_size() as isize - 1);

            for ch in 0..self.channels {
                let mut acc = 0f32;
                for (t, &weight) in taps.iter().enumerate() {
                    let sample_idx = left + t as isize;
                    let sample = if sample_idx < 0 {
                        0.0
                    } else {
                        self.buffers[ch].get(sample_idx as usize).copied().unwrap_or(0.0)
                    };
                    acc += sample * weight;
                }
                channel_out[ch].push(acc);
            }
            self.read_pos += s;
        }

        self.trim_consumed();

        Frame {
            samples: interleave_i16(&channel_out),
            sample_count: want,
            duration_ts: frame.duration_ts,
            capture_time: frame.capture_time,
            flags: frame.flags | FrameFlags::RESAMPLED,
        }
    }

    fn feed(&mut self, frame: &Frame) {
        let samples = decode_i16(&frame.samples);
        for (i, &s) in samples.iter().enumerate() {
            let ch = i % self.channels;
            self.buffers[ch].push(s as f32 / i16::MAX as f32);
        }
    }

    /// Drops history no longer reachable by any future tap window, keeping
    /// memory use bounded to roughly one frame plus the kernel's width.
    fn trim_consumed(&mut self) {
        let safe_margin = self.kernel.window_size();
        let drop = (self.read_pos.floor() as isize - safe_margin as isize).max(0) as usize;
        if drop == 0 {
            return;
        }
        for buf in &mut self.buffers {
            let drop = drop.min(buf.len());
            buf.drain(..drop);
        }
        self.read_pos -= drop as f64;
    }
}

fn decode_i16(bytes: &Bytes) -> Vec<i16> {
    bytes.chunks_exact(2).map(|c| i16::from_ne_bytes([c[0], c[1]])).collect()
}

fn interleave_i16(channels: &[Vec<f32>]) -> Bytes {
    if channels.is_empty() {
        return Bytes::new();
    }
    let frames = channels[0].len();
    let mut out = Vec::with_capacity(frames * channels.len() * 2);
    for i in 0..frames {
        for ch in channels {
            let clamped = ch[i].clamp(-1.0, 1.0) * i16::MAX as f32;
            out.extend_from_slice(&(clamped as i16).to_ne_bytes());
        }
    }
    out.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::SincKernelConfig;

    fn mono_frame(samples: &[i16]) -> Frame {
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
    fn unity_scaling_preserves_frame_length() {
        let kernel = SincKernel::build(SincKernelConfig::LOW_LATENCY);
        let mut resampler = PolyphaseResampler::new(kernel, 1);
        let input = mono_frame(&[0; 64]);
        let out = resampler.process_frame(&input, 1.0);
        assert_eq!(out.sample_count, 64);
        assert!(out.flags.contains(FrameFlags::RESAMPLED));
    }

    #[test]
    fn scaling_factor_changes_do_not_reset_read_position() {
        let kernel = SincKernel::build(SincKernelConfig::LOW_LATENCY);
        let mut resampler = PolyphaseResampler::new(kernel, 1);
        let input = mono_frame(&[1000; 32]);
        let before = resampler.read_pos;
        let _ = resampler.process_frame(&input, 1.01);
        let _ = resampler.process_frame(&input, 0.99);
        // read_pos keeps advancing monotonically; it never snaps back to
        // the pre-first-call value even though s changed between calls.
        assert!(resampler.read_pos > before);
    }

    #[test]
    fn multi_channel_interleaving_round_trips_channel_order() {
        let kernel = SincKernel::build(SincKernelConfig::LOW_LATENCY);
        let mut resampler = PolyphaseResampler::new(kernel, 2);
        let samples: Vec<i16> = (0..64).collect();
        let frame = Frame {
            sample_count: 32,
            ..mono_frame(&samples)
        };
        let out = resampler.process_frame(&frame, 1.0);
        assert_eq!(out.samples.len(), 32 * 2 * 2);
    }
}
