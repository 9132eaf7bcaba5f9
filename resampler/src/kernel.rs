//! Windowed-sinc interpolation table (§4.5). Precomputes `window_interp`
//! phases of `2 * window_size` tap weights each, so resampling a sample
//! becomes a table lookup plus a dot product rather than evaluating `sinc`
//! per output sample.
//!
//! `window_size`/`window_interp` naming and defaults (32 taps, 128-phase
//! table for the high-quality tier) follow `roc_audio::ResamplerConfig`.

#[derive(Debug, Clone, Copy)]
pub struct SincKernelConfig {
    /// Half-width of the window, in input samples either side of center.
    pub window_size: usize,
    /// Number of fractional-phase table entries between two integer
    /// sample positions.
    pub window_interp: usize,
}

impl SincKernelConfig {
    /// (a) low-latency / low-quality tier (§4.5).
    pub const LOW_LATENCY: Self = Self { window_size: 8, window_interp: 32 };
    /// The `medium` option of the `resampler_quality` configuration knob
    /// (§6), between the two tiers §4.5 names explicitly.
    pub const MEDIUM: Self = Self { window_size: 16, window_interp: 64 };
    /// (b) high-quality tier, used by the Responsive latency profile (§4.6).
    pub const HIGH_QUALITY: Self = Self { window_size: 32, window_interp: 128 };
}

/// The `resampler_quality` configuration knob (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResamplerQuality {
    Low,
    Medium,
    High,
}

impl From<ResamplerQuality> for SincKernelConfig {
    fn from(quality: ResamplerQuality) -> Self {
        match quality {
            ResamplerQuality::Low => SincKernelConfig::LOW_LATENCY,
            ResamplerQuality::Medium => SincKernelConfig::MEDIUM,
            ResamplerQuality::High => SincKernelConfig::HIGH_QUALITY,
        }
    }
}

/// A precomputed windowed-sinc interpolation table.
pub struct SincKernel {
    window_size: usize,
    window_interp: usize,
    table: Vec<f32>,
}

impl SincKernel {
    pub fn build(config: SincKernelConfig) -> Self {
        let window_size = config.window_size.max(1);
        let window_interp = config.window_interp.max(1);
        let taps_per_phase = window_size * 2;
        let mut table = vec![0f32; window_interp * taps_per_phase];

        for phase in 0..window_interp {
            let frac = phase as f64 / window_interp as f64;
            for tap in 0..taps_per_phase {
                let x = tap as f64 - (window_size as f64 - 1.0) - frac;
                let weight = sinc(x) * blackman(x, window_size as f64);
                table[phase * taps_per_phase + tap] = weight as f32;
            }
        }

        SincKernel { window_size, window_interp, table }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn taps_per_phase(&self) -> usize {
        self.window_size * 2
    }

    /// Tap weights for the phase nearest `frac` (expected in `[0, 1)`),
    /// ordered from the leftmost tap (`window_size - 1` samples before the
    /// integer read position) to the rightmost.
    pub fn taps(&self, frac: f64) -> &[f32] {
        let phase = ((frac * self.window_interp as f64).round() as usize).min(self.window_interp - 1);
        let start = phase * self.taps_per_phase();
        &self.table[start..start + self.taps_per_phase()]
    }
}

fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-9 {
        1.0
    } else {
        (std::f64::consts::PI * x).sin() / (std::f64::consts::PI * x)
    }
}

fn blackman(x: f64, half_width: f64) -> f64 {
    let span = 2.0 * half_width;
    let n = x + half_width;
    if n < 0.0 || n > span {
        return 0.0;
    }
    let t = n / span;
    0.42 - 0.5 * (2.0 * std::f64::consts::PI * t).cos() + 0.08 * (4.0 * std::f64::consts::PI * t).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taps_sum_close_to_unity_near_integer_phase() {
        let kernel = SincKernel::build(SincKernelConfig::LOW_LATENCY);
        let sum: f32 = kernel.taps(0.0).iter().sum();
        assert!((sum - 1.0).abs() < 0.05, "sum was {sum}");
    }

    #[test]
    fn high_quality_tier_has_more_taps_and_phases() {
        let low = SincKernel::build(SincKernelConfig::LOW_LATENCY);
        let high = SincKernel::build(SincKernelConfig::HIGH_QUALITY);
        assert!(high.taps_per_phase() > low.taps_per_phase());
        assert!(high.window_interp > low.window_interp);
    }

    #[test]
    fn taps_clamp_to_last_phase_at_boundary() {
        let kernel = SincKernel::build(SincKernelConfig::LOW_LATENCY);
        // frac must never be queried >= 1.0 in practice, but the lookup
        // should not panic if it is.
        let _ = kernel.taps(0.999_999);
    }
}
