//! Computes the resampler's scaling factor `s` from observed latency (§4.6).
//! The sink clock is the sole pacer (§4.9): there is no internal timer here,
//! `update` is driven once per sink pull and is handed `now` by the caller.

use log::warn;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Small dead-band, high gain; tight convergence, audibly larger `s`
    /// excursions, paired with the high-quality kernel.
    Responsive,
    /// Wide dead-band, low gain; tolerates steady-state error in exchange
    /// for inaudible adjustments.
    Gentle,
}

#[derive(Debug, Clone, Copy)]
pub struct ProfileParams {
    pub dead_band_ns: i64,
    pub proportional_gain: f64,
    pub integral_gain: f64,
    pub min_update_interval_ns: u64,
}

impl Profile {
    pub fn params(self) -> ProfileParams {
        match self {
            Profile::Responsive => ProfileParams {
                dead_band_ns: 1_000_000,
                proportional_gain: 0.15,
                integral_gain: 0.02,
                min_update_interval_ns: 5_000_000,
            },
            Profile::Gentle => ProfileParams {
                dead_band_ns: 8_000_000,
                proportional_gain: 0.04,
                integral_gain: 0.004,
                min_update_interval_ns: 40_000_000,
            },
        }
    }
}

/// Hard bounds on `s` (§4.6 "Clamps"): past these the session is flagged
/// broken rather than allowed to keep drifting.
pub const MIN_SCALING: f64 = 0.95;
pub const MAX_SCALING: f64 = 1.05;

pub struct LatencyMonitor {
    profile: Profile,
    target_latency_ns: i64,
    integral: f64,
    last_update_ns: Option<u64>,
    current_scaling: f64,
}

impl LatencyMonitor {
    pub fn new(profile: Profile, target_latency_ns: i64) -> Self {
        LatencyMonitor {
            profile,
            target_latency_ns,
            integral: 0.0,
            last_update_ns: None,
            current_scaling: 1.0,
        }
    }

    /// Current `s`, unchanged until the next successful `update`.
    pub fn scaling(&self) -> f64 {
        self.current_scaling
    }

    /// `now_ns` and `current_latency_ns` both come from the sink pull that
    /// triggered this update: `current_latency_ns` is the gap between the
    /// capture time of the packet at the jitter buffer's read cursor and
    /// the nominal playback time of the next output sample.
    pub fn update(&mut self, now_ns: u64, current_latency_ns: i64) -> Result<f64> {
        let params = self.profile.params();

        if let Some(last) = self.last_update_ns {
            if now_ns.saturating_sub(last) < params.min_update_interval_ns {
                return Ok(self.current_scaling);
            }
        }
        self.last_update_ns = Some(now_ns);

        let error_ns = current_latency_ns - self.target_latency_ns;
        if error_ns.abs() <= params.dead_band_ns {
            self.integral = 0.0;
            self.current_scaling = 1.0;
            return Ok(self.current_scaling);
        }

        // Positive error (buffer running ahead of target, latency too high)
        // means the source is arriving earlier than consumed: speed the
        // resampler's read rate up to drain the backlog, i.e. s > 1.
        let error_frac = error_ns as f64 / self.target_latency_ns.max(1) as f64;
        self.integral += error_frac;
        let adjustment = params.proportional_gain * error_frac + params.integral_gain * self.integral;
        let s = 1.0 + adjustment;

        if !(MIN_SCALING..=MAX_SCALING).contains(&s) {
            warn!("latency monitor scaling {s} outside [{MIN_SCALING}, {MAX_SCALING}], session should restart");
            return Err(Error::ScalingOutOfRange(s));
        }

        self.current_scaling = s;
        Ok(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inside_dead_band_resets_to_unity() {
        let mut monitor = LatencyMonitor::new(Profile::Gentle, 100_000_000);
        let s = monitor.update(0, 100_500_000).unwrap();
        assert_eq!(s, 1.0);
    }

    #[test]
    fn positive_error_pushes_scaling_above_unity() {
        let mut monitor = LatencyMonitor::new(Profile::Responsive, 100_000_000);
        let s = monitor.update(0, 150_000_000).unwrap();
        assert!(s > 1.0);
    }

    #[test]
    fn updates_within_min_interval_are_ignored() {
        let mut monitor = LatencyMonitor::new(Profile::Gentle, 100_000_000);
        let first = monitor.update(0, 150_000_000).unwrap();
        let second = monitor.update(1, 10_000_000).unwrap(); // 1ns later, way under min interval
        assert_eq!(first, second);
    }

    #[test]
    fn extreme_error_is_rejected_as_out_of_range() {
        let mut monitor = LatencyMonitor::new(Profile::Responsive, 1_000_000);
        let result = monitor.update(0, 10_000_000_000);
        assert!(result.is_err());
    }
}
