//! Kills silent or badly-interpolated sessions (§4.7). Driven entirely by
//! the pipeline thread's notion of "now" (§5 "Timeouts": checked on every
//! sink pull, never by a timer of its own).

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Ring of recent `pull_frame` outcomes, used to compute the rolling
/// interpolated-frame ratio that drives `T_frames`.
const FRAME_HISTORY: usize = 256;

pub struct Watchdog {
    no_packets_threshold: Duration,
    broken_frames_ratio: f64,
    last_packet_at: Option<Instant>,
    frame_history: VecDeque<bool>,
}

impl Watchdog {
    pub fn new(watchdog_no_packets_ns: u64, watchdog_broken_frames_ratio: f64) -> Self {
        Watchdog {
            no_packets_threshold: Duration::from_nanos(watchdog_no_packets_ns),
            broken_frames_ratio: watchdog_broken_frames_ratio,
            last_packet_at: None,
            frame_history: VecDeque::with_capacity(FRAME_HISTORY),
        }
    }

    pub fn note_packet(&mut self, now: Instant) {
        self.last_packet_at = Some(now);
    }

    pub fn note_frame(&mut self, interpolated: bool) {
        if self.frame_history.len() == FRAME_HISTORY {
            self.frame_history.pop_front();
        }
        self.frame_history.push_back(interpolated);
    }

    fn interpolated_ratio(&self) -> f64 {
        if self.frame_history.is_empty() {
            return 0.0;
        }
        let interpolated = self.frame_history.iter().filter(|&&i| i).count();
        interpolated as f64 / self.frame_history.len() as f64
    }

    /// `true` once either `T_audio` or `T_frames` has been exceeded.
    pub fn is_broken(&self, now: Instant) -> bool {
        let audio_stalled = match self.last_packet_at {
            Some(last) => now.saturating_duration_since(last) >= self.no_packets_threshold,
            None => false,
        };
        let frames_broken =
            self.frame_history.len() == FRAME_HISTORY && self.interpolated_ratio() > self.broken_frames_ratio;
        audio_stalled || frames_broken
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_packets_for_threshold_marks_broken() {
        let mut watchdog = Watchdog::new(1_000_000_000, 0.5);
        let t0 = Instant::now();
        watchdog.note_packet(t0);
        assert!(!watchdog.is_broken(t0 + Duration::from_millis(500)));
        assert!(watchdog.is_broken(t0 + Duration::from_millis(1_500)));
    }

    #[test]
    fn sustained_interpolation_marks_broken() {
        let mut watchdog = Watchdog::new(10_000_000_000, 0.5);
        let t0 = Instant::now();
        watchdog.note_packet(t0);
        for _ in 0..FRAME_HISTORY {
            watchdog.note_frame(true);
        }
        assert!(watchdog.is_broken(t0));
    }

    #[test]
    fn occasional_interpolation_does_not_trip() {
        let mut watchdog = Watchdog::new(10_000_000_000, 0.5);
        let t0 = Instant::now();
        watchdog.note_packet(t0);
        for i in 0..FRAME_HISTORY {
            watchdog.note_frame(i % 10 == 0);
        }
        assert!(!watchdog.is_broken(t0));
    }
}
