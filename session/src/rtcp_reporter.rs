//! Receiver-side half of the control channel (§4.1 "Control channel":
//! "produces receiver reports with observed loss and jitter"). Tracks
//! enough per-session state to fill in a `ReceiverReport` on request: the
//! highest sequence number seen, how many of the expected packets in the
//! interval since the last report actually arrived, and RFC 3550 §6.4.1's
//! interarrival jitter estimate.
//!
//! Sequence numbers are tracked unextended (no 16-bit wraparound cycle
//! count): a session living long enough to wrap its sequence space would
//! under-report cumulative loss. Acceptable for rtcast's target session
//! lifetimes; see DESIGN.md.

use std::time::Instant;

use rtcast_rtcp::ReceiverReport;
use rtcast_util::wrap::wrapping_diff16;

pub struct ReceiverReportTracker {
    sample_rate: u32,
    epoch: Instant,
    first_sequence_number: Option<u16>,
    highest_sequence_number: u16,
    received_total: u64,
    expected_at_last_report: i64,
    received_at_last_report: u64,
    jitter: f64,
    last_arrival: Option<(Instant, u32)>,
}

impl ReceiverReportTracker {
    pub fn new(sample_rate: u32, now: Instant) -> Self {
        ReceiverReportTracker {
            sample_rate: sample_rate.max(1),
            epoch: now,
            first_sequence_number: None,
            highest_sequence_number: 0,
            received_total: 0,
            expected_at_last_report: 0,
            received_at_last_report: 0,
            jitter: 0.0,
            last_arrival: None,
        }
    }

    pub fn note_source_packet(&mut self, sequence_number: u16, timestamp: u32, arrival: Instant) {
        match self.first_sequence_number {
            None => {
                self.first_sequence_number = Some(sequence_number);
                self.highest_sequence_number = sequence_number;
            }
            Some(_) if wrapping_diff16(sequence_number, self.highest_sequence_number) > 0 => {
                self.highest_sequence_number = sequence_number;
            }
            _ => {}
        }
        self.received_total += 1;

        let arrival_rtp_units = self.to_rtp_units(arrival);
        if let Some((last_instant, last_ts)) = self.last_arrival {
            let last_rtp_units = self.to_rtp_units(last_instant);
            let d = (arrival_rtp_units - last_rtp_units) - (timestamp as f64 - last_ts as f64);
            self.jitter += (d.abs() - self.jitter) / 16.0;
        }
        self.last_arrival = Some((arrival, timestamp));
    }

    fn to_rtp_units(&self, instant: Instant) -> f64 {
        let ns = instant.saturating_duration_since(self.epoch).as_nanos() as f64;
        ns * self.sample_rate as f64 / 1_000_000_000.0
    }

    /// Builds a report covering the interval since the last call (or since
    /// construction, for the first one), then resets the interval counters.
    pub fn build_report(&mut self, ssrc: u32, last_sr: u32, delay_since_last_sr: u32) -> ReceiverReport {
        let Some(first_seq) = self.first_sequence_number else {
            return ReceiverReport { ssrc, last_sr, delay_since_last_sr, ..Default::default() };
        };

        let expected_total = wrapping_diff16(self.highest_sequence_number, first_seq) as i64 + 1;
        let expected_interval = (expected_total - self.expected_at_last_report).max(0);
        let received_interval = self.received_total.saturating_sub(self.received_at_last_report) as i64;
        let lost_interval = (expected_interval - received_interval).max(0);

        let fraction_lost = if expected_interval > 0 {
            ((lost_interval * 256) / expected_interval).clamp(0, 255) as u8
        } else {
            0
        };
        let cumulative_lost = (expected_total - self.received_total as i64).max(0) as u32;

        self.expected_at_last_report = expected_total;
        self.received_at_last_report = self.received_total;

        ReceiverReport {
            ssrc,
            fraction_lost,
            cumulative_lost,
            highest_sequence_number: self.highest_sequence_number as u32,
            jitter: self.jitter as u32,
            last_sr,
            delay_since_last_sr,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn no_loss_reports_zero_fraction_lost() {
        let start = Instant::now();
        let mut tracker = ReceiverReportTracker::new(8000, start);
        for seq in 0..10u16 {
            tracker.note_source_packet(seq, seq as u32 * 160, start + Duration::from_millis(seq as u64 * 20));
        }
        let report = tracker.build_report(1, 0, 0);
        assert_eq!(report.fraction_lost, 0);
        assert_eq!(report.cumulative_lost, 0);
        assert_eq!(report.highest_sequence_number, 9);
    }

    #[test]
    fn gaps_in_sequence_count_as_loss() {
        let start = Instant::now();
        let mut tracker = ReceiverReportTracker::new(8000, start);
        for seq in [0u16, 1, 2, 5, 6] {
            tracker.note_source_packet(seq, seq as u32 * 160, start + Duration::from_millis(seq as u64 * 20));
        }
        let report = tracker.build_report(1, 0, 0);
        assert_eq!(report.cumulative_lost, 2); // seq 3, 4 never arrived
    }

    #[test]
    fn successive_reports_cover_disjoint_intervals() {
        let start = Instant::now();
        let mut tracker = ReceiverReportTracker::new(8000, start);
        for seq in 0..5u16 {
            tracker.note_source_packet(seq, seq as u32 * 160, start + Duration::from_millis(seq as u64 * 20));
        }
        let first = tracker.build_report(1, 0, 0);
        assert_eq!(first.cumulative_lost, 0);

        for seq in [6u16, 7] {
            tracker.note_source_packet(seq, seq as u32 * 160, start + Duration::from_millis(seq as u64 * 20));
        }
        let second = tracker.build_report(1, 0, 0);
        // interval since last report expected seq 5..=7 (3), received 2 -> 1 lost
        assert_eq!(second.fraction_lost, (1 * 256) / 3);
    }
}
