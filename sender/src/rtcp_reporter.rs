//! Builds periodic sender reports for the control channel (§6 "Control
//! packets", §4.1 mirror). Tracks how much has been sent so far and gates
//! emission on a caller-supplied interval; the wall-clock/NTP conversion
//! is a pure function so it never needs to call out to the OS clock
//! itself (same discipline as `rtcast_util::clock::Clock`, §5).

use std::time::{Duration, Instant};

use rtcast_rtcp::SenderReport;

/// Converts a duration since the NTP epoch into RFC 3550's 32.32
/// fixed-point format: whole seconds in the high 32 bits, the fractional
/// remainder scaled to 2^32ths in the low 32 bits.
pub fn to_ntp_timestamp(since_ntp_epoch: Duration) -> u64 {
    let seconds = since_ntp_epoch.as_secs();
    let frac = (since_ntp_epoch.subsec_nanos() as u64 * (1u64 << 32)) / 1_000_000_000;
    (seconds << 32) | (frac & 0xFFFF_FFFF)
}

pub struct RtcpReporter {
    ssrc: u32,
    interval: Duration,
    last_report_at: Option<Instant>,
    packet_count: u32,
    octet_count: u32,
}

impl RtcpReporter {
    pub fn new(ssrc: u32, interval: Duration) -> Self {
        RtcpReporter {
            ssrc,
            interval,
            last_report_at: None,
            packet_count: 0,
            octet_count: 0,
        }
    }

    pub fn note_packet(&mut self, payload_len: usize) {
        self.packet_count = self.packet_count.wrapping_add(1);
        self.octet_count = self.octet_count.wrapping_add(payload_len as u32);
    }

    /// Emits a sender report if `interval` has elapsed since the last one.
    /// `rtp_time` correlates the report to the sender's stream-timestamp
    /// domain at the moment of emission (§6).
    pub fn maybe_report(&mut self, now: Instant, since_ntp_epoch: Duration, rtp_time: u32) -> Option<SenderReport> {
        if self.last_report_at.is_some_and(|last| now.duration_since(last) < self.interval) {
            return None;
        }
        self.last_report_at = Some(now);
        Some(SenderReport {
            ssrc: self.ssrc,
            ntp_time: to_ntp_timestamp(since_ntp_epoch),
            rtp_time,
            packet_count: self.packet_count,
            octet_count: self.octet_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ntp_timestamp_packs_seconds_in_high_bits() {
        let ts = to_ntp_timestamp(Duration::from_secs(100));
        assert_eq!(ts >> 32, 100);
    }

    #[test]
    fn reports_gated_by_interval() {
        let mut reporter = RtcpReporter::new(1, Duration::from_millis(100));
        let start = Instant::now();
        reporter.note_packet(160);
        assert!(reporter.maybe_report(start, Duration::from_secs(1), 0).is_some());
        assert!(reporter.maybe_report(start, Duration::from_secs(1), 0).is_none());
        let later = start + Duration::from_millis(150);
        assert!(reporter.maybe_report(later, Duration::from_secs(1), 160).is_some());
    }

    #[test]
    fn accumulates_packet_and_octet_counts() {
        let mut reporter = RtcpReporter::new(1, Duration::from_millis(1));
        reporter.note_packet(100);
        reporter.note_packet(200);
        let report = reporter.maybe_report(Instant::now(), Duration::ZERO, 0).unwrap();
        assert_eq!(report.packet_count, 2);
        assert_eq!(report.octet_count, 300);
    }
}
