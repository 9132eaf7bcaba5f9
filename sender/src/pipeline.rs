//! The sender's audio-source boundary (§5 "The sender is symmetric": an
//! audio-source thread pushes frames to a lock-free queue; the network
//! thread encodes and emits). `Source::push` mirrors the receiver's
//! `Sink::pull` (§6 "source collaborator": blocking `push(frame_buffer) ->
//! consumed_count") — the source thread fills a buffer, the network
//! thread's `tick` drains it, encodes, and hands back datagrams.

use std::time::{Duration, Instant};

use bytes::Bytes;

use rtcast_media::{Frame, FrameFlags};

use crate::error::Result;
use crate::session::SenderSession;

/// The local audio-source collaborator (§6): file, device, or API call,
/// consumed through one blocking call per tick.
pub trait Source {
    /// Fills `frame_buffer` with the next batch of interleaved PCM16
    /// sample bytes, returning how many were written. `0` means no data is
    /// currently available (the tick produces no datagrams that cycle).
    fn push(&mut self, frame_buffer: &mut [u8]) -> usize;
}

pub struct SenderPipeline<S> {
    source: S,
    session: SenderSession,
    channels: u16,
    capture_time: u32,
}

impl<S: Source> SenderPipeline<S> {
    pub fn new(source: S, session: SenderSession, channels: u16) -> Self {
        SenderPipeline { source, session, channels, capture_time: 0 }
    }

    /// One network-thread tick: pull a buffer's worth of samples from the
    /// source, encode and FEC-protect them, and return the datagrams ready
    /// to emit. `since_ntp_epoch` is the wall-clock offset for any RTCP
    /// sender report this tick happens to emit; everything else runs off
    /// `now`, the monotonic instant the caller supplies (§5).
    pub fn tick(&mut self, scratch: &mut [u8], now: Instant, since_ntp_epoch: Duration) -> Result<Vec<Bytes>> {
        let filled = self.source.push(scratch);
        if filled == 0 {
            return Ok(vec![]);
        }

        let bytes_per_sample_frame = (self.channels as usize * 2).max(1);
        let sample_count = filled / bytes_per_sample_frame;
        let frame = Frame {
            samples: Bytes::copy_from_slice(&scratch[..sample_count * bytes_per_sample_frame]),
            sample_count,
            duration_ts: sample_count as u32,
            capture_time: self.capture_time,
            flags: FrameFlags::empty(),
        };
        self.capture_time = self.capture_time.wrapping_add(sample_count as u32);

        let mut datagrams = self.session.push_frame(&frame)?;
        if let Some(report) = self.session.maybe_report(now, since_ntp_epoch, frame.capture_time) {
            datagrams.push(report);
        }
        Ok(datagrams)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SenderParams;

    struct FixedSource {
        remaining_ticks: u32,
        fill_len: usize,
    }

    impl Source for FixedSource {
        fn push(&mut self, frame_buffer: &mut [u8]) -> usize {
            if self.remaining_ticks == 0 {
                return 0;
            }
            self.remaining_ticks -= 1;
            frame_buffer[..self.fill_len].fill(0x5A);
            self.fill_len
        }
    }

    fn session() -> SenderSession {
        SenderSession::new(SenderParams {
            ssrc: 1,
            payload_type: 96,
            channels: 2,
            max_payload_len: 1500,
            fec: None,
            rtcp_interval: Duration::from_secs(999),
        })
        .unwrap()
    }

    #[test]
    fn tick_produces_a_source_datagram_when_data_is_available() {
        let mut pipeline = SenderPipeline::new(FixedSource { remaining_ticks: 1, fill_len: 640 }, session(), 2);
        let mut scratch = vec![0u8; 1500];
        let datagrams = pipeline.tick(&mut scratch, Instant::now(), Duration::ZERO).unwrap();
        assert_eq!(datagrams.len(), 1);
    }

    #[test]
    fn tick_produces_nothing_when_source_is_dry() {
        let mut pipeline = SenderPipeline::new(FixedSource { remaining_ticks: 0, fill_len: 0 }, session(), 2);
        let mut scratch = vec![0u8; 1500];
        let datagrams = pipeline.tick(&mut scratch, Instant::now(), Duration::ZERO).unwrap();
        assert!(datagrams.is_empty());
    }

    #[test]
    fn capture_time_advances_by_samples_consumed() {
        let mut pipeline = SenderPipeline::new(FixedSource { remaining_ticks: 2, fill_len: 640 }, session(), 2);
        let mut scratch = vec![0u8; 1500];
        pipeline.tick(&mut scratch, Instant::now(), Duration::ZERO).unwrap();
        assert_eq!(pipeline.capture_time, 160);
    }
}
