//! Ties one outgoing stream's encoder, FEC encoder, and RTCP reporter
//! together (§3 "Session" mirror, §4.1 mirror). Unlike the receiver's
//! `Session`, there is no state machine here: a sender session is either
//! being pushed frames or it isn't, and construction either succeeds with
//! a fully usable session or fails outright (§7 "Configuration error:
//! fail construction; no partial object is exposed").

use std::time::{Duration, Instant};

use bytes::Bytes;

use rtcast_media::Frame;

use crate::encoder::Encoder;
use crate::error::Result;
use crate::fec_encoder::FecEncoder;
use crate::packet_emitter::{emit_repair, emit_sender_report, emit_source};
use crate::rtcp_reporter::RtcpReporter;

pub struct SenderParams {
    pub ssrc: u32,
    pub payload_type: u8,
    pub channels: u16,
    pub max_payload_len: usize,
    /// `Some((K, M))` to protect source packets with block FEC; `None`
    /// mirrors `fec_scheme = none` (§6).
    pub fec: Option<(u16, u16)>,
    pub rtcp_interval: Duration,
}

pub struct SenderSession {
    ssrc: u32,
    encoder: Encoder,
    fec: Option<FecEncoder>,
    reporter: RtcpReporter,
}

impl SenderSession {
    pub fn new(params: SenderParams) -> Result<Self> {
        let fec = match params.fec {
            Some((k, m)) => Some(FecEncoder::new(k, m)?),
            None => None,
        };
        Ok(SenderSession {
            ssrc: params.ssrc,
            encoder: Encoder::new(params.ssrc, params.payload_type, params.channels, params.max_payload_len),
            fec,
            reporter: RtcpReporter::new(params.ssrc, params.rtcp_interval),
        })
    }

    /// Encodes one audio frame into outgoing datagrams: one per RTP source
    /// packet it splits into, plus any repair datagrams a completed FEC
    /// block produces.
    pub fn push_frame(&mut self, frame: &Frame) -> Result<Vec<Bytes>> {
        let packets = self.encoder.encode(frame);
        let mut datagrams = Vec::with_capacity(packets.len());
        for packet in &packets {
            self.reporter.note_packet(packet.payload.len());
            datagrams.push(emit_source(self.ssrc, packet));
            if let Some(fec) = &mut self.fec {
                for (header, symbol) in fec.feed(&packet.payload)? {
                    datagrams.push(emit_repair(self.ssrc, &header, &symbol));
                }
            }
        }
        Ok(datagrams)
    }

    pub fn maybe_report(&mut self, now: Instant, since_ntp_epoch: Duration, rtp_time: u32) -> Option<Bytes> {
        self.reporter
            .maybe_report(now, since_ntp_epoch, rtp_time)
            .map(|report| emit_sender_report(self.ssrc, &report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtcast_media::FrameFlags;

    fn frame(sample_count: usize, channels: u16) -> Frame {
        Frame {
            samples: Bytes::from(vec![0u8; sample_count * channels as usize * 2]),
            sample_count,
            duration_ts: sample_count as u32,
            capture_time: 0,
            flags: FrameFlags::empty(),
        }
    }

    #[test]
    fn without_fec_emits_one_datagram_per_packet() {
        let mut session = SenderSession::new(SenderParams {
            ssrc: 1,
            payload_type: 96,
            channels: 2,
            max_payload_len: 1500,
            fec: None,
            rtcp_interval: Duration::from_secs(5),
        })
        .unwrap();
        let datagrams = session.push_frame(&frame(320, 2)).unwrap();
        assert_eq!(datagrams.len(), 1);
        assert_eq!(datagrams[0][0], 0); // source discriminator
    }

    #[test]
    fn with_fec_emits_repair_datagrams_once_block_fills() {
        let mut session = SenderSession::new(SenderParams {
            ssrc: 1,
            payload_type: 96,
            channels: 2,
            max_payload_len: 1500,
            fec: Some((2, 1)),
            rtcp_interval: Duration::from_secs(5),
        })
        .unwrap();
        assert_eq!(session.push_frame(&frame(160, 2)).unwrap().len(), 1);
        let second = session.push_frame(&frame(160, 2)).unwrap();
        // one source datagram plus one repair datagram for the now-complete block
        assert_eq!(second.len(), 2);
        assert_eq!(second[1][0], 1); // repair discriminator
    }

    #[test]
    fn reporter_emits_after_interval() {
        let mut session = SenderSession::new(SenderParams {
            ssrc: 1,
            payload_type: 96,
            channels: 2,
            max_payload_len: 1500,
            fec: None,
            rtcp_interval: Duration::from_millis(1),
        })
        .unwrap();
        let now = Instant::now();
        session.push_frame(&frame(160, 2)).unwrap();
        let report = session.maybe_report(now, Duration::from_secs(10), 160);
        assert!(report.is_some());
        assert_eq!(report.unwrap()[0], 2); // control discriminator
    }
}
