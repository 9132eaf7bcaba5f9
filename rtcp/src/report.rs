//! Sender and receiver reports (RFC 3550 §6.4), trimmed to the fields
//! rtcast's control channel actually uses (§6 "Wire formats"): the
//! sender's NTP-epoch/RTP-timestamp pair for clock correlation, and the
//! receiver's loss/jitter observations plus the LSR/DLSR pair a sender
//! uses to estimate round-trip time. Grounded on the teacher's
//! `sender_report`/`receiver_report` modules, collapsed from "zero or more
//! report blocks" to exactly one: a session is one stream, so there is
//! never more than one peer to report on.

use bytes::Buf;

use rtcast_util::marshal::{Marshal, MarshalResult, MarshalSize, Unmarshal};

use crate::error::Error;
use crate::header::{Header, PacketType, HEADER_LENGTH};

const SR_BODY_LENGTH: usize = 24;
const RR_BODY_LENGTH: usize = 24;

/// Sent by the sender to correlate its RTP timestamp domain with wall-clock
/// NTP time, and to report how much it has sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SenderReport {
    pub ssrc: u32,
    /// 64-bit fixed-point NTP timestamp (§6).
    pub ntp_time: u64,
    pub rtp_time: u32,
    pub packet_count: u32,
    pub octet_count: u32,
}

impl MarshalSize for SenderReport {
    fn marshal_size(&self) -> usize {
        HEADER_LENGTH + SR_BODY_LENGTH
    }
}

impl Marshal for SenderReport {
    fn marshal_to(&self, buf: &mut [u8]) -> MarshalResult<usize> {
        if buf.len() < self.marshal_size() {
            return Err(Error::PacketTooShort.into());
        }
        let header = Header {
            packet_type: PacketType::SenderReport,
            report_count: 0,
            length_words: (self.marshal_size() / 4 - 1) as u16,
        };
        header.marshal_to(buf)?;
        let body = &mut buf[HEADER_LENGTH..];
        body[0..4].copy_from_slice(&self.ssrc.to_be_bytes());
        body[4..12].copy_from_slice(&self.ntp_time.to_be_bytes());
        body[12..16].copy_from_slice(&self.rtp_time.to_be_bytes());
        body[16..20].copy_from_slice(&self.packet_count.to_be_bytes());
        body[20..24].copy_from_slice(&self.octet_count.to_be_bytes());
        Ok(self.marshal_size())
    }
}

impl Unmarshal for SenderReport {
    fn unmarshal<B: Buf>(buf: &mut B) -> MarshalResult<Self> {
        if buf.remaining() < HEADER_LENGTH + SR_BODY_LENGTH {
            return Err(Error::PacketTooShort.into());
        }
        let header = Header::unmarshal(buf)?;
        if header.packet_type != PacketType::SenderReport {
            return Err(Error::WrongType { expected: 200, actual: 201 }.into());
        }
        let ssrc = buf.get_u32();
        let ntp_time = buf.get_u64();
        let rtp_time = buf.get_u32();
        let packet_count = buf.get_u32();
        let octet_count = buf.get_u32();
        Ok(SenderReport {
            ssrc,
            ntp_time,
            rtp_time,
            packet_count,
            octet_count,
        })
    }
}

/// Sent by the receiver back to the sender: observed loss, jitter, and the
/// LSR/DLSR pair the sender uses to derive round-trip time (§6, §4.6's
/// `s` is steered by latency derived locally, but RTT informs config/
/// diagnostics, not the control loop itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReceiverReport {
    pub ssrc: u32,
    pub fraction_lost: u8,
    pub cumulative_lost: u32,
    pub highest_sequence_number: u32,
    pub jitter: u32,
    /// Middle 32 bits of the NTP timestamp from the last SR received.
    pub last_sr: u32,
    /// Delay, in 1/65536 second units, since that SR was received.
    pub delay_since_last_sr: u32,
}

impl MarshalSize for ReceiverReport {
    fn marshal_size(&self) -> usize {
        HEADER_LENGTH + RR_BODY_LENGTH
    }
}

impl Marshal for ReceiverReport {
    fn marshal_to(&self, buf: &mut [u8]) -> MarshalResult<usize> {
        if buf.len() < self.marshal_size() {
            return Err(Error::PacketTooShort.into());
        }
        let header = Header {
            packet_type: PacketType::ReceiverReport,
            report_count: 1,
            length_words: (self.marshal_size() / 4 - 1) as u16,
        };
        header.marshal_to(buf)?;
        let body = &mut buf[HEADER_LENGTH..];
        body[0..4].copy_from_slice(&self.ssrc.to_be_bytes());
        body[4] = self.fraction_lost;
        let lost_bytes = self.cumulative_lost.to_be_bytes();
        body[5..8].copy_from_slice(&lost_bytes[1..4]);
        body[8..12].copy_from_slice(&self.highest_sequence_number.to_be_bytes());
        body[12..16].copy_from_slice(&self.jitter.to_be_bytes());
        body[16..20].copy_from_slice(&self.last_sr.to_be_bytes());
        body[20..24].copy_from_slice(&self.delay_since_last_sr.to_be_bytes());
        Ok(self.marshal_size())
    }
}

impl Unmarshal for ReceiverReport {
    fn unmarshal<B: Buf>(buf: &mut B) -> MarshalResult<Self> {
        if buf.remaining() < HEADER_LENGTH + RR_BODY_LENGTH {
            return Err(Error::PacketTooShort.into());
        }
        let header = Header::unmarshal(buf)?;
        if header.packet_type != PacketType::ReceiverReport {
            return Err(Error::WrongType { expected: 201, actual: 200 }.into());
        }
        let ssrc = buf.get_u32();
        let fraction_lost = buf.get_u8();
        let mut lost_bytes = [0u8; 4];
        lost_bytes[1] = buf.get_u8();
        lost_bytes[2] = buf.get_u8();
        lost_bytes[3] = buf.get_u8();
        let cumulative_lost = u32::from_be_bytes(lost_bytes);
        let highest_sequence_number = buf.get_u32();
        let jitter = buf.get_u32();
        let last_sr = buf.get_u32();
        let delay_since_last_sr = buf.get_u32();
        Ok(ReceiverReport {
            ssrc,
            fraction_lost,
            cumulative_lost,
            highest_sequence_number,
            jitter,
            last_sr,
            delay_since_last_sr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_report_roundtrips() {
        let report = SenderReport {
            ssrc: 0xaabb_ccdd,
            ntp_time: 0x1111_2222_3333_4444,
            rtp_time: 9000,
            packet_count: 500,
            octet_count: 0,
        };
        let bytes = report.marshal().unwrap();
        let mut cursor = bytes.clone();
        let parsed = SenderReport::unmarshal(&mut cursor).unwrap();
        assert_eq!(parsed.ssrc, report.ssrc);
        assert_eq!(parsed.ntp_time, report.ntp_time);
        assert_eq!(parsed.rtp_time, report.rtp_time);
        assert_eq!(parsed.packet_count, report.packet_count);
    }

    #[test]
    fn receiver_report_roundtrips() {
        let report = ReceiverReport {
            ssrc: 42,
            fraction_lost: 3,
            cumulative_lost: 120,
            highest_sequence_number: 65600,
            jitter: 17,
            last_sr: 0xdead_beef,
            delay_since_last_sr: 4096,
        };
        let bytes = report.marshal().unwrap();
        let mut cursor = bytes.clone();
        let parsed = ReceiverReport::unmarshal(&mut cursor).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn rejects_wrong_report_type() {
        let sr = SenderReport::default();
        let bytes = sr.marshal().unwrap();
        assert!(ReceiverReport::unmarshal(&mut bytes.clone()).is_err());
    }
}
