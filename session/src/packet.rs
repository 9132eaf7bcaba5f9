//! The datagram envelope and parsed packet kinds (§3 "Packet", §6 "Wire
//! formats"). Every rtcast datagram starts with a one-byte discriminator
//! and a 4-byte SSRC, ahead of the kind-specific body — this is rtcast's
//! own resolution of the open question around repair-packet framing (§9):
//! repair symbols carry no RTP header to hang an SSRC off of, so the
//! router needs an explicit mux point that works uniformly for all three
//! kinds. See DESIGN.md.

use std::time::Instant;

use bytes::{Buf, Bytes};

use rtcast_rtcp::{ReceiverReport, SenderReport};
use rtcast_rtp::{FecHeader, Packet};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discriminator {
    Source = 0,
    Repair = 1,
    Control = 2,
}

impl Discriminator {
    fn from_wire(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(Discriminator::Source),
            1 => Ok(Discriminator::Repair),
            2 => Ok(Discriminator::Control),
            other => Err(Error::UnknownDiscriminator(other)),
        }
    }
}

#[derive(Debug)]
pub enum ControlPacket {
    SenderReport(SenderReport),
    ReceiverReport(ReceiverReport),
}

#[derive(Debug)]
pub enum ParsedPayload {
    Source(Packet),
    Repair { fec: FecHeader, symbol: Bytes },
    Control(ControlPacket),
}

/// A datagram, classified and with its header fields decoded, ready for
/// the router to dispatch by SSRC (§4.1 `parse`).
#[derive(Debug)]
pub struct ParsedPacket {
    pub ssrc: u32,
    pub arrival_time: Instant,
    pub payload: ParsedPayload,
}

const ENVELOPE_LEN: usize = 5;

pub fn parse(datagram: &[u8], arrival_time: Instant) -> Result<ParsedPacket> {
    if datagram.len() < ENVELOPE_LEN {
        return Err(Error::MalformedDatagram("shorter than the mux envelope"));
    }
    let discriminator = Discriminator::from_wire(datagram[0])?;
    let ssrc = u32::from_be_bytes([datagram[1], datagram[2], datagram[3], datagram[4]]);
    let mut body = Bytes::copy_from_slice(&datagram[ENVELOPE_LEN..]);

    let payload = match discriminator {
        Discriminator::Source => {
            use rtcast_util::marshal::Unmarshal;
            ParsedPayload::Source(Packet::unmarshal(&mut body).map_err(|_| {
                Error::MalformedDatagram("source packet failed to unmarshal")
            })?)
        }
        Discriminator::Repair => {
            use rtcast_util::marshal::Unmarshal;
            let fec = FecHeader::unmarshal(&mut body)
                .map_err(|_| Error::MalformedDatagram("FEC header failed to unmarshal"))?;
            let symbol = body.copy_to_bytes(body.remaining());
            ParsedPayload::Repair { fec, symbol }
        }
        Discriminator::Control => {
            use rtcast_util::marshal::Unmarshal;
            let header = rtcast_rtcp::header::Header::unmarshal(&mut body.clone())
                .map_err(|_| Error::MalformedDatagram("RTCP header failed to unmarshal"))?;
            use rtcast_rtcp::header::PacketType;
            let control = match header.packet_type {
                PacketType::SenderReport => {
                    ControlPacket::SenderReport(SenderReport::unmarshal(&mut body).map_err(|_| {
                        Error::MalformedDatagram("sender report failed to unmarshal")
                    })?)
                }
                PacketType::ReceiverReport => ControlPacket::ReceiverReport(
                    ReceiverReport::unmarshal(&mut body)
                        .map_err(|_| Error::MalformedDatagram("receiver report failed to unmarshal"))?,
                ),
            };
            ParsedPayload::Control(control)
        }
    };

    Ok(ParsedPacket { ssrc, arrival_time, payload })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtcast_util::marshal::Marshal;

    #[test]
    fn rejects_short_datagrams() {
        let err = parse(&[0, 0], Instant::now());
        assert!(matches!(err, Err(Error::MalformedDatagram(_))));
    }

    #[test]
    fn rejects_unknown_discriminator() {
        let mut raw = vec![9u8, 0, 0, 0, 1];
        raw.extend_from_slice(&[0; 12]);
        let err = parse(&raw, Instant::now());
        assert!(matches!(err, Err(Error::UnknownDiscriminator(9))));
    }

    #[test]
    fn parses_source_packet_envelope() {
        let packet = Packet {
            header: rtcast_rtp::Header {
                sequence_number: 5,
                timestamp: 100,
                ssrc: 0x1234,
                ..Default::default()
            },
            payload: Bytes::from_static(&[1, 2, 3, 4]),
        };
        let mut raw = vec![0u8];
        raw.extend_from_slice(&0x1234u32.to_be_bytes());
        raw.extend_from_slice(&packet.marshal().unwrap());

        let parsed = parse(&raw, Instant::now()).unwrap();
        assert_eq!(parsed.ssrc, 0x1234);
        assert!(matches!(parsed.payload, ParsedPayload::Source(_)));
    }
}
