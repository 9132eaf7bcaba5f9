//! Wraps encoded packets, repair symbols, and control reports into the
//! same discriminator-plus-SSRC envelope the receiver's router demuxes on
//! (mirrors `rtcast_session::packet`'s wire format, §6, §9). The sender
//! crate doesn't depend on `rtcast-session` — that crate is receiver-only
//! scaffolding — so the five-byte envelope is reproduced here rather than
//! shared, matching byte-for-byte.

use bytes::{Bytes, BytesMut};

use rtcast_rtcp::{ReceiverReport, SenderReport};
use rtcast_rtp::{FecHeader, Packet};
use rtcast_util::marshal::Marshal;

const DISCRIMINATOR_SOURCE: u8 = 0;
const DISCRIMINATOR_REPAIR: u8 = 1;
const DISCRIMINATOR_CONTROL: u8 = 2;

fn envelope(discriminator: u8, ssrc: u32, body_len: usize) -> BytesMut {
    let mut buf = BytesMut::with_capacity(5 + body_len);
    buf.extend_from_slice(&[discriminator]);
    buf.extend_from_slice(&ssrc.to_be_bytes());
    buf
}

pub fn emit_source(ssrc: u32, packet: &Packet) -> Bytes {
    let body = packet.marshal().expect("RTP packet always marshals");
    let mut buf = envelope(DISCRIMINATOR_SOURCE, ssrc, body.len());
    buf.extend_from_slice(&body);
    buf.freeze()
}

pub fn emit_repair(ssrc: u32, fec: &FecHeader, symbol: &Bytes) -> Bytes {
    let header_bytes = fec.marshal().expect("FEC header always marshals");
    let mut buf = envelope(DISCRIMINATOR_REPAIR, ssrc, header_bytes.len() + symbol.len());
    buf.extend_from_slice(&header_bytes);
    buf.extend_from_slice(symbol);
    buf.freeze()
}

pub fn emit_sender_report(ssrc: u32, report: &SenderReport) -> Bytes {
    let body = report.marshal().expect("sender report always marshals");
    let mut buf = envelope(DISCRIMINATOR_CONTROL, ssrc, body.len());
    buf.extend_from_slice(&body);
    buf.freeze()
}

pub fn emit_receiver_report(ssrc: u32, report: &ReceiverReport) -> Bytes {
    let body = report.marshal().expect("receiver report always marshals");
    let mut buf = envelope(DISCRIMINATOR_CONTROL, ssrc, body.len());
    buf.extend_from_slice(&body);
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtcast_rtp::{FecScheme, Header};

    #[test]
    fn source_envelope_has_discriminator_and_ssrc() {
        let packet = Packet { header: Header { ssrc: 0x42, ..Default::default() }, payload: Bytes::from_static(&[1, 2]) };
        let datagram = emit_source(0x42, &packet);
        assert_eq!(datagram[0], DISCRIMINATOR_SOURCE);
        assert_eq!(u32::from_be_bytes(datagram[1..5].try_into().unwrap()), 0x42);
    }

    #[test]
    fn repair_envelope_carries_header_then_symbol() {
        let fec = FecHeader {
            source_block_number: 1,
            repair_symbol_id: 20,
            source_block_length: 20,
            repair_block_length: 10,
            scheme: FecScheme::ReedSolomonGf8,
        };
        let symbol = Bytes::from_static(&[9, 9, 9]);
        let datagram = emit_repair(99, &fec, &symbol);
        assert_eq!(datagram[0], DISCRIMINATOR_REPAIR);
        assert!(datagram.ends_with(&[9, 9, 9]));
    }
}
