//! A full RTP packet: fixed header plus opaque payload bytes (§3, §6).
//! rtcast doesn't interpret CSRC lists or header extensions past parsing
//! them out of the way, so `Packet` only carries what the rest of the
//! pipeline actually needs: the header and the payload slice.

use std::fmt;

use bytes::{Buf, Bytes};

use rtcast_util::marshal::{Marshal, MarshalResult, MarshalSize, Unmarshal};

use crate::header::Header;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Packet {
    pub header: Header,
    pub payload: Bytes,
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rtp packet: seq={} ts={} ssrc={:x} marker={} payload_len={}",
            self.header.sequence_number,
            self.header.timestamp,
            self.header.ssrc,
            self.header.marker,
            self.payload.len()
        )
    }
}

impl MarshalSize for Packet {
    fn marshal_size(&self) -> usize {
        self.header.marshal_size() + self.payload.len()
    }
}

impl Marshal for Packet {
    fn marshal_to(&self, buf: &mut [u8]) -> MarshalResult<usize> {
        let header_len = self.header.marshal_to(buf)?;
        let end = header_len + self.payload.len();
        buf[header_len..end].copy_from_slice(&self.payload);
        Ok(end)
    }
}

impl Unmarshal for Packet {
    fn unmarshal<B: Buf>(buf: &mut B) -> MarshalResult<Self> {
        let mut raw = buf.copy_to_bytes(buf.remaining());
        let header = Header::unmarshal(&mut raw.clone())?;
        let payload = raw.split_off(header.marshal_size());
        Ok(Packet { header, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_marshal_unmarshal() {
        let packet = Packet {
            header: Header {
                padding: false,
                marker: false,
                payload_type: 10,
                sequence_number: 7,
                timestamp: 1000,
                ssrc: 0x1122_3344,
                csrc_count: 0,
            },
            payload: Bytes::from_static(&[1, 2, 3, 4]),
        };
        let bytes = packet.marshal().unwrap();
        let mut cursor = bytes.clone();
        let parsed = Packet::unmarshal(&mut cursor).unwrap();
        assert_eq!(parsed, packet);
    }

    #[test]
    fn empty_payload_roundtrips() {
        let packet = Packet {
            header: Header::default(),
            payload: Bytes::new(),
        };
        let bytes = packet.marshal().unwrap();
        let parsed = Packet::unmarshal(&mut bytes.clone()).unwrap();
        assert_eq!(parsed.payload.len(), 0);
    }
}
