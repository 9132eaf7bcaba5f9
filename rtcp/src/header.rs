//! The 4-byte header common to every RTCP packet (RFC 3550 §6.1), grounded
//! on the teacher's `rtcp::header` module. rtcast only speaks sender and
//! receiver reports, so `PacketType` is trimmed to those two.

use bytes::Buf;

use rtcast_util::marshal::{Marshal, MarshalResult, MarshalSize, Unmarshal};

use crate::error::Error;

pub const HEADER_LENGTH: usize = 4;
const VERSION: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    SenderReport,
    ReceiverReport,
}

impl PacketType {
    fn to_wire(self) -> u8 {
        match self {
            PacketType::SenderReport => 200,
            PacketType::ReceiverReport => 201,
        }
    }

    fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            200 => Some(PacketType::SenderReport),
            201 => Some(PacketType::ReceiverReport),
            _ => None,
        }
    }
}

/// Common RTCP header. `report_count` is always 0 or 1 for rtcast: one
/// report block per session's control packet, never the batched multi-SSRC
/// reports RFC 3550 allows for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub packet_type: PacketType,
    pub report_count: u8,
    pub length_words: u16,
}

impl MarshalSize for Header {
    fn marshal_size(&self) -> usize {
        HEADER_LENGTH
    }
}

impl Marshal for Header {
    fn marshal_to(&self, buf: &mut [u8]) -> MarshalResult<usize> {
        if buf.len() < HEADER_LENGTH {
            return Err(Error::PacketTooShort.into());
        }
        buf[0] = (VERSION << 6) | (self.report_count & 0x1F);
        buf[1] = self.packet_type.to_wire();
        buf[2..4].copy_from_slice(&self.length_words.to_be_bytes());
        Ok(HEADER_LENGTH)
    }
}

impl Unmarshal for Header {
    fn unmarshal<B: Buf>(buf: &mut B) -> MarshalResult<Self> {
        if buf.remaining() < HEADER_LENGTH {
            return Err(Error::PacketTooShort.into());
        }
        let b0 = buf.get_u8();
        let version = b0 >> 6;
        if version != VERSION {
            return Err(Error::BadVersion(version).into());
        }
        let report_count = b0 & 0x1F;
        let type_byte = buf.get_u8();
        let packet_type =
            PacketType::from_wire(type_byte).ok_or(Error::UnknownPacketType(type_byte))?;
        let length_words = buf.get_u16();
        Ok(Header {
            packet_type,
            report_count,
            length_words,
        })
    }
}
