//! The FEC framing header carried by repair packets (§6 "Wire formats",
//! §3 "FEC Block"). Resolves the spec's Open Question on field naming: the
//! original sender implementation (`roc_packet::FEC`) names these
//! `blknum`/`source_block_length`/`repair_symbol_id`, so this header keeps
//! that convention (`source_block_number` for `blknum`) rather than the
//! sibling `encoding_symbol_id` spelling seen elsewhere in that codebase —
//! see DESIGN.md.
//!
//! Layout (10 bytes, all integers network byte order):
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |      source_block_number     |         repair_symbol_id     |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! | source_block_length (K)      |  repair_block_length (M)     |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |  scheme_id    |   reserved    |
//! +-+-+-+-+-+-+-+-+
//! ```

use bytes::Buf;

use rtcast_util::marshal::{Marshal, MarshalResult, MarshalSize, Unmarshal};

use crate::error::Error;

pub(crate) const FEC_HEADER_LENGTH: usize = 10;

/// FEC scheme identifiers on the wire. `None` never appears in a repair
/// packet (a session running without FEC simply never emits them) but is
/// kept here so the configuration enum (§6) and the wire enum share a
/// single source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FecScheme {
    ReedSolomonGf8,
    ReedSolomonGf2m,
    LdpcStaircase,
}

impl FecScheme {
    fn to_wire(self) -> u8 {
        match self {
            FecScheme::ReedSolomonGf8 => 1,
            FecScheme::ReedSolomonGf2m => 2,
            FecScheme::LdpcStaircase => 3,
        }
    }

    fn from_wire(byte: u8) -> Result<Self, Error> {
        match byte {
            1 => Ok(FecScheme::ReedSolomonGf8),
            2 => Ok(FecScheme::ReedSolomonGf2m),
            3 => Ok(FecScheme::LdpcStaircase),
            other => Err(Error::UnknownFecScheme(other)),
        }
    }
}

/// FEC framing header, as carried by repair packets ahead of the repair
/// symbol itself (§3 "FEC Block", §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FecHeader {
    pub source_block_number: u16,
    pub repair_symbol_id: u16,
    pub source_block_length: u16,
    pub repair_block_length: u16,
    pub scheme: FecScheme,
}

impl MarshalSize for FecHeader {
    fn marshal_size(&self) -> usize {
        FEC_HEADER_LENGTH
    }
}

impl Marshal for FecHeader {
    fn marshal_to(&self, buf: &mut [u8]) -> MarshalResult<usize> {
        if buf.len() < FEC_HEADER_LENGTH {
            return Err(Error::FecHeaderTooShort(buf.len()).into());
        }
        buf[0..2].copy_from_slice(&self.source_block_number.to_be_bytes());
        buf[2..4].copy_from_slice(&self.repair_symbol_id.to_be_bytes());
        buf[4..6].copy_from_slice(&self.source_block_length.to_be_bytes());
        buf[6..8].copy_from_slice(&self.repair_block_length.to_be_bytes());
        buf[8] = self.scheme.to_wire();
        buf[9] = 0;
        Ok(FEC_HEADER_LENGTH)
    }
}

impl Unmarshal for FecHeader {
    fn unmarshal<B: Buf>(buf: &mut B) -> MarshalResult<Self> {
        if buf.remaining() < FEC_HEADER_LENGTH {
            return Err(Error::FecHeaderTooShort(buf.remaining()).into());
        }
        let source_block_number = buf.get_u16();
        let repair_symbol_id = buf.get_u16();
        let source_block_length = buf.get_u16();
        let repair_block_length = buf.get_u16();
        let scheme = FecScheme::from_wire(buf.get_u8())?;
        let _reserved = buf.get_u8();
        Ok(FecHeader {
            source_block_number,
            repair_symbol_id,
            source_block_length,
            repair_block_length,
            scheme,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_marshal_unmarshal() {
        let header = FecHeader {
            source_block_number: 7,
            repair_symbol_id: 22,
            source_block_length: 20,
            repair_block_length: 10,
            scheme: FecScheme::ReedSolomonGf8,
        };
        let bytes = header.marshal().unwrap();
        let mut cursor = bytes.clone();
        let parsed = FecHeader::unmarshal(&mut cursor).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn rejects_unknown_scheme_id() {
        let header = FecHeader {
            source_block_number: 0,
            repair_symbol_id: 0,
            source_block_length: 1,
            repair_block_length: 1,
            scheme: FecScheme::LdpcStaircase,
        };
        let mut raw = header.marshal().unwrap().to_vec();
        raw[8] = 0xFF;
        let mut cursor = bytes::Bytes::from(raw);
        assert!(FecHeader::unmarshal(&mut cursor).is_err());
    }
}
