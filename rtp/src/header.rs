//! The fixed 12-byte RTP header (RFC 3550 §5.1), as carried by source
//! packets per §6 "Wire formats". rtcast never emits or reads header
//! extensions — the spec's PCM payload carries everything the depacketizer
//! needs in the fixed header plus the marker bit — but it parses past a
//! present extension block so a session doesn't choke on packets from a
//! peer that does use one.

use bytes::Buf;

use rtcast_util::marshal::{Marshal, MarshalResult, MarshalSize, Unmarshal};

use crate::error::Error;

pub(crate) const HEADER_LENGTH: usize = 12;
const VERSION: u8 = 2;

/// Parsed RTP header fields relevant to rtcast. CSRC identifiers and header
/// extensions are consumed (to compute `payload_offset` correctly) but not
/// retained — rtcast routes purely on SSRC.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    pub padding: bool,
    pub marker: bool,
    pub payload_type: u8,
    pub sequence_number: u16,
    pub timestamp: u32,
    pub ssrc: u32,
    pub csrc_count: u8,
}

impl MarshalSize for Header {
    fn marshal_size(&self) -> usize {
        HEADER_LENGTH + self.csrc_count as usize * 4
    }
}

impl Marshal for Header {
    fn marshal_to(&self, buf: &mut [u8]) -> MarshalResult<usize> {
        if buf.len() < self.marshal_size() {
            return Err(Error::HeaderTooShort(buf.len()).into());
        }
        buf[0] = (VERSION << 6) | ((self.padding as u8) << 5) | (self.csrc_count & 0x0F);
        buf[1] = ((self.marker as u8) << 7) | (self.payload_type & 0x7F);
        buf[2..4].copy_from_slice(&self.sequence_number.to_be_bytes());
        buf[4..8].copy_from_slice(&self.timestamp.to_be_bytes());
        buf[8..12].copy_from_slice(&self.ssrc.to_be_bytes());
        Ok(self.marshal_size())
    }
}

impl Unmarshal for Header {
    fn unmarshal<B: Buf>(buf: &mut B) -> MarshalResult<Self> {
        if buf.remaining() < HEADER_LENGTH {
            return Err(Error::HeaderTooShort(buf.remaining()).into());
        }
        let b0 = buf.get_u8();
        let version = b0 >> 6;
        if version != VERSION {
            return Err(Error::UnsupportedVersion(version).into());
        }
        let padding = (b0 >> 5) & 0x1 != 0;
        let has_extension = (b0 >> 4) & 0x1 != 0;
        let csrc_count = b0 & 0x0F;

        let b1 = buf.get_u8();
        let marker = (b1 >> 7) != 0;
        let payload_type = b1 & 0x7F;

        let sequence_number = buf.get_u16();
        let timestamp = buf.get_u32();
        let ssrc = buf.get_u32();

        let csrc_bytes = csrc_count as usize * 4;
        if buf.remaining() < csrc_bytes {
            return Err(Error::CsrcOverrun.into());
        }
        buf.advance(csrc_bytes);

        if has_extension {
            if buf.remaining() < 4 {
                return Err(Error::ExtensionHeaderMissing.into());
            }
            let _profile = buf.get_u16();
            let ext_len_words = buf.get_u16() as usize;
            let ext_len = ext_len_words * 4;
            if buf.remaining() < ext_len {
                return Err(Error::ExtensionOverrun.into());
            }
            buf.advance(ext_len);
        }

        Ok(Header {
            padding,
            marker,
            payload_type,
            sequence_number,
            timestamp,
            ssrc,
            csrc_count,
        })
    }
}

impl Header {
    /// `true` if trailing padding bytes (RFC 3550 §5.1) need to be trimmed
    /// from the payload before handing it to the depacketizer. The padding
    /// count itself lives in the payload's last byte, so it's resolved at
    /// the packet level rather than here.
    pub fn has_padding(&self) -> bool {
        self.padding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn sample_header() -> Header {
        Header {
            padding: false,
            marker: true,
            payload_type: 96,
            sequence_number: 4242,
            timestamp: 0x1234_5678,
            ssrc: 0xdead_beef,
            csrc_count: 0,
        }
    }

    #[test]
    fn roundtrips_through_marshal_unmarshal() {
        let header = sample_header();
        let bytes = header.marshal().unwrap();
        let mut cursor = bytes.clone();
        let parsed = Header::unmarshal(&mut cursor).unwrap();
        assert_eq!(parsed, header);
    }

    fn downcast(err: rtcast_util::marshal::MarshalResult<Header>) -> Error {
        *err.unwrap_err().downcast::<Error>().expect("expected rtp::Error")
    }

    #[test]
    fn rejects_short_buffers() {
        let short = Bytes::from_static(&[0x80, 0x60, 0x00]);
        let mut cursor = short;
        assert!(matches!(
            downcast(Header::unmarshal(&mut cursor)),
            Error::HeaderTooShort(_)
        ));
    }

    #[test]
    fn rejects_wrong_version() {
        let mut raw = sample_header().marshal().unwrap().to_vec();
        raw[0] = (1 << 6) | (raw[0] & 0x3F);
        let mut cursor = Bytes::from(raw);
        assert!(matches!(
            downcast(Header::unmarshal(&mut cursor)),
            Error::UnsupportedVersion(1)
        ));
    }
}
