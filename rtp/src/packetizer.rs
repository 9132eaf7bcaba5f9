//! Conversion between RTP payload bytes and PCM sample bytes (§4.4
//! "Depacketiser", wire format per §6). rtcast's payload format is fixed —
//! 16-bit signed samples, network byte order, channels interleaved — so
//! unlike the teacher's `Depacketizer`, which dispatches on codec-specific
//! framing (OBU headers, NAL start codes), there's exactly one shape to
//! depacketize and the trait exists mainly to keep the pipeline crate from
//! depending on the wire layout directly.
//!
//! Sample bytes cross the host/network boundary here: everywhere else in
//! rtcast (the resampler, the mixer, `Frame::samples`) a 16-bit sample is
//! two bytes in the host's native order, exactly as `Frame`'s own doc
//! comment promises ("the wire's network byte order is undone by the
//! depacketiser"). Only this module ever swaps it to or from big-endian.

use bytes::{Bytes, BytesMut};

/// Strips whatever on-wire framing a payload type adds and returns the raw
/// PCM sample bytes it carries, converted to the host's native byte order.
/// For rtcast's PCM payload type the only framing is the big-endian sample
/// encoding itself; the trait is kept narrow so a future payload type
/// (e.g. a compressed codec) only needs a new impl, not pipeline changes.
pub trait Depacketizer {
    fn depacketize(&mut self, payload: &Bytes) -> Bytes;
}

/// The only payload type rtcast speaks: signed 16-bit PCM, network byte
/// order, interleaved channels, no additional framing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pcm16Depacketizer;

impl Depacketizer for Pcm16Depacketizer {
    fn depacketize(&mut self, payload: &Bytes) -> Bytes {
        from_wire_order(payload)
    }
}

/// Converts big-endian wire sample bytes to the host's native order.
fn from_wire_order(payload: &Bytes) -> Bytes {
    let mut out = BytesMut::with_capacity(payload.len());
    for sample in payload.chunks_exact(2) {
        out.extend_from_slice(&i16::from_be_bytes([sample[0], sample[1]]).to_ne_bytes());
    }
    out.freeze()
}

/// Converts native-order sample bytes (as carried by `Frame::samples`) to
/// big-endian wire bytes.
fn to_wire_order(buf: &Bytes) -> BytesMut {
    let mut out = BytesMut::with_capacity(buf.len());
    for sample in buf.chunks_exact(2) {
        out.extend_from_slice(&i16::from_ne_bytes([sample[0], sample[1]]).to_be_bytes());
    }
    out
}

/// The packetizing half: slices a PCM sample buffer into RTP payloads no
/// larger than `max_payload_len` bytes, respecting the sample frame size so
/// a payload never ends mid-sample.
#[derive(Debug, Clone, Copy)]
pub struct Pcm16Payloader {
    pub bytes_per_sample_frame: usize,
}

impl Pcm16Payloader {
    pub fn new(channels: u16) -> Self {
        Self {
            bytes_per_sample_frame: channels as usize * 2,
        }
    }

    pub fn payload(&self, max_payload_len: usize, buf: &Bytes) -> Vec<Bytes> {
        if self.bytes_per_sample_frame == 0 {
            return vec![];
        }
        let max_frames = (max_payload_len / self.bytes_per_sample_frame).max(1);
        let chunk_len = max_frames * self.bytes_per_sample_frame;
        let mut out = Vec::with_capacity(buf.len().div_ceil(chunk_len.max(1)));
        let mut rest = to_wire_order(buf);
        while !rest.is_empty() {
            let take = chunk_len.min(rest.len());
            out.push(rest.split_to(take).freeze());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depacketize_converts_big_endian_wire_bytes_to_host_order() {
        let sample: i16 = 0x0102;
        let payload = Bytes::copy_from_slice(&sample.to_be_bytes());
        let mut d = Pcm16Depacketizer;
        let host = d.depacketize(&payload);
        assert_eq!(i16::from_ne_bytes([host[0], host[1]]), sample);
    }

    #[test]
    fn payload_then_depacketize_roundtrips_sample_values() {
        let samples: [i16; 2] = [1234, -5678];
        let mut buf = Vec::new();
        for s in samples {
            buf.extend_from_slice(&s.to_ne_bytes());
        }
        let payloader = Pcm16Payloader::new(1);
        let chunks = payloader.payload(4096, &Bytes::from(buf));
        assert_eq!(chunks.len(), 1);

        let mut d = Pcm16Depacketizer;
        let host = d.depacketize(&chunks[0]);
        let decoded: Vec<i16> = host.chunks_exact(2).map(|c| i16::from_ne_bytes([c[0], c[1]])).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn payloader_splits_on_sample_frame_boundaries() {
        let payloader = Pcm16Payloader::new(2); // 4 bytes/frame
        let buf = Bytes::from(vec![0u8; 100]);
        let chunks = payloader.payload(10, &buf); // max_frames = 2 -> chunk_len = 8
        assert!(chunks.iter().all(|c| c.len() % 4 == 0));
        assert_eq!(chunks.iter().map(|c| c.len()).sum::<usize>(), 100);
    }
}
