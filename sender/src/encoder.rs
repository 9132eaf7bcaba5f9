//! Slices PCM frames into RTP source packets (§4.1 mirror, §6 "Source
//! packets"). A frame whose sample bytes exceed the configured payload
//! limit becomes more than one packet; each packet's timestamp advances by
//! however many sample-frames the previous packets in the same audio frame
//! already carried, so the stream timestamp stays sample-accurate even
//! when a frame is split.

use rtcast_media::Frame;
use rtcast_rtp::{Header, Packet, Pcm16Payloader};

pub struct Encoder {
    ssrc: u32,
    payload_type: u8,
    payloader: Pcm16Payloader,
    sequence_number: u16,
    max_payload_len: usize,
}

impl Encoder {
    pub fn new(ssrc: u32, payload_type: u8, channels: u16, max_payload_len: usize) -> Self {
        Encoder {
            ssrc,
            payload_type,
            payloader: Pcm16Payloader::new(channels),
            sequence_number: 0,
            max_payload_len,
        }
    }

    pub fn encode(&mut self, frame: &Frame) -> Vec<Packet> {
        let bytes_per_sample_frame = self.payloader.bytes_per_sample_frame.max(1);
        let chunks = self.payloader.payload(self.max_payload_len, &frame.samples);

        let mut packets = Vec::with_capacity(chunks.len());
        let mut samples_consumed: u32 = 0;
        for chunk in chunks {
            let packet_samples = (chunk.len() / bytes_per_sample_frame) as u32;
            packets.push(Packet {
                header: Header {
                    marker: samples_consumed == 0,
                    payload_type: self.payload_type,
                    sequence_number: self.sequence_number,
                    timestamp: frame.capture_time.wrapping_add(samples_consumed),
                    ssrc: self.ssrc,
                    ..Default::default()
                },
                payload: chunk,
            });
            self.sequence_number = self.sequence_number.wrapping_add(1);
            samples_consumed += packet_samples;
        }
        packets
    }

    pub fn sequence_number(&self) -> u16 {
        self.sequence_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use rtcast_media::FrameFlags;

    fn frame(sample_count: usize, channels: u16, capture_time: u32) -> Frame {
        Frame {
            samples: Bytes::from(vec![0xABu8; sample_count * channels as usize * 2]),
            sample_count,
            duration_ts: sample_count as u32,
            capture_time,
            flags: FrameFlags::empty(),
        }
    }

    #[test]
    fn sequence_numbers_increase_across_frames() {
        let mut enc = Encoder::new(7, 96, 2, 1500);
        let a = enc.encode(&frame(10, 2, 0));
        let b = enc.encode(&frame(10, 2, 10));
        assert_eq!(a[0].header.sequence_number, 0);
        assert_eq!(b[0].header.sequence_number, 1);
        assert_eq!(b[0].header.ssrc, 7);
    }

    #[test]
    fn large_frame_splits_with_advancing_timestamps() {
        // 2 channels, 4 bytes/sample-frame, 200 sample-frames = 800 bytes
        let mut enc = Encoder::new(1, 96, 2, 100); // 100-byte payload cap -> 25 sample-frames/packet
        let packets = enc.encode(&frame(200, 2, 1000));
        assert!(packets.len() > 1);
        assert_eq!(packets[0].header.timestamp, 1000);
        let second_ts_delta = packets[1].header.timestamp - packets[0].header.timestamp;
        assert_eq!(second_ts_delta, (packets[0].payload.len() / 4) as u32);
        assert!(packets[0].header.marker);
        assert!(!packets[1].header.marker);
    }
}
