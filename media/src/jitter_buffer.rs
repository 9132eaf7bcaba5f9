//! The reorder/jitter buffer (§4.3): a bounded ring keyed by signed
//! sequence-number distance, accepting source packets in any order and
//! releasing them in monotonically increasing sequence order. Grounded on
//! the teacher's `SampleBuilder` ring-buffer bookkeeping
//! (`SampleSequenceLocation`/`seqnum_distance`), generalized from the
//! webrtc-rs original's full `u16::MAX + 1`-entry buffer to a bounded
//! capacity matching the configured maximum latency (§3 "Pools": fixed-size
//! allocation, not unbounded).

use log::debug;

use rtcast_rtp::Packet;
use rtcast_util::wrap::{wrapping_diff16, SeqSpan};

/// What `advance()` releases for a given sequence-number slot.
#[derive(Debug)]
pub enum Slot {
    Packet(Packet),
    Loss,
}

#[derive(Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    DroppedLate,
    DroppedFull,
}

pub struct JitterBuffer {
    capacity: u16,
    slots: Vec<Option<Packet>>,
    filled: SeqSpan,
    read_cursor: u16,
    started: bool,
}

impl JitterBuffer {
    /// `capacity` is `N` (§4.3 invariants): the maximum permitted latency
    /// expressed in packets, plus a safety margin, chosen by the session
    /// from its configured `target_latency_ns` / packet duration.
    pub fn new(capacity: u16) -> Self {
        JitterBuffer {
            capacity: capacity.max(1),
            slots: (0..capacity.max(1)).map(|_| None).collect(),
            filled: SeqSpan::empty(),
            read_cursor: 0,
            started: false,
        }
    }

    fn slot_index(&self, seq: u16) -> usize {
        (seq % self.capacity) as usize
    }

    fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Inserts a packet (original or FEC-reconstructed) unless it's older
    /// than the read cursor or the buffer is full.
    pub fn insert(&mut self, packet: Packet) -> InsertOutcome {
        let seq = packet.header.sequence_number;

        if !self.started {
            self.started = true;
            self.read_cursor = seq;
            self.filled = SeqSpan::empty();
        }

        if wrapping_diff16(seq, self.read_cursor) < 0 {
            return InsertOutcome::DroppedLate;
        }

        let idx = self.slot_index(seq);
        if self.slots[idx].is_none() && self.occupied_count() >= self.capacity as usize {
            // Buffer is full of other slots; evict the oldest occupied one
            // if this packet is newer, else drop the incoming packet.
            let oldest = self.oldest_occupied_seq();
            match oldest {
                Some(oldest_seq) if wrapping_diff16(seq, oldest_seq) > 0 => {
                    let oldest_idx = self.slot_index(oldest_seq);
                    self.slots[oldest_idx] = None;
                    debug!("jitter buffer full, evicted seq {oldest_seq} for newer seq {seq}");
                }
                _ => return InsertOutcome::DroppedFull,
            }
        }

        self.slots[idx] = Some(packet);
        self.filled.extend_to_include(seq);
        InsertOutcome::Inserted
    }

    fn oldest_occupied_seq(&self) -> Option<u16> {
        if self.filled.is_empty() {
            return None;
        }
        let mut i = self.filled.head;
        while i != self.filled.tail {
            if self.slots[self.slot_index(i)].is_some() {
                return Some(i);
            }
            i = i.wrapping_add(1);
        }
        None
    }

    /// Returns the packet at the read cursor if `ready` (a judgment the
    /// latency monitor makes, not this buffer — §4.3). `None` either
    /// because playout time hasn't arrived (`!ready`) or because the
    /// cursor's slot is still an unfilled gap.
    pub fn peek(&self, ready: bool) -> Option<&Packet> {
        if !ready {
            return None;
        }
        self.slots[self.slot_index(self.read_cursor)].as_ref()
    }

    /// The packet at the read cursor regardless of play-out readiness, for
    /// the latency monitor's own "what's waiting" measurement (§4.6) — it
    /// is the thing that *decides* readiness, so it can't go through
    /// `peek`'s readiness gate itself.
    pub fn head_packet(&self) -> Option<&Packet> {
        self.slots[self.slot_index(self.read_cursor)].as_ref()
    }

    /// Moves the read cursor forward by one sequence number, releasing
    /// whatever was at that slot (or a loss token if it was empty).
    pub fn advance(&mut self) -> Slot {
        let idx = self.slot_index(self.read_cursor);
        let slot = self.slots[idx].take();
        if !self.filled.is_empty() && self.filled.head == self.read_cursor {
            self.filled.head = self.read_cursor.wrapping_add(1);
        }
        self.read_cursor = self.read_cursor.wrapping_add(1);
        match slot {
            Some(packet) => Slot::Packet(packet),
            None => Slot::Loss,
        }
    }

    pub fn read_cursor(&self) -> u16 {
        self.read_cursor
    }

    pub fn len(&self) -> usize {
        self.occupied_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use rtcast_rtp::Header;

    fn packet(seq: u16) -> Packet {
        Packet {
            header: Header {
                sequence_number: seq,
                ..Default::default()
            },
            payload: Bytes::from_static(&[1, 2, 3, 4]),
        }
    }

    #[test]
    fn advances_monotonically_releasing_loss_on_gaps() {
        let mut buf = JitterBuffer::new(16);
        buf.insert(packet(10));
        buf.insert(packet(12));

        assert_eq!(buf.read_cursor(), 10);
        assert!(matches!(buf.advance(), Slot::Packet(_))); // seq 10
        assert!(matches!(buf.advance(), Slot::Loss)); // seq 11 never arrived
        assert!(matches!(buf.advance(), Slot::Packet(_))); // seq 12
    }

    #[test]
    fn drops_packets_older_than_read_cursor() {
        let mut buf = JitterBuffer::new(16);
        buf.insert(packet(10));
        let _ = buf.advance(); // cursor now at 11
        assert_eq!(buf.insert(packet(10)), InsertOutcome::DroppedLate);
    }

    #[test]
    fn peek_respects_external_readiness() {
        let mut buf = JitterBuffer::new(16);
        buf.insert(packet(5));
        assert!(buf.peek(false).is_none());
        assert!(buf.peek(true).is_some());
    }
}
