//! The sliding-window FEC decoder (§4.2). Holds at most `window_size`
//! consecutive source blocks; admits source and repair packets into the
//! block they name, attempts reconstruction as soon as a block has enough
//! symbols, and flushes (emitting loss tokens for anything still missing)
//! when the window slides past a block or the caller advances the
//! consumer past it.
//!
//! Source packets carry no FEC coordinates on the wire (§6) — block
//! membership is derived from the configured `K` by dividing the RTP
//! sequence number, so `(SBN, index)` for a source packet is computed
//! locally rather than read off the packet. See DESIGN.md.

use std::collections::HashMap;

use log::{debug, warn};

use rtcast_util::wrap::wrapping_diff16;

use crate::block::FecBlock;
use crate::error::Result;
use crate::scheme::SchemeKind;

/// What the decoder hands back to the jitter buffer after an insertion.
#[derive(Debug, Clone)]
pub enum Delivery {
    /// A source packet's payload, reconstructed from repair symbols.
    Reconstructed { sequence_number: u16, payload: Vec<u8> },
    /// A source slot that could not be recovered before its block was
    /// flushed; downstream treats it as silence.
    Loss { sequence_number: u16 },
}

pub struct Decoder {
    scheme: SchemeKind,
    k: u16,
    m: u16,
    window_size: u16,
    max_sbn_jump: u16,
    window_head: Option<u16>,
    blocks: HashMap<u16, FecBlock>,
}

impl Decoder {
    pub fn new(scheme: SchemeKind, k: u16, m: u16, window_size: u16, max_sbn_jump: u16) -> Self {
        Decoder {
            scheme,
            k,
            m,
            window_size,
            max_sbn_jump,
            window_head: None,
            blocks: HashMap::new(),
        }
    }

    fn sbn_of(&self, sequence_number: u16) -> (u16, u16) {
        let k = self.k.max(1);
        let sbn = sequence_number / k;
        let index = sequence_number % k;
        (sbn, index)
    }

    fn base_sequence_number(&self, sbn: u16) -> u16 {
        sbn.wrapping_mul(self.k.max(1))
    }

    /// Admits `sbn` into the window, sliding forward and flushing evicted
    /// blocks as needed. Returns `None` if `sbn` is too old to admit.
    fn admit(&mut self, sbn: u16) -> Option<Vec<Delivery>> {
        let mut evicted = Vec::new();

        let head = match self.window_head {
            None => {
                self.window_head = Some(sbn);
                return Some(evicted);
            }
            Some(h) => h,
        };

        let diff = wrapping_diff16(sbn, head);
        if diff < 0 {
            return None;
        }
        if diff as u32 > self.max_sbn_jump as u32 {
            warn!(
                "FEC SBN jump of {diff} exceeds max {}; restarting window at {sbn}",
                self.max_sbn_jump
            );
            let drained: Vec<FecBlock> = self.blocks.drain().map(|(_, block)| block).collect();
            for mut block in drained {
                evicted.extend(self.flush_block(&mut block));
            }
            self.window_head = Some(sbn);
            return Some(evicted);
        }

        if (diff as u16) < self.window_size {
            return Some(evicted);
        }

        let new_head = sbn.wrapping_sub(self.window_size - 1);
        let mut cur = head;
        while wrapping_diff16(cur, new_head) < 0 {
            if let Some(mut block) = self.blocks.remove(&cur) {
                evicted.extend(self.flush_block(&mut block));
            }
            cur = cur.wrapping_add(1);
        }
        self.window_head = Some(new_head);
        Some(evicted)
    }

    fn ensure_block(&mut self, sbn: u16) -> Result<&mut FecBlock> {
        if !self.blocks.contains_key(&sbn) {
            let block = FecBlock::new(sbn, self.scheme, self.k, self.m)?;
            self.blocks.insert(sbn, block);
        }
        Ok(self.blocks.get_mut(&sbn).expect("just inserted"))
    }

    /// Inserts a source packet, deriving its block membership from its
    /// sequence number. Attempts reconstruction for its block afterward.
    pub fn insert_source(&mut self, sequence_number: u16, payload: Vec<u8>) -> Result<Vec<Delivery>> {
        let (sbn, index) = self.sbn_of(sequence_number);
        let mut out = match self.admit(sbn) {
            Some(evicted) => evicted,
            None => return Ok(vec![]), // packet too old for the window; dropped
        };
        let block = self.ensure_block(sbn)?;
        block.feed_source(index, payload);
        out.extend(self.solve_and_deliver(sbn)?);
        Ok(out)
    }

    /// Inserts a repair packet for the block its header names.
    pub fn insert_repair(&mut self, sbn: u16, repair_symbol_id: u16, payload: Vec<u8>) -> Result<Vec<Delivery>> {
        let mut out = match self.admit(sbn) {
            Some(evicted) => evicted,
            None => return Ok(vec![]),
        };
        let block = self.ensure_block(sbn)?;
        block.feed_repair(repair_symbol_id, payload);
        out.extend(self.solve_and_deliver(sbn)?);
        Ok(out)
    }

    fn solve_and_deliver(&mut self, sbn: u16) -> Result<Vec<Delivery>> {
        let base = self.base_sequence_number(sbn);
        let block = self.blocks.get_mut(&sbn).expect("block just ensured");
        let recovered = block.try_solve()?;
        Ok(recovered
            .into_iter()
            .map(|(index, payload)| Delivery::Reconstructed {
                sequence_number: base.wrapping_add(index),
                payload,
            })
            .collect())
    }

    /// Called when the jitter buffer's read cursor has advanced past every
    /// sequence number in `sbn`'s block, or when the window evicts it.
    /// Emits loss tokens for whatever is still missing.
    fn flush_block(&self, block: &mut FecBlock) -> Vec<Delivery> {
        let base = self.base_sequence_number(block.sbn);
        let missing = block.missing_source_indices();
        if !missing.is_empty() {
            debug!("FEC block {} flushed with {} unrecovered source slots", block.sbn, missing.len());
        }
        missing
            .into_iter()
            .map(|index| Delivery::Loss { sequence_number: base.wrapping_add(index) })
            .collect()
    }

    /// Explicit flush hook for the jitter buffer's consumer-advance case
    /// (§4.2 "Flush": "a block is flushed when the receiver's consumer has
    /// advanced past all of its sequence numbers").
    pub fn flush(&mut self, sbn: u16) -> Vec<Delivery> {
        match self.blocks.remove(&sbn) {
            Some(mut block) => self.flush_block(&mut block),
            None => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconstructs_missing_source_from_repair() {
        let mut decoder = Decoder::new(SchemeKind::ReedSolomonGf8, 4, 2, 4, 64);
        let payloads: Vec<Vec<u8>> = (0..4).map(|i| vec![i as u8; 8]).collect();

        // insert sources 0,1,3 (skip 2), and repair 0 and 1
        decoder.insert_source(0, payloads[0].clone()).unwrap();
        decoder.insert_source(1, payloads[1].clone()).unwrap();
        decoder.insert_source(3, payloads[3].clone()).unwrap();

        let codec = crate::reed_solomon::Codec::new(4, 2).unwrap();
        let repairs = codec.encode(&payloads).unwrap();

        let mut deliveries = decoder.insert_repair(0, 0, repairs[0].clone()).unwrap();
        deliveries.extend(decoder.insert_repair(0, 1, repairs[1].clone()).unwrap());

        let reconstructed = deliveries.iter().find_map(|d| match d {
            Delivery::Reconstructed { sequence_number, payload } if *sequence_number == 2 => {
                Some(payload.clone())
            }
            _ => None,
        });
        assert_eq!(reconstructed, Some(payloads[2].clone()));
    }

    #[test]
    fn window_slide_flushes_oldest_block_as_loss() {
        let mut decoder = Decoder::new(SchemeKind::ReedSolomonGf8, 2, 1, 2, 64);
        decoder.insert_source(0, vec![1, 2]).unwrap(); // block 0, index 0
        // block 0 index 1 (seq 1) never arrives.

        // advancing far enough in SBN space slides the window past block 0
        let deliveries = decoder.insert_source(8, vec![9, 9]).unwrap(); // sbn = 4
        let lost: Vec<_> = deliveries
            .iter()
            .filter_map(|d| match d {
                Delivery::Loss { sequence_number } => Some(*sequence_number),
                _ => None,
            })
            .collect();
        assert!(lost.contains(&1));
    }
}
