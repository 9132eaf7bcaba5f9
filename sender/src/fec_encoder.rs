//! Buffers source packet payloads into fixed-K blocks and emits M repair
//! symbols per block via the same systematic Reed-Solomon codec the
//! receiver decodes with (§4.2 mirror, §6 "Repair packets", §9 "GF(2^8)
//! default"). Only `ReedSolomonGf8` is wired up, matching the receiver's
//! decoder (see DESIGN.md).

use bytes::Bytes;

use rtcast_fec::reed_solomon::Codec;
use rtcast_rtp::{FecHeader, FecScheme};

use crate::error::Result;

pub struct FecEncoder {
    codec: Codec,
    k: u16,
    m: u16,
    source_block_number: u16,
    block: Vec<Bytes>,
}

impl FecEncoder {
    pub fn new(k: u16, m: u16) -> Result<Self> {
        let codec = Codec::new(k as usize, m as usize)?;
        Ok(FecEncoder {
            codec,
            k,
            m,
            source_block_number: 0,
            block: Vec::with_capacity(k as usize),
        })
    }

    /// Feeds one source packet's payload into the current block. Returns
    /// the block's repair packets once `K` payloads have accumulated,
    /// otherwise an empty vec.
    pub fn feed(&mut self, payload: &Bytes) -> Result<Vec<(FecHeader, Bytes)>> {
        self.block.push(payload.clone());
        if self.block.len() < self.k as usize {
            return Ok(vec![]);
        }

        // Source payloads are usually equal length (fixed frame size) but
        // the last packet of a stream can be short; the codec requires a
        // uniform symbol length per block (§3 "K and M are constant within
        // a block").
        let symbol_len = self.block.iter().map(|b| b.len()).max().unwrap_or(0);
        let padded: Vec<Vec<u8>> = self
            .block
            .iter()
            .map(|b| {
                let mut v = b.to_vec();
                v.resize(symbol_len, 0);
                v
            })
            .collect();

        let repairs = self.codec.encode(&padded)?;
        let sbn = self.source_block_number;
        self.source_block_number = self.source_block_number.wrapping_add(1);
        self.block.clear();

        Ok(repairs
            .into_iter()
            .enumerate()
            .map(|(i, symbol)| {
                let header = FecHeader {
                    source_block_number: sbn,
                    repair_symbol_id: self.k + i as u16,
                    source_block_length: self.k,
                    repair_block_length: self.m,
                    scheme: FecScheme::ReedSolomonGf8,
                };
                (header, Bytes::from(symbol))
            })
            .collect())
    }

    pub fn current_block_number(&self) -> u16 {
        self.source_block_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_m_repairs_once_k_payloads_fed() {
        let mut enc = FecEncoder::new(4, 2).unwrap();
        for i in 0..3 {
            let payload = Bytes::from(vec![i as u8; 16]);
            assert!(enc.feed(&payload).unwrap().is_empty());
        }
        let repairs = enc.feed(&Bytes::from(vec![3u8; 16])).unwrap();
        assert_eq!(repairs.len(), 2);
        assert_eq!(repairs[0].0.source_block_number, 0);
        assert_eq!(repairs[0].0.repair_symbol_id, 4);
        assert_eq!(repairs[1].0.repair_symbol_id, 5);
    }

    #[test]
    fn block_number_advances_between_blocks() {
        let mut enc = FecEncoder::new(2, 1).unwrap();
        enc.feed(&Bytes::from(vec![0u8; 8])).unwrap();
        enc.feed(&Bytes::from(vec![1u8; 8])).unwrap();
        assert_eq!(enc.current_block_number(), 1);
        enc.feed(&Bytes::from(vec![2u8; 8])).unwrap();
        enc.feed(&Bytes::from(vec![3u8; 8])).unwrap();
        assert_eq!(enc.current_block_number(), 2);
    }

    #[test]
    fn pads_unequal_length_payloads_to_encode() {
        let mut enc = FecEncoder::new(2, 1).unwrap();
        enc.feed(&Bytes::from(vec![9u8; 10])).unwrap();
        let repairs = enc.feed(&Bytes::from(vec![9u8; 6])).unwrap();
        assert_eq!(repairs.len(), 1);
        assert_eq!(repairs[0].1.len(), 10);
    }
}
