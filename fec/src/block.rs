//! One FEC block's decode state: the (K+M)-slot accumulator and its
//! per-block codec (§3 "FEC Block", §4.2).

use crate::error::Result;
use crate::scheme::{new_block_codec, BlockCodec, SchemeKind};

pub struct FecBlock {
    pub sbn: u16,
    pub k: u16,
    pub m: u16,
    codec: Box<dyn BlockCodec + Send>,
    solved: bool,
    source_present: Vec<bool>,
}

impl FecBlock {
    pub fn new(sbn: u16, scheme: SchemeKind, k: u16, m: u16) -> Result<Self> {
        Ok(FecBlock {
            sbn,
            k,
            m,
            codec: new_block_codec(scheme, k as usize, m as usize)?,
            solved: false,
            source_present: vec![false; k as usize],
        })
    }

    pub fn feed_source(&mut self, index: u16, payload: Vec<u8>) {
        if (index as usize) < self.source_present.len() {
            self.source_present[index as usize] = true;
        }
        self.codec.feed(index as usize, payload);
    }

    pub fn feed_repair(&mut self, repair_symbol_id: u16, payload: Vec<u8>) {
        self.codec.feed(self.k as usize + repair_symbol_id as usize, payload);
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    pub fn missing_source_indices(&self) -> Vec<u16> {
        self.source_present
            .iter()
            .enumerate()
            .filter(|(_, present)| !**present)
            .map(|(i, _)| i as u16)
            .collect()
    }

    /// Attempts reconstruction. Returns `(index, payload)` for every
    /// previously-missing source slot now filled. A no-op (and cheap) once
    /// already solved or while still short on symbols.
    pub fn try_solve(&mut self) -> Result<Vec<(u16, Vec<u8>)>> {
        if self.solved {
            return Ok(vec![]);
        }
        if !self.codec.ready() {
            return Ok(vec![]);
        }
        let recovered = self.codec.solve()?;
        if recovered.is_empty() && !self.codec.ready() {
            return Ok(vec![]);
        }
        self.solved = true;
        Ok(recovered.into_iter().map(|(i, b)| (i as u16, b)).collect())
    }
}
