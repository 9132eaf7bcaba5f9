//! Systematic Reed-Solomon erasure coding over GF(2^8) (§4.2 "Reconstruction",
//! §9 Open Questions). The generator matrix is a Vandermonde matrix
//! converted to systematic form — its top `K` rows collapsed to the
//! identity — so the first `K` encoded symbols are the source data
//! unmodified and the remaining `M` are parity. Any `K` of the `K+M` rows
//! of the resulting matrix are guaranteed invertible (Vandermonde
//! determinant), which is what makes decoding from an arbitrary K-subset
//! possible.
//!
//! This module only has use for the field and erasure-pattern algebra;
//! codec construction per block, packet bookkeeping, and the sliding
//! window live in [`crate::block`] and [`crate::decoder`].

use crate::error::{Error, Result};
use crate::gf256;
use crate::matrix::Matrix;

/// A systematic Reed-Solomon(K+M, K) generator matrix, cached per (K, M)
/// pair since building it is O((K+M)^2) work none of the RT path should
/// repeat per block.
pub struct Codec {
    k: usize,
    m: usize,
    /// Full (K+M) x K systematic generator matrix.
    generator: Matrix,
}

impl Codec {
    pub fn new(k: usize, m: usize) -> Result<Self> {
        if k == 0 || k + m > 256 {
            return Err(Error::IndexOutOfRange { index: k + m, k, m });
        }
        let vandermonde = Matrix::vandermonde(k + m, k);
        let top = vandermonde.select_rows(&(0..k).collect::<Vec<_>>());
        let top_inv = top.invert()?;
        let generator = vandermonde.mul(&top_inv);
        Ok(Codec { k, m, generator })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn m(&self) -> usize {
        self.m
    }

    /// Computes the `M` repair symbols for a block of `K` source symbols,
    /// all of equal length. Each output byte is the GF(2^8) dot product of
    /// a parity row with the corresponding byte across all source symbols.
    pub fn encode(&self, sources: &[Vec<u8>]) -> Result<Vec<Vec<u8>>> {
        if sources.len() != self.k {
            return Err(Error::IndexOutOfRange { index: sources.len(), k: self.k, m: self.m });
        }
        let symbol_len = sources.first().map(|s| s.len()).unwrap_or(0);
        if sources.iter().any(|s| s.len() != symbol_len) {
            return Err(Error::MismatchedSymbolLength);
        }

        let mut repairs = vec![vec![0u8; symbol_len]; self.m];
        for repair_idx in 0..self.m {
            let row = self.generator.row(self.k + repair_idx);
            for byte_idx in 0..symbol_len {
                let mut acc = 0u8;
                for (src_idx, coeff) in row.iter().enumerate() {
                    if *coeff == 0 {
                        continue;
                    }
                    acc = gf256::add(acc, gf256::mul(*coeff, sources[src_idx][byte_idx]));
                }
                repairs[repair_idx][byte_idx] = acc;
            }
        }
        Ok(repairs)
    }

    /// Recovers all `K` source symbols given at least `K` of the `K+M`
    /// encoded symbols (source and/or repair), addressed by their row
    /// index (`0..K` for source rows, `K..K+M` for repair rows).
    ///
    /// `received` pairs a row index with the symbol's bytes; all symbols
    /// must share the same length. Returns the full `K`-symbol source
    /// vector — entries present in `received` at a source index are
    /// reproduced unchanged (systematic round-trip), missing ones are the
    /// algebraic reconstruction.
    pub fn decode(&self, received: &[(usize, Vec<u8>)]) -> Result<Vec<Vec<u8>>> {
        if received.len() < self.k {
            return Err(Error::NotEnoughSymbols { have: received.len(), need: self.k });
        }
        let symbol_len = received[0].1.len();
        if received.iter().any(|(_, b)| b.len() != symbol_len) {
            return Err(Error::MismatchedSymbolLength);
        }

        let chosen = &received[..self.k];
        let indices: Vec<usize> = chosen.iter().map(|(idx, _)| *idx).collect();
        let sub = self.generator.select_rows(&indices);
        let sub_inv = sub.invert()?;

        let mut recovered = vec![vec![0u8; symbol_len]; self.k];
        for byte_idx in 0..symbol_len {
            for out_row in 0..self.k {
                let row = sub_inv.row(out_row);
                let mut acc = 0u8;
                for (col, coeff) in row.iter().enumerate() {
                    if *coeff == 0 {
                        continue;
                    }
                    acc = gf256::add(acc, gf256::mul(*coeff, chosen[col].1[byte_idx]));
                }
                recovered[out_row][byte_idx] = acc;
            }
        }
        Ok(recovered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(k: usize, len: usize) -> Vec<Vec<u8>> {
        (0..k).map(|i| (0..len).map(|b| ((i * 31 + b * 7) % 256) as u8).collect()).collect()
    }

    #[test]
    fn source_rows_are_systematic() {
        let codec = Codec::new(4, 2).unwrap();
        let src = sources(4, 16);
        let repairs = codec.encode(&src).unwrap();
        assert_eq!(repairs.len(), 2);

        let mut received: Vec<(usize, Vec<u8>)> = src.iter().cloned().enumerate().collect();
        received.extend(repairs.iter().cloned().enumerate().map(|(i, r)| (4 + i, r)));
        let recovered = codec.decode(&received[..4]).unwrap();
        assert_eq!(recovered, src);
    }

    #[test]
    fn recovers_from_repair_symbols_when_sources_missing() {
        let codec = Codec::new(5, 3).unwrap();
        let src = sources(5, 32);
        let repairs = codec.encode(&src).unwrap();

        // lose source indices 1 and 3, keep the rest plus two repairs
        let mut received: Vec<(usize, Vec<u8>)> = vec![
            (0, src[0].clone()),
            (2, src[2].clone()),
            (4, src[4].clone()),
            (5, repairs[0].clone()),
            (6, repairs[1].clone()),
        ];
        received.sort_by_key(|(idx, _)| *idx);
        let recovered = codec.decode(&received).unwrap();
        assert_eq!(recovered, src);
    }

    #[test]
    fn fails_with_fewer_than_k_symbols() {
        let codec = Codec::new(4, 2).unwrap();
        let src = sources(4, 8);
        let received: Vec<(usize, Vec<u8>)> = src.iter().take(3).cloned().enumerate().collect();
        assert!(codec.decode(&received).is_err());
    }
}
