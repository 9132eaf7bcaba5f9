//! Minimal GF(2^8) matrix support for the Reed-Solomon codec: the little
//! linear algebra (multiply, Gauss-Jordan inverse) needed to turn a
//! Vandermonde matrix into a systematic encoding matrix and to solve for
//! missing source symbols at decode time.

use crate::error::{Error, Result};
use crate::gf256;

#[derive(Debug, Clone)]
pub(crate) struct Matrix {
    pub rows: usize,
    pub cols: usize,
    data: Vec<u8>,
}

impl Matrix {
    pub fn zero(rows: usize, cols: usize) -> Self {
        Matrix { rows, cols, data: vec![0; rows * cols] }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Matrix::zero(n, n);
        for i in 0..n {
            m.set(i, i, 1);
        }
        m
    }

    pub fn get(&self, r: usize, c: usize) -> u8 {
        self.data[r * self.cols + c]
    }

    pub fn set(&mut self, r: usize, c: usize, v: u8) {
        self.data[r * self.cols + c] = v;
    }

    pub fn row(&self, r: usize) -> &[u8] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// Vandermonde matrix with `rows` distinct evaluation points `0..rows`
    /// and `cols` powers `0..cols`. Any `cols`-sized subset of its rows is
    /// linearly independent (classical Vandermonde determinant argument).
    pub fn vandermonde(rows: usize, cols: usize) -> Self {
        let mut m = Matrix::zero(rows, cols);
        for r in 0..rows {
            for c in 0..cols {
                m.set(r, c, gf256::pow(r as u8, c as u32));
            }
        }
        m
    }

    pub fn mul(&self, other: &Matrix) -> Matrix {
        assert_eq!(self.cols, other.rows);
        let mut out = Matrix::zero(self.rows, other.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.get(i, k);
                if a == 0 {
                    continue;
                }
                for j in 0..other.cols {
                    let b = other.get(k, j);
                    if b == 0 {
                        continue;
                    }
                    let prev = out.get(i, j);
                    out.set(i, j, gf256::add(prev, gf256::mul(a, b)));
                }
            }
        }
        out
    }

    /// Inverts a square matrix via Gauss-Jordan elimination with partial
    /// pivoting over GF(2^8).
    pub fn invert(&self) -> Result<Matrix> {
        assert_eq!(self.rows, self.cols);
        let n = self.rows;
        let mut left = self.clone();
        let mut right = Matrix::identity(n);

        for col in 0..n {
            let pivot_row = (col..n).find(|&r| left.get(r, col) != 0).ok_or(Error::SingularMatrix)?;
            if pivot_row != col {
                left.swap_rows(col, pivot_row);
                right.swap_rows(col, pivot_row);
            }
            let pivot = left.get(col, col);
            let pivot_inv = gf256::inv(pivot);
            left.scale_row(col, pivot_inv);
            right.scale_row(col, pivot_inv);

            for r in 0..n {
                if r == col {
                    continue;
                }
                let factor = left.get(r, col);
                if factor == 0 {
                    continue;
                }
                left.add_scaled_row(r, col, factor);
                right.add_scaled_row(r, col, factor);
            }
        }
        Ok(right)
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        for c in 0..self.cols {
            self.data.swap(a * self.cols + c, b * self.cols + c);
        }
    }

    fn scale_row(&mut self, r: usize, factor: u8) {
        for c in 0..self.cols {
            let v = self.get(r, c);
            self.set(r, c, gf256::mul(v, factor));
        }
    }

    /// `row_r += factor * row_src` (GF(2^8) arithmetic: XOR-add of scaled values).
    fn add_scaled_row(&mut self, r: usize, src: usize, factor: u8) {
        for c in 0..self.cols {
            let v = gf256::mul(self.get(src, c), factor);
            let cur = self.get(r, c);
            self.set(r, c, gf256::add(cur, v));
        }
    }

    pub fn select_rows(&self, indices: &[usize]) -> Matrix {
        let mut out = Matrix::zero(indices.len(), self.cols);
        for (out_r, &src_r) in indices.iter().enumerate() {
            out.data[out_r * self.cols..(out_r + 1) * self.cols].copy_from_slice(self.row(src_r));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_times_identity_is_identity() {
        let id = Matrix::identity(4);
        let prod = id.mul(&id);
        for r in 0..4 {
            for c in 0..4 {
                assert_eq!(prod.get(r, c), if r == c { 1 } else { 0 });
            }
        }
    }

    #[test]
    fn invert_roundtrips() {
        let v = Matrix::vandermonde(4, 4);
        let inv = v.invert().unwrap();
        let prod = v.mul(&inv);
        for r in 0..4 {
            for c in 0..4 {
                assert_eq!(prod.get(r, c), if r == c { 1 } else { 0 });
            }
        }
    }
}
