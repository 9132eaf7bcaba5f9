use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("FEC scheme {0:?} has no codec implementation")]
    SchemeUnimplemented(crate::scheme::SchemeKind),
    #[error("block has only {have} of {need} required symbols")]
    NotEnoughSymbols { have: usize, need: usize },
    #[error("symbol index {index} out of range for K={k} M={m}")]
    IndexOutOfRange { index: usize, k: usize, m: usize },
    #[error("source symbols in a block must all be the same length")]
    MismatchedSymbolLength,
    #[error("repair matrix is singular for the given erasure pattern")]
    SingularMatrix,
}

pub type Result<T> = std::result::Result<T, Error>;
