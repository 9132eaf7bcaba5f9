//! Block Forward Error Correction for rtcast (§4.2, §9). A sliding window
//! of FEC blocks, each decoded by a pluggable per-block codec; only
//! `ReedSolomonGf8` is implemented (see DESIGN.md for why the other wire
//! scheme ids are recognized but not built).

pub mod block;
pub mod decoder;
pub mod error;
pub mod gf256;
mod matrix;
pub mod reed_solomon;
pub mod scheme;

pub use decoder::{Decoder, Delivery};
pub use error::Error;
pub use scheme::SchemeKind;
