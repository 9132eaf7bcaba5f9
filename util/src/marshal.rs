//! Wire (de)serialization traits, carried over from the teacher's
//! `webrtc-util` marshal module. Every on-wire type in rtcast (RTP headers,
//! RTCP reports, FEC framing headers) implements `Marshal`/`Unmarshal`
//! instead of hand-rolling ad hoc encode/decode functions.

use bytes::{Buf, Bytes, BytesMut};

/// Every protocol crate (`rtp`, `rtcp`, `fec`) keeps its own `Error` enum;
/// `Marshal`/`Unmarshal` don't pick a winner among them. Any error type that
/// implements the standard `Error` trait converts automatically via `?`,
/// the same way the teacher's marshal module leans on `anyhow::Result` to
/// stay error-type-agnostic.
pub type MarshalResult<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub trait MarshalSize {
    /// Size in bytes this value occupies once marshaled.
    fn marshal_size(&self) -> usize;
}

pub trait Marshal: MarshalSize {
    /// Serializes into `buf`, returning the number of bytes written.
    fn marshal_to(&self, buf: &mut [u8]) -> MarshalResult<usize>;

    fn marshal(&self) -> MarshalResult<Bytes> {
        let len = self.marshal_size();
        let mut buf = BytesMut::with_capacity(len);
        buf.resize(len, 0);
        let n = self.marshal_to(&mut buf)?;
        if n != len {
            return Err("marshal_to wrote a different size than marshal_size".into());
        }
        Ok(buf.freeze())
    }
}

pub trait Unmarshal: Sized {
    fn unmarshal<B: Buf>(buf: &mut B) -> MarshalResult<Self>;
}
