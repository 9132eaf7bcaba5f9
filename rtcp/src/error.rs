use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("RTCP packet shorter than its fixed header")]
    PacketTooShort,
    #[error("unsupported RTCP version {0}, expected 2")]
    BadVersion(u8),
    #[error("unknown RTCP packet type {0}")]
    UnknownPacketType(u8),
    #[error("expected RTCP packet type {expected}, got {actual}")]
    WrongType { expected: u8, actual: u8 },
}

pub type Result<T> = std::result::Result<T, Error>;
