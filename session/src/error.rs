use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed datagram: {0}")]
    MalformedDatagram(&'static str),

    #[error("unknown discriminator byte {0:#x}")]
    UnknownDiscriminator(u8),

    #[error("configuration error: {0}")]
    Configuration(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
