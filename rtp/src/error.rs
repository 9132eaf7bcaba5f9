use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("packet shorter than the fixed 12-byte RTP header: {0} bytes")]
    HeaderTooShort(usize),
    #[error("unsupported RTP version {0}, expected 2")]
    UnsupportedVersion(u8),
    #[error("CSRC count implies a header extending past the end of the packet")]
    CsrcOverrun,
    #[error("extension flag set but fewer than 4 bytes remain for the extension header")]
    ExtensionHeaderMissing,
    #[error("extension length overruns the packet")]
    ExtensionOverrun,
    #[error("padding length overruns the packet")]
    PaddingOverrun,
    #[error("packet shorter than the 10-byte FEC framing header: {0} bytes")]
    FecHeaderTooShort(usize),
    #[error("unknown FEC scheme id {0}")]
    UnknownFecScheme(u8),
}

pub type Result<T> = std::result::Result<T, Error>;
