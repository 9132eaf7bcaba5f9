use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Fec(#[from] rtcast_fec::Error),

    #[error("configuration error: {0}")]
    Configuration(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
