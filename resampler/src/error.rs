use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("scaling factor {0} outside hard bounds, session flagged for restart")]
    ScalingOutOfRange(f64),
}

pub type Result<T> = std::result::Result<T, Error>;
