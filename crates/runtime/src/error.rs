use crate::model::ModelError;
use thiserror::Error;

/// Runtime errors surfaced to the caller of a session.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Store(#[from] store::Error),

    #[error("exchange exceeded {rounds} tool rounds without a final answer")]
    RoundLimit { rounds: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
