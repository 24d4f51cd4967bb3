//! Store error types.

use std::path::PathBuf;
use thiserror::Error;

/// Conversation store errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The persisted conversation file is not valid JSON.
    #[error("conversation file {path} is not parseable: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The conversation could not be serialized.
    #[error("failed to serialize conversation: {0}")]
    Serialize(#[from] serde_json::Error),

    /// An I/O error occurred while reading or writing the file.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
