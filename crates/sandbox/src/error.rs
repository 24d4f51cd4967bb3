//! Sandbox error types.

use std::path::PathBuf;
use thiserror::Error;

/// Sandbox errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A path resolved outside the sandbox root.
    #[error("path escapes the output directory: {path}")]
    Escape { path: PathBuf },

    /// The sandbox root could not be created or canonicalized.
    #[error("invalid sandbox root {root}: {source}")]
    Root {
        root: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
