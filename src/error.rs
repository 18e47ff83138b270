//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, metadata and GDAL errors, and provides semantic variants
//! for input validation, external process failures and metadata lookups.
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata error: {0}")]
    Metadata(#[from] crate::io::MetadataError),

    #[error("GDAL error: {0}")]
    Gdal(#[from] crate::io::GdalError),

    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    #[error("Unable to get tile from {name} looking for '{pattern}'")]
    TileNotFound { name: String, pattern: &'static str },

    #[error("sen2cor directory {0:?} not found.")]
    ProductDirNotFound(PathBuf),

    #[error("No classification files found for pattern '{pattern}'.")]
    NoClassFiles { pattern: String },

    #[error("Command '{command}' returned non-zero exit status {}", .code.map_or_else(|| "(terminated by signal)".to_string(), |c| c.to_string()))]
    Process { command: String, code: Option<i32> },

    #[error("Missing metadata key `{key}` for granule {granule}")]
    MissingKey { granule: String, key: String },

    #[error("Invalid metadata value for `{key}`: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Timed out after {waited:?} waiting for classification files in {path:?}")]
    Timeout { path: PathBuf, waited: Duration },
}

impl Error {
    /// Conditions the runner treats as "output not written yet" while polling.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Error::ProductDirNotFound(_) | Error::NoClassFiles { .. })
    }
}
