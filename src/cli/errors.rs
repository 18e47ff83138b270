use std::path::PathBuf;
use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid runner parameters in {path:?}: {source}")]
    InvalidParams {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Some products failed: {errors} of {total}")]
    BatchFailed { errors: usize, total: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Wrapper(#[from] sen2cor_wrapper::Error),
}
