//! Pipeline errors.

use std::path::PathBuf;

use faest_acquire::AcquireError;
use faest_ffi::FfiError;
use thiserror::Error;

/// Errors that terminate a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration in {}: {error}", .path.display())]
    Config { path: PathBuf, error: toml::de::Error },

    #[error(transparent)]
    Acquire(#[from] AcquireError),

    #[error(transparent)]
    Ffi(#[from] FfiError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
