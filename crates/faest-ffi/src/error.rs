//! FFI error types.

/// Errors raised while describing or checking the C interface.
#[derive(Debug, thiserror::Error)]
pub enum FfiError {
    /// Failed to parse a C function declaration.
    #[error("invalid C signature: {detail}")]
    InvalidCSignature { detail: String },

    /// Installed headers disagree with the declaration table.
    #[error("FAEST headers do not match the expected interface:\n{}", .mismatches.join("\n"))]
    ContractViolation { mismatches: Vec<String> },

    /// Unrecognized parameter-set name.
    #[error("unknown FAEST parameter set '{0}'")]
    UnknownParameterSet(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON rendering error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for FFI operations.
pub type Result<T> = std::result::Result<T, FfiError>;
