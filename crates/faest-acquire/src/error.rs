//! Acquisition error types.

use std::path::PathBuf;

/// Errors that terminate library acquisition.
#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    /// No tier produced a usable library.
    #[error("no usable FAEST library found; checked:\n{}\n{remediation}", list_paths(.checked))]
    MissingArtifact {
        checked: Vec<PathBuf>,
        remediation: String,
    },

    /// A required build tool could not be found or installed.
    #[error("required tool '{tool}' is unavailable: {remediation}")]
    ToolUnavailable { tool: String, remediation: String },

    /// Cloning the upstream source failed.
    #[error("`{command}` failed: {stderr}\n{remediation}")]
    CloneFailed {
        command: String,
        stderr: String,
        remediation: String,
    },

    /// Configuring or compiling the library failed.
    #[error("`{command}` failed: {stderr}\n{remediation}")]
    BuildFailed {
        command: String,
        stderr: String,
        remediation: String,
    },

    /// Building from source is not possible on this platform.
    #[error("building FAEST from source is not supported on {platform}. {remediation}")]
    UnsupportedPlatform { platform: String, remediation: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn list_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "  (no candidate paths for this platform)".to_string();
    }
    paths
        .iter()
        .map(|p| format!("  {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result type alias for acquisition operations.
pub type Result<T> = std::result::Result<T, AcquireError>;
