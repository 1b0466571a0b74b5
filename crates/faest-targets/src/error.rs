//! Error types for platform identification.

/// Errors that can occur while parsing an explicit platform descriptor.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    /// The descriptor string was empty or only separators.
    #[error("empty platform descriptor")]
    Empty,

    /// The descriptor did not contain an architecture token.
    #[error("platform descriptor '{descriptor}' has no architecture component")]
    MissingArchitecture {
        /// The offending descriptor.
        descriptor: String,
    },
}

/// Result type for target operations.
pub type Result<T> = std::result::Result<T, TargetError>;
