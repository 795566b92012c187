use thiserror::Error;

/// Errors produced by model operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// The tree violates a structural invariant and cannot be diffed.
    #[error("malformed input at {location}: {reason}")]
    MalformedInput { location: String, reason: String },

    /// The class format collaborator could not parse its input.
    #[error("malformed class file: {0}")]
    MalformedClassFile(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ModelError {
    pub(crate) fn malformed(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            location: location.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias for model results.
pub type ModelResult<T> = Result<T, ModelError>;
