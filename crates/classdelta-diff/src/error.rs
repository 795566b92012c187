//! Error types for the diff crate.

use classdelta_model::ModelError;

/// Errors that can occur while building or applying a diff.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DiffError {
    /// The source tree disagrees with what the diff expects at `level`.
    #[error("structural mismatch at {level}[{index}]: expected {expected}, found {actual}")]
    StructuralMismatch {
        level: String,
        index: usize,
        expected: String,
        actual: String,
    },

    /// A byte-delta blob does not belong to the bytes it was applied to.
    #[error("corrupt byte delta: {0}")]
    CorruptBlob(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl DiffError {
    pub(crate) fn mismatch(
        level: &str,
        index: usize,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::StructuralMismatch {
            level: level.to_string(),
            index,
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
