use classdelta_codec::CodecError;
use classdelta_diff::DiffError;
use classdelta_model::ModelError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The patch header or the reconstructed target disagrees with the
    /// class it was applied to.
    #[error("structural mismatch at {level}: expected {expected}, found {actual}")]
    StructuralMismatch {
        level: String,
        expected: String,
        actual: String,
    },
}

/// Broad failure categories, stable across the wrapped crate errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// An input tree violates a structural invariant.
    MalformedInput,
    /// The patch was written in a format version this build does not read.
    UnsupportedVersion,
    /// The patch bytes are truncated or internally inconsistent.
    CorruptPatch,
    /// The patch does not belong to the source it was applied to.
    StructuralMismatch,
    /// An opaque attribute delta does not belong to its source bytes.
    CorruptBlob,
}

impl SdkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Model(_) => ErrorKind::MalformedInput,
            Self::Diff(DiffError::StructuralMismatch { .. }) => ErrorKind::StructuralMismatch,
            Self::Diff(DiffError::CorruptBlob(_)) => ErrorKind::CorruptBlob,
            Self::Diff(DiffError::Model(_)) => ErrorKind::MalformedInput,
            Self::Codec(CodecError::UnsupportedVersion(_)) => ErrorKind::UnsupportedVersion,
            Self::Codec(CodecError::InvalidMagic { .. } | CodecError::CorruptPatch { .. }) => {
                ErrorKind::CorruptPatch
            }
            Self::StructuralMismatch { .. } => ErrorKind::StructuralMismatch,
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
