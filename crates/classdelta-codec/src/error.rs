use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("invalid patch magic: expected {expected}, got {actual}")]
    InvalidMagic { expected: String, actual: String },

    #[error("unsupported patch format version: {0}")]
    UnsupportedVersion(u16),

    /// The patch is truncated, fails its checksum, or does not parse.
    #[error("corrupt patch at offset {offset}: {reason}")]
    CorruptPatch { offset: u64, reason: String },
}

impl CodecError {
    pub(crate) fn corrupt(offset: usize, reason: impl Into<String>) -> Self {
        Self::CorruptPatch {
            offset: offset as u64,
            reason: reason.into(),
        }
    }
}

pub type CodecResult<T> = Result<T, CodecError>;
