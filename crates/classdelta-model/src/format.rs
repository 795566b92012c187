//! Conversion between class bytes and the structural tree.

use crate::class::ClassNode;
use crate::error::{ModelError, ModelResult};

/// Reads and writes class trees in some on-disk representation.
///
/// `parse` followed by `write` must reproduce the tree losslessly; the diff
/// engine never sees the bytes.
pub trait ClassFormat {
    fn parse(&self, bytes: &[u8]) -> ModelResult<ClassNode>;

    fn write(&self, class: &ClassNode) -> ModelResult<Vec<u8>>;
}

/// The structural tree serialized as JSON.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonClassFormat {
    pub pretty: bool,
}

impl JsonClassFormat {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl ClassFormat for JsonClassFormat {
    fn parse(&self, bytes: &[u8]) -> ModelResult<ClassNode> {
        serde_json::from_slice(bytes).map_err(|e| ModelError::MalformedClassFile(e.to_string()))
    }

    fn write(&self, class: &ClassNode) -> ModelResult<Vec<u8>> {
        let result = if self.pretty {
            serde_json::to_vec_pretty(class)
        } else {
            serde_json::to_vec(class)
        };
        result.map_err(|e| ModelError::Serialization(e.to_string()))
    }
}
