use classdelta_diff::AlignConfig;
use serde::{Deserialize, Serialize};

/// Configuration for [`ClassPatcher`](crate::ClassPatcher).
///
/// Every key is optional when deserialized; missing keys take the defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatcherConfig {
    /// Aligner cost bounds.
    pub align: AlignConfig,
    /// zstd level used for opaque attribute deltas.
    pub zstd_level: i32,
    /// Compare the reconstructed class against the digest recorded in the
    /// patch header.
    pub verify_target: bool,
}

impl Default for PatcherConfig {
    fn default() -> Self {
        Self {
            align: AlignConfig::default(),
            zstd_level: 19,
            verify_target: true,
        }
    }
}
