use std::fmt;

use classdelta_codec::{decode_patch, encode_patch, Patch, PatchHeader, FORMAT_VERSION};
use classdelta_diff::{apply_diff, diff_classes, DiffOptions, DiffStats, ZstdDelta};
use classdelta_model::{name_checksum, ClassNode, ContentHasher, Digest};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::PatcherConfig;
use crate::error::{SdkError, SdkResult};

/// An encoded patch.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PatchBytes(Vec<u8>);

impl PatchBytes {
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for PatchBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PatchBytes({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for PatchBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for PatchBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// What a patch contains, without applying it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSummary {
    pub format_version: u16,
    pub size: usize,
    pub source_name_hash: u32,
    pub target_name_hash: u32,
    pub target_digest: Digest,
    pub stats: DiffStats,
}

/// Validated diff and apply over encoded patches.
#[derive(Clone, Debug, Default)]
pub struct ClassPatcher {
    config: PatcherConfig,
    delta: ZstdDelta,
}

impl ClassPatcher {
    pub fn new(config: PatcherConfig) -> Self {
        let delta = ZstdDelta::new(config.zstd_level);
        Self { config, delta }
    }

    pub fn config(&self) -> &PatcherConfig {
        &self.config
    }

    /// Encode the edit from `old` to `new`. Both trees are validated first.
    pub fn diff(&self, old: &ClassNode, new: &ClassNode) -> SdkResult<PatchBytes> {
        old.validate()?;
        new.validate()?;

        let options = DiffOptions {
            align: self.config.align.clone(),
        };
        let diff = diff_classes(old, new, &options, &self.delta)?;
        let header = PatchHeader {
            source_name_hash: name_checksum(&old.name),
            target_name_hash: name_checksum(&new.name),
            target_digest: ContentHasher::CLASS.fingerprint(new)?,
        };
        let bytes = encode_patch(&header, &diff);
        info!(
            class = %new.name,
            bytes = bytes.len(),
            digest = %header.target_digest.short_hex(),
            "patch created"
        );
        Ok(PatchBytes(bytes))
    }

    /// Reconstruct the target of `patch` from `source`.
    ///
    /// Fails before touching the tree if `source` is malformed or carries a
    /// different class name than the one the patch was made from. With
    /// `verify_target`, the result must match the digest in the header.
    pub fn apply(&self, source: &ClassNode, patch: &PatchBytes) -> SdkResult<ClassNode> {
        source.validate()?;
        let Patch { header, diff } = decode_patch(patch.as_bytes())?;

        let source_hash = name_checksum(&source.name);
        if source_hash != header.source_name_hash {
            return Err(SdkError::StructuralMismatch {
                level: "header.source_name".into(),
                expected: format!("{:08x}", header.source_name_hash),
                actual: format!("{source_hash:08x} ({})", source.name),
            });
        }

        let target = apply_diff(source, &diff, &self.delta)?;

        if self.config.verify_target {
            let digest = ContentHasher::CLASS.fingerprint(&target)?;
            if digest != header.target_digest {
                return Err(SdkError::StructuralMismatch {
                    level: "target.digest".into(),
                    expected: header.target_digest.to_hex(),
                    actual: digest.to_hex(),
                });
            }
            debug!(digest = %digest.short_hex(), "target digest verified");
        }

        info!(class = %target.name, bytes = patch.len(), "patch applied");
        Ok(target)
    }

    /// Decode `patch` and summarize its header and edit counts.
    pub fn inspect(&self, patch: &PatchBytes) -> SdkResult<PatchSummary> {
        let Patch { header, diff } = decode_patch(patch.as_bytes())?;
        Ok(PatchSummary {
            format_version: FORMAT_VERSION,
            size: patch.len(),
            source_name_hash: header.source_name_hash,
            target_name_hash: header.target_name_hash,
            target_digest: header.target_digest,
            stats: diff.stats(),
        })
    }
}
