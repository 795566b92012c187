//! Byte-level deltas for attributes the model does not interpret.

use crate::error::{DiffError, DiffResult};

/// Largest target blob accepted by [`ZstdDelta::diff`] and [`ZstdDelta::apply`].
pub const MAX_BLOB_LEN: usize = 64 * 1024 * 1024;

/// Encodes `new` relative to `old` and back.
pub trait ByteDelta {
    fn diff(&self, old: &[u8], new: &[u8]) -> DiffResult<Vec<u8>>;

    /// Reconstruct the new bytes; fails with [`DiffError::CorruptBlob`] when
    /// `delta` was not produced against `old`.
    fn apply(&self, old: &[u8], delta: &[u8]) -> DiffResult<Vec<u8>>;
}

/// zstd with the old bytes as a raw-content dictionary.
///
/// Blob layout: `crc32(old)` (u32 BE), `new.len()` (u32 BE), zstd frame.
#[derive(Clone, Copy, Debug)]
pub struct ZstdDelta {
    pub level: i32,
}

impl Default for ZstdDelta {
    fn default() -> Self {
        Self { level: 19 }
    }
}

impl ZstdDelta {
    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

const HEADER_LEN: usize = 8;

impl ByteDelta for ZstdDelta {
    fn diff(&self, old: &[u8], new: &[u8]) -> DiffResult<Vec<u8>> {
        if new.len() > MAX_BLOB_LEN {
            return Err(DiffError::CorruptBlob(format!(
                "blob of {} bytes exceeds {MAX_BLOB_LEN}",
                new.len()
            )));
        }
        let new_len = new.len() as u32;
        let frame = if old.is_empty() {
            zstd::bulk::compress(new, self.level)
        } else {
            zstd::bulk::Compressor::with_dictionary(self.level, old).and_then(|mut c| c.compress(new))
        }
        .map_err(|e| DiffError::CorruptBlob(format!("zstd compression failed: {e}")))?;

        let mut out = Vec::with_capacity(HEADER_LEN + frame.len());
        out.extend_from_slice(&crc32fast::hash(old).to_be_bytes());
        out.extend_from_slice(&new_len.to_be_bytes());
        out.extend_from_slice(&frame);
        Ok(out)
    }

    fn apply(&self, old: &[u8], delta: &[u8]) -> DiffResult<Vec<u8>> {
        if delta.len() < HEADER_LEN {
            return Err(DiffError::CorruptBlob(format!(
                "blob of {} bytes shorter than its header",
                delta.len()
            )));
        }
        let (header, frame) = delta.split_at(HEADER_LEN);
        let expected_crc = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        let new_len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]) as usize;

        let actual_crc = crc32fast::hash(old);
        if actual_crc != expected_crc {
            return Err(DiffError::CorruptBlob(format!(
                "base checksum {actual_crc:08x} does not match {expected_crc:08x}"
            )));
        }
        if new_len > MAX_BLOB_LEN {
            return Err(DiffError::CorruptBlob(format!(
                "declared length {new_len} exceeds {MAX_BLOB_LEN}"
            )));
        }

        let bytes = if old.is_empty() {
            zstd::bulk::decompress(frame, new_len)
        } else {
            zstd::bulk::Decompressor::with_dictionary(old).and_then(|mut d| d.decompress(frame, new_len))
        }
        .map_err(|e| DiffError::CorruptBlob(format!("zstd decompression failed: {e}")))?;

        if bytes.len() != new_len {
            return Err(DiffError::CorruptBlob(format!(
                "decoded {} bytes, expected {new_len}",
                bytes.len()
            )));
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconstructs_new_bytes() {
        let old: Vec<u8> = (0..4096u32).map(|i| (i * 7 % 251) as u8).collect();
        let mut new = old.clone();
        new[100] ^= 0xff;
        new.extend_from_slice(b"tail");

        let delta = ZstdDelta::default();
        let blob = delta.diff(&old, &new).unwrap();
        assert!(blob.len() < new.len());
        assert_eq!(delta.apply(&old, &blob).unwrap(), new);
    }

    #[test]
    fn empty_base_and_empty_target() {
        let delta = ZstdDelta::new(3);
        let blob = delta.diff(&[], b"fresh").unwrap();
        assert_eq!(delta.apply(&[], &blob).unwrap(), b"fresh");

        let blob = delta.diff(b"gone", &[]).unwrap();
        assert!(delta.apply(b"gone", &blob).unwrap().is_empty());
    }

    #[test]
    fn wrong_base_is_corrupt() {
        let delta = ZstdDelta::default();
        let blob = delta.diff(b"original base", b"new content").unwrap();
        assert!(matches!(
            delta.apply(b"different base", &blob),
            Err(DiffError::CorruptBlob(_))
        ));
    }

    #[test]
    fn oversized_target_rejected_when_diffing() {
        let delta = ZstdDelta::new(1);
        let huge = vec![0u8; MAX_BLOB_LEN + 1];
        match delta.diff(b"base", &huge) {
            Err(DiffError::CorruptBlob(reason)) => assert!(reason.contains("exceeds"), "{reason}"),
            other => panic!("expected CorruptBlob, got {other:?}"),
        }
    }

    #[test]
    fn truncated_blob_is_corrupt() {
        let delta = ZstdDelta::default();
        assert!(matches!(delta.apply(b"x", &[0, 1]), Err(DiffError::CorruptBlob(_))));

        let blob = delta.diff(b"base", b"some new content here").unwrap();
        assert!(matches!(
            delta.apply(b"base", &blob[..blob.len() - 3]),
            Err(DiffError::CorruptBlob(_))
        ));
    }
}
