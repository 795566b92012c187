//! Fixed-size patch header and trailer.
//!
//! ```text
//! magic                 "CDLT"      4 bytes
//! format version        u16 BE      2 bytes
//! source name hash      u32 BE      4 bytes   CRC32 of the source class name
//! target name hash      u32 BE      4 bytes   CRC32 of the target class name
//! target digest         [u8; 32]   32 bytes   BLAKE3 fingerprint of the target tree
//! body                  ...                   pre-order ClassDiff
//! trailer               u32 BE      4 bytes   CRC32 of every preceding byte
//! ```

use classdelta_model::Digest;
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

pub const MAGIC: &[u8; 4] = b"CDLT";
pub const FORMAT_VERSION: u16 = 1;
pub const HEADER_LEN: usize = 46;
pub const TRAILER_LEN: usize = 4;

/// Identifies the source a patch applies to and the target it produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchHeader {
    pub source_name_hash: u32,
    pub target_name_hash: u32,
    pub target_digest: Digest,
}

impl PatchHeader {
    pub(crate) fn write(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(MAGIC);
        buf.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
        buf.extend_from_slice(&self.source_name_hash.to_be_bytes());
        buf.extend_from_slice(&self.target_name_hash.to_be_bytes());
        buf.extend_from_slice(self.target_digest.as_bytes());
    }

    /// Check magic, version, length and trailer, then parse the header.
    ///
    /// Magic and version are checked before length and trailer, so a patch
    /// in a newer format reports [`CodecError::UnsupportedVersion`].
    pub fn read(bytes: &[u8]) -> CodecResult<Self> {
        if bytes.len() < MAGIC.len() {
            return Err(CodecError::corrupt(0, "patch too short for magic"));
        }
        if &bytes[..4] != MAGIC {
            return Err(CodecError::InvalidMagic {
                expected: String::from_utf8_lossy(MAGIC).into(),
                actual: String::from_utf8_lossy(&bytes[..4]).into(),
            });
        }
        if bytes.len() < 6 {
            return Err(CodecError::corrupt(4, "patch too short for version"));
        }
        let version = u16::from_be_bytes([bytes[4], bytes[5]]);
        if version != FORMAT_VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }
        if bytes.len() < HEADER_LEN + TRAILER_LEN {
            return Err(CodecError::corrupt(
                bytes.len(),
                format!("patch of {} bytes shorter than header and trailer", bytes.len()),
            ));
        }

        let trailer_at = bytes.len() - TRAILER_LEN;
        let expected = be_u32(&bytes[trailer_at..]);
        let actual = crc32fast::hash(&bytes[..trailer_at]);
        if actual != expected {
            return Err(CodecError::corrupt(
                trailer_at,
                format!("trailer checksum {actual:08x} does not match {expected:08x}"),
            ));
        }

        let mut digest = [0u8; 32];
        digest.copy_from_slice(&bytes[14..HEADER_LEN]);
        Ok(Self {
            source_name_hash: be_u32(&bytes[6..10]),
            target_name_hash: be_u32(&bytes[10..14]),
            target_digest: Digest::from_hash(digest),
        })
    }
}

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
