//! Content digests of model values.
//!
//! Two strengths are provided: a domain-separated BLAKE3 [`Digest`] used to
//! pin a whole target class, and a CRC32 [`checksum`] used for per-operation
//! skew detection inside a patch. Both hash the bincode encoding of a value,
//! which is stable across platforms.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// A 32-byte BLAKE3 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Digest([u8; 32]);

impl Digest {
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 hex characters.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.short_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Domain-separated BLAKE3 hasher.
///
/// The domain tag is prepended to every computation, so a class and some
/// other value with identical encodings never share a digest.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Digest of a complete [`ClassNode`](crate::ClassNode).
    pub const CLASS: Self = Self {
        domain: "classdelta-class-v1",
    };

    pub fn hash(&self, data: &[u8]) -> Digest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        Digest::from_hash(*hasher.finalize().as_bytes())
    }

    /// Digest of the bincode encoding of `value`.
    pub fn fingerprint<T: Serialize + ?Sized>(&self, value: &T) -> ModelResult<Digest> {
        Ok(self.hash(&encode(value)?))
    }
}

/// CRC32 of the bincode encoding of `value`.
pub fn checksum<T: Serialize + ?Sized>(value: &T) -> ModelResult<u32> {
    Ok(crc32fast::hash(&encode(value)?))
}

/// CRC32 of a class's internal name, as recorded in patch headers.
pub fn name_checksum(name: &str) -> u32 {
    crc32fast::hash(name.as_bytes())
}

fn encode<T: Serialize + ?Sized>(value: &T) -> ModelResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| ModelError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassNode;
    use crate::member::Field;

    #[test]
    fn fingerprint_is_deterministic() {
        let class = ClassNode::new("a/B").with_field(Field::new(0, "x", "I"));
        let a = ContentHasher::CLASS.fingerprint(&class).unwrap();
        let b = ContentHasher::CLASS.fingerprint(&class.clone()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = ClassNode::new("a/B");
        let mut b = a.clone();
        b.access |= 0x0010;
        assert_ne!(
            ContentHasher::CLASS.fingerprint(&a).unwrap(),
            ContentHasher::CLASS.fingerprint(&b).unwrap()
        );
    }

    #[test]
    fn domain_prefixes_input() {
        let digest = ContentHasher::CLASS.hash(b"x");
        let plain = blake3::hash(b"x");
        assert_ne!(digest.as_bytes(), plain.as_bytes());
        assert_eq!(digest, ContentHasher::CLASS.hash(b"x"));
    }

    #[test]
    fn hex_forms() {
        let digest = ContentHasher::CLASS.hash(b"hex");
        let full = digest.to_hex();
        assert_eq!(full.len(), 64);
        assert_eq!(digest.to_string(), full);
        assert!(full.starts_with(&digest.short_hex()));
        assert_eq!(digest.short_hex().len(), 8);
    }

    #[test]
    fn checksum_distinguishes_slices() {
        let a = vec![Field::new(0, "a", "I")];
        let b = vec![Field::new(0, "b", "I")];
        assert_eq!(checksum(&a).unwrap(), checksum(&a.clone()).unwrap());
        assert_ne!(checksum(&a).unwrap(), checksum(&b).unwrap());
        assert_eq!(name_checksum("a/B"), crc32fast::hash(b"a/B"));
    }
}
