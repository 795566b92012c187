//! Patch encoding.

use classdelta_diff::{ClassDiff, EditScript, Op};
use tracing::debug;

use crate::header::PatchHeader;
use crate::level::Level;
use crate::varint::{encode_varint, zigzag};

/// Values with a wire encoding.
pub trait Encode {
    fn encode(&self, w: &mut PatchWriter);
}

/// Append-only buffer with the primitive encodings of the patch format.
#[derive(Debug, Default)]
pub struct PatchWriter {
    buf: Vec<u8>,
}

impl PatchWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    pub fn varint(&mut self, value: u64) {
        encode_varint(&mut self.buf, value);
    }

    pub fn count(&mut self, value: usize) {
        self.varint(value as u64);
    }

    pub fn signed(&mut self, value: i64) {
        self.varint(zigzag(value));
    }

    pub fn fixed_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn fixed_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn bytes(&mut self, value: &[u8]) {
        self.count(value.len());
        self.buf.extend_from_slice(value);
    }

    pub fn put<T: Encode + ?Sized>(&mut self, value: &T) {
        value.encode(self);
    }

    /// Level tag, operation count, then each operation behind its kind tag.
    pub fn script<T: Encode, U: Encode>(&mut self, level: Level, script: &EditScript<T, U>) {
        self.u8(level as u8);
        self.count(script.ops.len());
        for op in &script.ops {
            match op {
                Op::Equal { count, checksum } => {
                    self.u8(0);
                    self.count(*count);
                    self.fixed_u32(*checksum);
                }
                Op::Insert(items) => {
                    self.u8(1);
                    self.put(items);
                }
                Op::Delete { count, checksum } => {
                    self.u8(2);
                    self.count(*count);
                    self.fixed_u32(*checksum);
                }
                Op::Update { checksum, change } => {
                    self.u8(3);
                    self.fixed_u32(*checksum);
                    self.put(change);
                }
            }
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Serialize a diff behind `header` and seal it with the CRC32 trailer.
pub fn encode_patch(header: &PatchHeader, diff: &ClassDiff) -> Vec<u8> {
    let mut w = PatchWriter::new();
    header.write(&mut w.buf);
    w.put(diff);
    let mut bytes = w.into_bytes();
    let crc = crc32fast::hash(&bytes);
    bytes.extend_from_slice(&crc.to_be_bytes());
    debug!(bytes = bytes.len(), crc = %format!("{crc:08x}"), "encoded patch");
    bytes
}
