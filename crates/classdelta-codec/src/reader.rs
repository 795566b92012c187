//! Patch decoding.
//!
//! Every read is bounds-checked against the body; declared lengths and
//! element counts may not exceed the bytes that remain, so allocations are
//! bounded by the input size. Any failure aborts the whole decode.

use classdelta_diff::{ClassDiff, EditScript, Op};
use classdelta_model::MAX_ANNOTATION_DEPTH;
use tracing::debug;

use crate::error::{CodecError, CodecResult};
use crate::header::{PatchHeader, HEADER_LEN, TRAILER_LEN};
use crate::level::Level;
use crate::varint::{decode_varint, unzigzag};

/// Values with a wire decoding.
pub trait Decode: Sized {
    fn decode(r: &mut PatchReader<'_>) -> CodecResult<Self>;
}

/// A decoded patch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Patch {
    pub header: PatchHeader,
    pub diff: ClassDiff,
}

/// Cursor over a patch body.
#[derive(Debug)]
pub struct PatchReader<'a> {
    data: &'a [u8],
    pos: usize,
    end: usize,
    depth: usize,
}

impl<'a> PatchReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_range(data, 0, data.len())
    }

    fn with_range(data: &'a [u8], pos: usize, end: usize) -> Self {
        Self {
            data,
            pos,
            end,
            depth: 0,
        }
    }

    /// Absolute offset of the next byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.end - self.pos
    }

    pub fn corrupt(&self, reason: impl Into<String>) -> CodecError {
        CodecError::corrupt(self.pos, reason)
    }

    fn take(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        if n > self.remaining() {
            return Err(self.corrupt(format!(
                "need {n} bytes, {} remaining",
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn u8(&mut self) -> CodecResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn bool(&mut self) -> CodecResult<bool> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(self.corrupt(format!("invalid bool byte {other}"))),
        }
    }

    pub fn varint(&mut self) -> CodecResult<u64> {
        let (value, consumed) = decode_varint(&self.data[self.pos..self.end], self.pos)?;
        self.pos += consumed;
        Ok(value)
    }

    fn unsigned_as<T: TryFrom<u64>>(&mut self, what: &str) -> CodecResult<T> {
        let at = self.pos;
        let value = self.varint()?;
        T::try_from(value)
            .map_err(|_| CodecError::corrupt(at, format!("{value} out of {what} range")))
    }

    fn signed_as<T: TryFrom<i64>>(&mut self, what: &str) -> CodecResult<T> {
        let at = self.pos;
        let value = self.signed()?;
        T::try_from(value)
            .map_err(|_| CodecError::corrupt(at, format!("{value} out of {what} range")))
    }

    /// A varint that must fit `usize` without other bound.
    pub fn usize(&mut self) -> CodecResult<usize> {
        self.unsigned_as("usize")
    }

    /// A length or element count; each counted item takes at least one byte.
    pub fn count(&mut self) -> CodecResult<usize> {
        let at = self.pos;
        let value = self.varint()?;
        if value > self.remaining() as u64 {
            return Err(CodecError::corrupt(
                at,
                format!(
                    "declared length {value} exceeds {} remaining bytes",
                    self.remaining()
                ),
            ));
        }
        Ok(value as usize)
    }

    pub fn signed(&mut self) -> CodecResult<i64> {
        Ok(unzigzag(self.varint()?))
    }

    pub fn i8(&mut self) -> CodecResult<i8> {
        self.signed_as("i8")
    }

    pub fn i16(&mut self) -> CodecResult<i16> {
        self.signed_as("i16")
    }

    pub fn i32(&mut self) -> CodecResult<i32> {
        self.signed_as("i32")
    }

    pub fn u16(&mut self) -> CodecResult<u16> {
        self.unsigned_as("u16")
    }

    pub fn u32(&mut self) -> CodecResult<u32> {
        self.unsigned_as("u32")
    }

    pub fn fixed_u32(&mut self) -> CodecResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn fixed_u64(&mut self) -> CodecResult<u64> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_be_bytes(buf))
    }

    pub fn bytes(&mut self) -> CodecResult<Vec<u8>> {
        let len = self.count()?;
        Ok(self.take(len)?.to_vec())
    }

    pub fn string(&mut self) -> CodecResult<String> {
        let at = self.pos;
        let bytes = self.bytes()?;
        String::from_utf8(bytes)
            .map_err(|e| CodecError::corrupt(at, format!("invalid UTF-8: {e}")))
    }

    pub fn get<T: Decode>(&mut self) -> CodecResult<T> {
        T::decode(self)
    }

    /// Run `f` one nesting level deeper, failing past the depth limit.
    pub fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> CodecResult<T>) -> CodecResult<T> {
        if self.depth >= MAX_ANNOTATION_DEPTH {
            return Err(self.corrupt(format!("nesting deeper than {MAX_ANNOTATION_DEPTH}")));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    /// Inverse of [`PatchWriter::script`](crate::PatchWriter::script).
    pub fn script<T: Decode, U: Decode>(
        &mut self,
        level: Level,
    ) -> CodecResult<EditScript<T, U>> {
        let at = self.pos;
        let tag = self.u8()?;
        if tag != level as u8 {
            return Err(CodecError::corrupt(
                at,
                format!("expected {} script, found level tag {tag}", level.name()),
            ));
        }
        let count = self.count()?;
        let mut ops = Vec::with_capacity(count);
        for _ in 0..count {
            let at = self.pos;
            let op = match self.u8()? {
                0 => Op::Equal {
                    count: self.usize()?,
                    checksum: self.fixed_u32()?,
                },
                1 => Op::Insert(self.get()?),
                2 => Op::Delete {
                    count: self.usize()?,
                    checksum: self.fixed_u32()?,
                },
                3 => Op::Update {
                    checksum: self.fixed_u32()?,
                    change: self.get()?,
                },
                other => {
                    return Err(CodecError::corrupt(
                        at,
                        format!("unknown operation tag {other} in {} script", level.name()),
                    ))
                }
            };
            ops.push(op);
        }
        Ok(EditScript { ops })
    }

    /// Fail unless the whole body was consumed.
    pub fn finish(&self) -> CodecResult<()> {
        if self.pos != self.end {
            return Err(self.corrupt(format!("{} trailing bytes", self.remaining())));
        }
        Ok(())
    }
}

/// Parse and verify a complete patch. Never returns a partial result.
pub fn decode_patch(bytes: &[u8]) -> CodecResult<Patch> {
    let header = PatchHeader::read(bytes)?;
    let mut r = PatchReader::with_range(bytes, HEADER_LEN, bytes.len() - TRAILER_LEN);
    let diff = r.get()?;
    r.finish()?;
    debug!(bytes = bytes.len(), "decoded patch");
    Ok(Patch { header, diff })
}
