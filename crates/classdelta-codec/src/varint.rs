//! LEB128 varints and zigzag mapping for signed values.

use crate::error::{CodecError, CodecResult};

/// Encode a u64 as a variable-length integer.
pub(crate) fn encode_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Decode a variable-length integer starting at absolute `offset`.
/// Returns (value, bytes_consumed).
pub(crate) fn decode_varint(data: &[u8], offset: usize) -> CodecResult<(u64, usize)> {
    let mut value: u64 = 0;
    let mut shift = 0;
    for (i, &byte) in data.iter().enumerate() {
        if shift == 63 && byte > 1 {
            return Err(CodecError::corrupt(offset, "varint overflow"));
        }
        value |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
        shift += 7;
        if shift > 63 {
            return Err(CodecError::corrupt(offset, "varint overflow"));
        }
    }
    Err(CodecError::corrupt(offset, "truncated varint"))
}

pub(crate) fn zigzag(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

pub(crate) fn unzigzag(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_roundtrip_small() {
        let mut buf = Vec::new();
        encode_varint(&mut buf, 42);
        assert_eq!(buf.len(), 1);
        assert_eq!(decode_varint(&buf, 0).unwrap(), (42, 1));
    }

    #[test]
    fn varint_roundtrip_extremes() {
        for value in [0, 127, 128, 1_000_000, u64::MAX] {
            let mut buf = Vec::new();
            encode_varint(&mut buf, value);
            assert_eq!(decode_varint(&buf, 0).unwrap(), (value, buf.len()));
        }
    }

    #[test]
    fn varint_truncated() {
        let err = decode_varint(&[0x80, 0x80], 17).unwrap_err();
        assert_eq!(
            err,
            CodecError::CorruptPatch {
                offset: 17,
                reason: "truncated varint".into()
            }
        );
    }

    #[test]
    fn varint_overflow() {
        let mut bytes = vec![0xFF; 9];
        bytes.push(0x02);
        assert!(matches!(
            decode_varint(&bytes, 0),
            Err(CodecError::CorruptPatch { .. })
        ));
        assert!(decode_varint(&[0xFF; 11], 0).is_err());
    }

    #[test]
    fn zigzag_small_magnitudes_stay_small() {
        assert_eq!(zigzag(0), 0);
        assert_eq!(zigzag(-1), 1);
        assert_eq!(zigzag(1), 2);
        for value in [i64::MIN, -300, -1, 0, 1, 300, i64::MAX] {
            assert_eq!(unzigzag(zigzag(value)), value);
        }
    }
}
