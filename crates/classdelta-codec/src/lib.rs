//! Binary patch format for classdelta.
//!
//! A patch is a fixed header (see [`header`]), the [`ClassDiff`] body in
//! pre-order, and a CRC32 trailer over everything before it. Every edit
//! script in the body is introduced by a [`Level`] tag so that a decoder
//! reading the wrong structure fails immediately instead of misparsing.
//!
//! Decoding is all or nothing: any truncation, checksum failure, unknown
//! tag, out-of-range value or trailing byte yields
//! [`CodecError::CorruptPatch`] and no partial result.
//!
//! [`ClassDiff`]: classdelta_diff::ClassDiff

pub mod diff;
pub mod error;
pub mod header;
pub mod level;
pub mod model;
pub mod reader;
pub mod varint;
pub mod writer;

pub use error::{CodecError, CodecResult};
pub use header::{PatchHeader, FORMAT_VERSION, HEADER_LEN, MAGIC, TRAILER_LEN};
pub use level::Level;
pub use reader::{decode_patch, Decode, Patch, PatchReader};
pub use writer::{encode_patch, Encode, PatchWriter};
