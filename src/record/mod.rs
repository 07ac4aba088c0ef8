//! Record-variant decoders: given an [`crate::item::ItemDescriptor`] and the
//! raw bytes it names, parse the signature-specific header and string tails.

pub mod leak;
pub mod redr;
pub mod url;
pub mod url_kind;

use thiserror::Error;

/// 100-ns intervals since 1601-01-01 UTC, surfaced raw — `0x7FFFFFFFFFFFFFFF`
/// means "never" and is never converted.
pub type FileTime = u64;

/// Packed MS-DOS date/time (see [`crate::string_field`] for string handling;
/// FAT values have no analogous module here since they're never decoded to a
/// calendar type in the core — `0xFFFFFFFF` means "never", surfaced raw).
pub type FatDateTime = u32;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("invalid format: expected signature {expected:?}, found {found:?}")]
    BadSignature { expected: [u8; 4], found: [u8; 4] },
    #[error("value out of bounds: offset {field} = {offset} exceeds buffer length {buf_len}")]
    OffsetOutOfBounds { field: &'static str, offset: u32, buf_len: usize },
    #[error("value out of bounds: data_offset {data_offset} + data_size {data_size} exceeds buffer length {buf_len}")]
    DataSliceOutOfBounds { data_offset: u32, data_size: u32, buf_len: usize },
    #[error("value out of bounds: record buffer of {actual} bytes is shorter than the {needed}-byte fixed header")]
    TooShort { needed: usize, actual: usize },
    #[error(transparent)]
    StringField(#[from] crate::string_field::StringFieldError),
}

/// Validates that `buf` is at least `needed` bytes before any fixed-offset
/// field read touches it. A record whose declared block count left it
/// shorter than its own fixed header is corrupt, not a panic waiting to
/// happen.
pub(crate) fn check_min_len(buf: &[u8], needed: usize) -> Result<(), RecordError> {
    if buf.len() < needed {
        return Err(RecordError::TooShort { needed, actual: buf.len() });
    }
    Ok(())
}

/// Validates an offset field against the buffer length. A zero offset means
/// "absent" and is never validated; a non-zero offset must be strictly less
/// than `buf_len`.
pub(crate) fn check_offset(field: &'static str, offset: u32, buf_len: usize) -> Result<(), RecordError> {
    if offset != 0 && offset as usize >= buf_len {
        return Err(RecordError::OffsetOutOfBounds { field, offset, buf_len });
    }
    Ok(())
}
