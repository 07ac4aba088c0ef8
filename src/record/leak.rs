//! LEAK record decoder — the `"LEAK"` signature, fixed 96-byte header.
//!
//! LEAK entries mark cached files whose directory entry was lost (a "leaked"
//! file still occupying cache space). Only the fields the original format
//! exposes through its public LEAK accessors are surfaced here; the
//! remaining `unknown*` spans are deliberately not modeled as named fields.

use super::{check_min_len, RecordError};
use crate::string_field::{CodepageId, StringField};

const HEADER_SIZE: usize = 96;

#[derive(Debug, Clone, serde::Serialize)]
pub struct LeakValues {
    pub cached_file_size: u32,
    pub cache_directory_index: u8,
    pub filename: Option<StringField>,
    pub reserved_time: u32,
}

impl LeakValues {
    pub fn has_cache_directory(&self) -> bool {
        !matches!(self.cache_directory_index, 0xFE | 0xFF)
    }
}

/// Decode a `"LEAK"` record from `buf`, beginning at the record's declared
/// `file_offset`.
pub fn decode(buf: &[u8], codepage: CodepageId, is_partial: bool) -> Result<LeakValues, RecordError> {
    if buf.len() < 4 || &buf[0..4] != b"LEAK" {
        let mut found = [0u8; 4];
        found[..buf.len().min(4)].copy_from_slice(&buf[..buf.len().min(4)]);
        return Err(RecordError::BadSignature { expected: *b"LEAK", found });
    }
    check_min_len(buf, 64)?;

    let u32_at = |off: usize| u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());

    let cached_file_size = u32_at(32);
    let cache_directory_index = buf[56];
    let filename_offset = u32_at(60);
    let reserved_time = if buf.len() >= HEADER_SIZE { u32_at(92) } else { 0 };

    let buf_len = buf.len();
    let filename = if filename_offset == 0 {
        None
    } else {
        match super::check_offset("filename_offset", filename_offset, buf_len) {
            Ok(()) => Some(StringField::slice_from(buf, filename_offset, codepage, is_partial)?),
            Err(e) => {
                if is_partial {
                    None
                } else {
                    return Err(e);
                }
            }
        }
    };

    Ok(LeakValues { cached_file_size, cache_directory_index, filename, reserved_time })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leak_buf(filename: &[u8]) -> Vec<u8> {
        let filename_offset = 96u32;
        let mut buf = vec![0u8; filename_offset as usize + filename.len()];
        buf[0..4].copy_from_slice(b"LEAK");
        buf[4..8].copy_from_slice(&1u32.to_le_bytes());
        buf[32..36].copy_from_slice(&4096u32.to_le_bytes());
        buf[56] = 3;
        buf[60..64].copy_from_slice(&filename_offset.to_le_bytes());
        buf[filename_offset as usize..filename_offset as usize + filename.len()].copy_from_slice(filename);
        buf
    }

    #[test]
    fn decodes_leak_fields() {
        let buf = leak_buf(b"leaked.tmp\0");
        let values = decode(&buf, CodepageId::DEFAULT, false).unwrap();
        assert_eq!(values.cached_file_size, 4096);
        assert_eq!(values.cache_directory_index, 3);
        assert!(values.has_cache_directory());
        assert_eq!(values.filename.unwrap().to_utf8_string(), "leaked.tmp");
    }

    #[test]
    fn none_sentinel_cache_directory_index() {
        let mut buf = leak_buf(b"x\0");
        buf[56] = 0xFE;
        let values = decode(&buf, CodepageId::DEFAULT, false).unwrap();
        assert!(!values.has_cache_directory());
    }

    #[test]
    fn truncated_buffer_fails_cleanly_instead_of_panicking() {
        let buf = *b"LEAK\x01\0\0\0";
        assert!(matches!(decode(&buf, CodepageId::DEFAULT, true), Err(RecordError::TooShort { .. })));
    }

    #[test]
    fn non_partial_out_of_bounds_filename_offset_fails() {
        let mut buf = vec![0u8; 96];
        buf[0..4].copy_from_slice(b"LEAK");
        buf[60..64].copy_from_slice(&1000u32.to_le_bytes());
        let result = decode(&buf, CodepageId::DEFAULT, false);
        assert!(matches!(result, Err(RecordError::OffsetOutOfBounds { .. })));
    }
}
