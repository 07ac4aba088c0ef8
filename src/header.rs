//! File header — format anchor at offset 0.
//!
//! # On-disk layout (72 bytes, all multi-byte fields little-endian)
//!
//! ```text
//! Offset  Size  Field
//!    0     28   signature          "Client UrlCache MMF Ver X.Y\0" (ASCII)
//!   28      4   file_size          (LE u32)
//!   32      4   hash_table_offset  (LE u32)
//!   36      4   number_of_blocks   (LE u32)
//!   40      4   number_of_allocated_blocks (LE u32)
//!   44      4   unknown1
//!   48      4   cache_size_limit
//!   52      4   unknown2
//!   56      4   cache_size
//!   60      4   unknown3
//!   64      4   non_releasable_cache_size
//!   68      4   unknown4
//! ```
//!
//! Only `file_size`, `hash_table_offset`, `number_of_blocks` and
//! `number_of_allocated_blocks` are surfaced; the remaining fields are
//! internal bookkeeping the original writer used for cache-quota accounting
//! and carry no parsing-relevant meaning here.

use std::io::Read;
use thiserror::Error;

pub const HEADER_SIZE: usize = 72;
pub const SIGNATURE_PREFIX: &[u8; 24] = b"Client UrlCache MMF Ver ";

#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("invalid format: signature does not match \"Client UrlCache MMF Ver X.Y\\0\"")]
    InvalidSignature,
    #[error("invalid format: unsupported format version {0}.{1}")]
    UnsupportedVersion(u8, u8),
    #[error("invalid format: hash_table_offset {hash_table_offset} >= file_size {file_size}")]
    HashTableOffsetOutOfRange { hash_table_offset: u32, file_size: u32 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub major_version: u8,
    pub minor_version: u8,
    pub file_size: u64,
    pub hash_table_offset: u32,
    pub total_blocks: u32,
    pub allocated_blocks: u32,
}

impl FileHeader {
    /// Read and validate the 72-byte header at `at`.
    pub fn read<R: Read>(mut r: R) -> Result<Self, HeaderError> {
        let mut buf = [0u8; HEADER_SIZE];
        r.read_exact(&mut buf)?;

        if &buf[0..24] != &SIGNATURE_PREFIX[..] {
            return Err(HeaderError::InvalidSignature);
        }

        // bytes 24/25/26 must be ASCII digit, '.', digit; byte 27 must be NUL.
        let major = buf[24];
        let dot = buf[25];
        let minor = buf[26];
        let nul = buf[27];
        if !major.is_ascii_digit() || dot != b'.' || !minor.is_ascii_digit() || nul != 0 {
            return Err(HeaderError::InvalidSignature);
        }
        let major_version = major - b'0';
        let minor_version = minor - b'0';
        if !matches!((major_version, minor_version), (4, 7) | (5, 2)) {
            return Err(HeaderError::UnsupportedVersion(major_version, minor_version));
        }

        let file_size = u32::from_le_bytes(buf[28..32].try_into().unwrap());
        let hash_table_offset = u32::from_le_bytes(buf[32..36].try_into().unwrap());
        let total_blocks = u32::from_le_bytes(buf[36..40].try_into().unwrap());
        let allocated_blocks = u32::from_le_bytes(buf[40..44].try_into().unwrap());

        if hash_table_offset >= file_size {
            return Err(HeaderError::HashTableOffsetOutOfRange { hash_table_offset, file_size });
        }

        Ok(FileHeader {
            major_version,
            minor_version,
            file_size: file_size as u64,
            hash_table_offset,
            total_blocks,
            allocated_blocks,
        })
    }

    pub fn format_version(&self) -> (u8, u8) {
        (self.major_version, self.minor_version)
    }
}
