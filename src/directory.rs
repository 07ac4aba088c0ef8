//! Cache directory table — the fixed table of on-disk subdirectory names.
//!
//! # On-disk layout (immediately following the file header, at offset 72)
//!
//! ```text
//! Offset  Size  Field
//!    0      4   number_of_cache_directories (LE u32)
//!    4   N×12   entries: 4-byte cached-file count, then 8-byte ASCII name
//! ```

use thiserror::Error;

use crate::byte_source::ByteSource;
use crate::MAX_ALLOC;

pub const ENTRY_SIZE: usize = 12;

#[derive(Error, Debug)]
pub enum DirectoryTableError {
    #[error("value out of bounds: cache directory count {count} would read {needed} bytes, exceeding MAX_ALLOC {max}")]
    CountExceedsMaxAlloc { count: u32, needed: u64, max: u64 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One entry in the cache directory table.
///
/// `name` is the raw 8-byte ASCII name, NUL-appended in memory to 9 bytes on
/// access via [`CacheDirectory::name_nul_terminated`]. `cached_file_count` is
/// retained as diagnostic metadata only — the core does not touch the payload
/// files that count refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDirectory {
    name: [u8; 8],
    pub cached_file_count: u32,
}

impl CacheDirectory {
    /// The 9-byte NUL-terminated name, matching the on-disk field width plus
    /// one byte for the terminator.
    pub fn name_nul_terminated(&self) -> [u8; 9] {
        let mut out = [0u8; 9];
        out[..8].copy_from_slice(&self.name);
        out
    }

    pub fn name_bytes(&self) -> &[u8; 8] {
        &self.name
    }
}

#[derive(Debug, Clone, Default)]
pub struct CacheDirectoryTable {
    entries: Vec<CacheDirectory>,
}

impl CacheDirectoryTable {
    /// Reads a 4-byte LE count `N` at `at`, then `N` 12-byte entries
    /// immediately following — directly off `src`, never buffering more of
    /// the file than the table itself needs (the count is validated against
    /// `MAX_ALLOC` before a single entry byte is read).
    pub fn read_table<S: ByteSource>(src: &mut S, at: u64) -> Result<Self, DirectoryTableError> {
        let mut count_buf = [0u8; 4];
        src.read_at(at, &mut count_buf)?;
        let count = u32::from_le_bytes(count_buf);

        let needed = 4u64 + (count as u64) * (ENTRY_SIZE as u64);
        if needed > MAX_ALLOC as u64 {
            return Err(DirectoryTableError::CountExceedsMaxAlloc {
                count,
                needed,
                max: MAX_ALLOC as u64,
            });
        }

        let mut entries_buf = vec![0u8; count as usize * ENTRY_SIZE];
        src.read_at(at + 4, &mut entries_buf)?;

        let mut entries = Vec::with_capacity(count as usize);
        for chunk in entries_buf.chunks_exact(ENTRY_SIZE) {
            let cached_file_count = u32::from_le_bytes(chunk[0..4].try_into().unwrap());
            let mut name = [0u8; 8];
            name.copy_from_slice(&chunk[4..12]);
            entries.push(CacheDirectory { name, cached_file_count });
        }

        Ok(CacheDirectoryTable { entries })
    }

    /// Reads the table from an in-memory buffer already positioned at its
    /// start (count, then `N` entries) — kept for callers that already hold
    /// the bytes (e.g. unit tests building a synthetic table in memory).
    pub fn read(buf: &[u8]) -> Result<Self, DirectoryTableError> {
        let mut src = std::io::Cursor::new(buf);
        Self::read_table(&mut src, 0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup_name(&self, index: usize) -> Option<[u8; 9]> {
        self.entries.get(index).map(CacheDirectory::name_nul_terminated)
    }

    pub fn get(&self, index: usize) -> Option<&CacheDirectory> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CacheDirectory> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_entries_in_order() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(&10u32.to_le_bytes());
        buf.extend_from_slice(b"ABCDEFG1");
        buf.extend_from_slice(&20u32.to_le_bytes());
        buf.extend_from_slice(b"HIJKLMN2");

        let table = CacheDirectoryTable::read(&buf).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0).unwrap().cached_file_count, 10);
        assert_eq!(&table.lookup_name(0).unwrap()[..8], b"ABCDEFG1");
        assert_eq!(table.lookup_name(0).unwrap()[8], 0);
        assert_eq!(table.get(1).unwrap().cached_file_count, 20);
    }

    #[test]
    fn rejects_count_exceeding_max_alloc() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(u32::MAX).to_le_bytes());
        assert!(matches!(
            CacheDirectoryTable::read(&buf),
            Err(DirectoryTableError::CountExceedsMaxAlloc { .. })
        ));
    }

    #[test]
    fn read_table_reads_directly_off_a_byte_source_at_an_offset() {
        let mut buf = vec![0xAAu8; 8]; // leading junk before the table
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&5u32.to_le_bytes());
        buf.extend_from_slice(b"DIRNAME1");
        let mut src = Cursor::new(buf);

        let table = CacheDirectoryTable::read_table(&mut src, 8).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0).unwrap().cached_file_count, 5);
    }
}
