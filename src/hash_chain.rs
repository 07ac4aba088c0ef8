//! HASH chain walker — validates the linked-list structure of hash-table
//! records without being load-bearing for item discovery (the
//! [`crate::scanner`] discovers records independently; see module docs there).
//!
//! # HASH record header (16 bytes)
//!
//! ```text
//! Offset  Size  Field
//!    0      4   signature           "HASH"
//!    4      4   number_of_blocks    (LE u32)
//!    8      4   next_offset         (LE u32, 0 = end of chain)
//!   12      4   sequence_number     (LE u32)
//! ```
//!
//! Body entries follow the header, 8 bytes each: `(hash: u32, target_offset: u32)`.

use byteorder::{LittleEndian, ReadBytesExt};
use thiserror::Error;

use crate::byte_source::ByteSource;

pub const HASH_HEADER_SIZE: usize = 16;
pub const ENTRY_SIZE: usize = 8;
pub const MAX_HASH_DEPTH: u32 = 128;

const SENTINEL_BADFOOD: u32 = 0x0BAD_F00D;
const SENTINEL_DEADBEEF: u32 = 0xDEAD_BEEF;

#[derive(Error, Debug)]
pub enum HashChainError {
    #[error("invalid format: HASH record at {offset} has bad signature")]
    BadSignature { offset: u64 },
    #[error("invalid format: HASH record at {offset} body size is not a non-zero multiple of 8")]
    MisalignedBody { offset: u64 },
    #[error("value out of bounds: HASH chain exceeds MAX_HASH_DEPTH ({MAX_HASH_DEPTH})")]
    DepthExceeded,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashEntry {
    pub hash: u32,
    pub target_offset: u32,
}

/// Returns `true` when an entry looks like filler or a malformed slot rather
/// than a real hash-table entry.
fn is_filtered(entry: &HashEntry, block_size: u32) -> bool {
    entry.hash == entry.target_offset
        || entry.hash == SENTINEL_BADFOOD
        || entry.hash == SENTINEL_DEADBEEF
        || (entry.hash & 0x0F) == 0x01
        || entry.target_offset % block_size != 0
}

/// Walk the HASH chain starting at `head_offset`, validating structure.
///
/// Bounded to `MAX_HASH_DEPTH` records. Returns every entry that passes the
/// filter, in chain-traversal order. This is purely a structural validation
/// pass — the `RecordScanner` is authoritative for item discovery and does
/// not consult this output.
pub fn walk_hash_chain<S: ByteSource>(
    src: &mut S,
    head_offset: u64,
    block_size: u32,
) -> Result<Vec<HashEntry>, HashChainError> {
    let mut entries = Vec::new();
    let mut offset = head_offset;
    let mut depth = 0u32;

    loop {
        if depth >= MAX_HASH_DEPTH {
            return Err(HashChainError::DepthExceeded);
        }
        depth += 1;

        let mut header = [0u8; HASH_HEADER_SIZE];
        src.read_at(offset, &mut header)?;

        if &header[0..4] != b"HASH" {
            return Err(HashChainError::BadSignature { offset });
        }
        let number_of_blocks = (&header[4..8]).read_u32::<LittleEndian>()?;
        let next_offset = (&header[8..12]).read_u32::<LittleEndian>()?;

        let record_size = number_of_blocks as u64 * block_size as u64;
        if record_size < HASH_HEADER_SIZE as u64 {
            return Err(HashChainError::MisalignedBody { offset });
        }
        let body_size = record_size - HASH_HEADER_SIZE as u64;
        if body_size == 0 || body_size % ENTRY_SIZE as u64 != 0 {
            return Err(HashChainError::MisalignedBody { offset });
        }

        let num_entries = body_size / ENTRY_SIZE as u64;
        let mut entry_buf = vec![0u8; body_size as usize];
        src.read_at(offset + HASH_HEADER_SIZE as u64, &mut entry_buf)?;

        for i in 0..num_entries as usize {
            let base = i * ENTRY_SIZE;
            let hash = u32::from_le_bytes(entry_buf[base..base + 4].try_into().unwrap());
            let target_offset = u32::from_le_bytes(entry_buf[base + 4..base + 8].try_into().unwrap());
            let entry = HashEntry { hash, target_offset };
            if !is_filtered(&entry, block_size) {
                entries.push(entry);
            }
        }

        if next_offset == 0 {
            break;
        }
        // A self-loop (next_offset == offset) would otherwise spin forever;
        // the depth bound below catches it within MAX_HASH_DEPTH iterations.
        offset = next_offset as u64;
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn hash_record(next_offset: u32, entries: &[(u32, u32)], block_size: u32) -> Vec<u8> {
        let body_size = entries.len() * ENTRY_SIZE;
        let total = HASH_HEADER_SIZE + body_size;
        let num_blocks = (total as u32).div_ceil(block_size);
        let mut buf = vec![0u8; num_blocks as usize * block_size as usize];
        buf[0..4].copy_from_slice(b"HASH");
        buf[4..8].copy_from_slice(&num_blocks.to_le_bytes());
        buf[8..12].copy_from_slice(&next_offset.to_le_bytes());
        buf[12..16].copy_from_slice(&1u32.to_le_bytes());
        for (i, (hash, target)) in entries.iter().enumerate() {
            let base = HASH_HEADER_SIZE + i * ENTRY_SIZE;
            buf[base..base + 4].copy_from_slice(&hash.to_le_bytes());
            buf[base + 4..base + 8].copy_from_slice(&target.to_le_bytes());
        }
        buf
    }

    #[test]
    fn terminates_on_next_offset_zero() {
        let block_size = 128;
        let buf = hash_record(0, &[(0xAAAA_AAAA, 128), (1, 2)], block_size);
        let mut src = Cursor::new(buf);
        let entries = walk_hash_chain(&mut src, 0, block_size).unwrap();
        // (1, 2) is filtered: target 2 isn't aligned to block_size.
        assert_eq!(entries, vec![HashEntry { hash: 0xAAAA_AAAA, target_offset: 128 }]);
    }

    #[test]
    fn self_loop_terminates_with_depth_exceeded() {
        // A single HASH record at offset 128 whose next_offset points at itself.
        let mut data = vec![0u8; 256];
        data[128..132].copy_from_slice(b"HASH");
        data[132..136].copy_from_slice(&1u32.to_le_bytes()); // number_of_blocks
        data[136..140].copy_from_slice(&128u32.to_le_bytes()); // next_offset = self
        data[140..144].copy_from_slice(&1u32.to_le_bytes()); // sequence_number

        let mut src = Cursor::new(data);
        let result = walk_hash_chain(&mut src, 128, 128);
        assert!(matches!(result, Err(HashChainError::DepthExceeded)));
    }
}
