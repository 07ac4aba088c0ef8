//! Record scanner — linear block-by-block scan over the record region.
//!
//! Ported from the index-bypass recovery scan: every record is discovered by
//! its own signature and declared block count, never by following the
//! directory/hash-table index. The scanner produces two ordered lists: live
//! items (inside allocation-bitmap-allocated ranges) and recovered items
//! (inside unallocated ranges, including partial fragments truncated by a
//! later record).
//!
//! # HASH records are never emitted
//!
//! A `"HASH"` signature always interrupts whatever deferred unallocated
//! record preceded it (same as any other recognized signature), but it never
//! produces an `ItemDescriptor` of its own — hash-table nodes are metadata,
//! not user-visible cache items. The scanner treats it as a pure skip of
//! `number_of_blocks` blocks, in either allocation state; the alternative —
//! deferring a HASH node through the unallocated accumulator and then
//! discarding it at emission time — produces the same observable descriptor
//! lists with more bookkeeping.

use thiserror::Error;

use crate::bitmap::UnallocatedRanges;
use crate::byte_source::ByteSource;
use crate::item::{ItemDescriptor, ItemFlags, ItemKind};

#[derive(Error, Debug)]
pub enum ScannerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("operation aborted")]
    Aborted,
}

fn classify(signature: &[u8]) -> Option<ItemKind> {
    match signature {
        b"URL " => Some(ItemKind::Url),
        b"REDR" => Some(ItemKind::Redirected),
        b"LEAK" => Some(ItemKind::Leak),
        b"HASH" => Some(ItemKind::Undefined),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListRef {
    Live(usize),
    Recovered(usize),
}

pub struct ScanResult {
    pub live: Vec<ItemDescriptor>,
    pub recovered: Vec<ItemDescriptor>,
}

/// Scan the record region `[start, file_size)`, emitting live and recovered
/// item descriptors in ascending file-offset order.
///
/// `abort` is polled once per loop iteration (cooperative cancellation,
/// not preemptive); when it returns `true` the scan stops early with
/// [`ScannerError::Aborted`].
pub fn scan_records<S: ByteSource>(
    src: &mut S,
    start: u64,
    file_size: u64,
    block_size: u32,
    unallocated: &UnallocatedRanges,
    mut abort: impl FnMut() -> bool,
) -> Result<ScanResult, ScannerError> {
    let mut live: Vec<ItemDescriptor> = Vec::new();
    let mut recovered: Vec<ItemDescriptor> = Vec::new();

    let mut pos = start;
    let mut remaining: u64 = 0;
    let mut current_kind = ItemKind::Undefined;
    let mut current_start: u64 = 0;
    let mut last: Option<ListRef> = None;

    while pos < file_size {
        if abort() {
            return Err(ScannerError::Aborted);
        }

        let mut head = [0u8; 8];
        src.read_at(pos, &mut head)?;
        let signature = &head[0..4];
        let raw_num_blocks = u32::from_le_bytes(head[4..8].try_into().unwrap());
        let new_kind = classify(signature);
        let signals_new = new_kind.is_some();

        if signals_new && remaining > 0 {
            // The previously deferred unallocated record was truncated by
            // this new signature. Emit the consumed prefix as Partial +
            // Recovered, then taint whatever was emitted immediately before it.
            let frag_len = (pos - current_start) as u32;
            recovered.push(ItemDescriptor {
                kind: current_kind,
                file_offset: current_start,
                record_size: frag_len,
                flags: ItemFlags::PARTIAL | ItemFlags::RECOVERED,
            });
            let prev_last = last.replace(ListRef::Recovered(recovered.len() - 1));
            if let Some(prev) = prev_last {
                taint(&mut live, &mut recovered, prev);
            }
            remaining = 0;
            current_kind = ItemKind::Undefined;
        }

        if !signals_new {
            if remaining == 0 {
                pos += block_size as u64;
            } else {
                pos += block_size as u64;
                remaining = remaining.saturating_sub(block_size as u64);
                if remaining == 0 {
                    let record_size = (pos - current_start) as u32;
                    recovered.push(ItemDescriptor {
                        kind: current_kind,
                        file_offset: current_start,
                        record_size,
                        flags: ItemFlags::RECOVERED,
                    });
                    last = Some(ListRef::Recovered(recovered.len() - 1));
                    current_kind = ItemKind::Undefined;
                }
            }
            continue;
        }

        let new_kind = new_kind.unwrap();

        let max_blocks = (file_size - pos) / block_size as u64;
        let num_blocks = if raw_num_blocks == 0 || raw_num_blocks as u64 > max_blocks {
            1u64
        } else {
            raw_num_blocks as u64
        };
        let record_size = num_blocks * block_size as u64;

        if new_kind == ItemKind::Undefined {
            // HASH: recognized, interrupts deferred records (handled above),
            // but never emitted — skip its declared span.
            pos += record_size;
            continue;
        }

        let is_unallocated = unallocated.contains(pos);

        if !is_unallocated {
            live.push(ItemDescriptor {
                kind: new_kind,
                file_offset: pos,
                record_size: record_size as u32,
                flags: ItemFlags::NONE,
            });
            last = Some(ListRef::Live(live.len() - 1));
            pos += record_size;
        } else {
            current_start = pos;
            current_kind = new_kind;
            remaining = record_size;
            pos += block_size as u64;
            remaining = remaining.saturating_sub(block_size as u64);
            if remaining == 0 {
                recovered.push(ItemDescriptor {
                    kind: new_kind,
                    file_offset: current_start,
                    record_size: record_size as u32,
                    flags: ItemFlags::RECOVERED,
                });
                last = Some(ListRef::Recovered(recovered.len() - 1));
                current_kind = ItemKind::Undefined;
            }
        }
    }

    // A dangling deferred record at EOF yields no emission, but taints the
    // descriptor that preceded it.
    if remaining > 0 {
        if let Some(prev) = last {
            taint(&mut live, &mut recovered, prev);
        }
    }

    Ok(ScanResult { live, recovered })
}

fn taint(live: &mut [ItemDescriptor], recovered: &mut [ItemDescriptor], target: ListRef) {
    match target {
        ListRef::Live(i) => live[i].flags.insert(ItemFlags::TAINTED),
        ListRef::Recovered(i) => recovered[i].flags.insert(ItemFlags::TAINTED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn url_record(num_blocks: u32, block_size: usize) -> Vec<u8> {
        let mut buf = vec![0u8; num_blocks as usize * block_size];
        buf[0..4].copy_from_slice(b"URL ");
        buf[4..8].copy_from_slice(&num_blocks.to_le_bytes());
        buf
    }

    #[test]
    fn scans_live_items_in_allocated_range() {
        let block_size = 128u32;
        let mut data = url_record(2, block_size as usize);
        data.extend(url_record(1, block_size as usize));
        let file_size = data.len() as u64;
        let mut src = Cursor::new(data);

        let unallocated = UnallocatedRanges::default(); // everything allocated
        let result = scan_records(&mut src, 0, file_size, block_size, &unallocated, || false).unwrap();
        assert_eq!(result.live.len(), 2);
        assert_eq!(result.recovered.len(), 0);
        assert_eq!(result.live[0].file_offset, 0);
        assert_eq!(result.live[0].record_size, 256);
        assert_eq!(result.live[1].file_offset, 256);
    }

    #[test]
    fn scanner_is_idempotent() {
        let block_size = 128u32;
        let data = url_record(3, block_size as usize);
        let file_size = data.len() as u64;
        let mut src = Cursor::new(data);
        let unallocated = UnallocatedRanges::default();

        let r1 = scan_records(&mut src, 0, file_size, block_size, &unallocated, || false).unwrap();
        let r2 = scan_records(&mut src, 0, file_size, block_size, &unallocated, || false).unwrap();
        assert_eq!(r1.live, r2.live);
        assert_eq!(r1.recovered, r2.recovered);
    }

    #[test]
    fn aborts_when_flag_set() {
        let block_size = 128u32;
        let data = url_record(1, block_size as usize);
        let file_size = data.len() as u64;
        let mut src = Cursor::new(data);
        let unallocated = UnallocatedRanges::default();
        let result = scan_records(&mut src, 0, file_size, block_size, &unallocated, || true);
        assert!(matches!(result, Err(ScannerError::Aborted)));
    }
}
