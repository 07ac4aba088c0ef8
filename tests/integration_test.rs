//! End-to-end coverage over a synthetic on-disk `index.dat`, built the way
//! the unit tests build fixtures but routed through a real file handle via
//! `tempfile`.

use msiecf_core::{File, ItemFlags, ItemKind, MsiecfError};
use std::io::Write;
use tempfile::NamedTempFile;

const BLOCK_SIZE: u64 = 128;
const BLOCK_REGION_OFFSET: u64 = 0x4000;
const BITMAP_OFFSET: u64 = 0x250;
const HEADER_SIZE: usize = 72;

/// Builds a minimal, otherwise-zeroed v5.2 `index.dat` header.
fn build_header(file_size: u32, hash_table_offset: u32, total_blocks: u32, allocated_blocks: u32) -> Vec<u8> {
    let mut buf = vec![0u8; HEADER_SIZE];
    let sig = b"Client UrlCache MMF Ver 5.2\0";
    buf[0..sig.len()].copy_from_slice(sig);
    buf[28..32].copy_from_slice(&file_size.to_le_bytes());
    buf[32..36].copy_from_slice(&hash_table_offset.to_le_bytes());
    buf[36..40].copy_from_slice(&total_blocks.to_le_bytes());
    buf[40..44].copy_from_slice(&allocated_blocks.to_le_bytes());
    buf
}

fn url_record_v52(location: &[u8], filename: &[u8], num_blocks: u32) -> Vec<u8> {
    let location_offset = 96u32;
    let filename_offset = location_offset + location.len() as u32;
    let needed = filename_offset as usize + filename.len();
    let total = (num_blocks as usize * BLOCK_SIZE as usize).max(needed);
    let mut buf = vec![0u8; total];
    buf[0..4].copy_from_slice(b"URL ");
    buf[4..8].copy_from_slice(&num_blocks.to_le_bytes());
    buf[16..24].copy_from_slice(&0x01ce1d788e4487e0u64.to_le_bytes()); // primary_time
    buf[32..36].copy_from_slice(&0x0000046bu32.to_le_bytes()); // cached_file_size
    buf[52..56].copy_from_slice(&location_offset.to_le_bytes());
    buf[60..64].copy_from_slice(&filename_offset.to_le_bytes());
    buf[location_offset as usize..location_offset as usize + location.len()].copy_from_slice(location);
    buf[filename_offset as usize..filename_offset as usize + filename.len()].copy_from_slice(filename);
    buf
}

#[test]
fn opens_file_with_one_cache_directory_and_one_url_item() {
    let total_blocks = 8u32;
    let file_size = BLOCK_REGION_OFFSET + total_blocks as u64 * BLOCK_SIZE;

    let mut data = build_header(file_size as u32, 0x100, total_blocks, total_blocks);

    // Cache directory table: one entry, "ABCDEFG1".
    data.extend_from_slice(&1u32.to_le_bytes());
    data.extend_from_slice(&42u32.to_le_bytes());
    data.extend_from_slice(b"ABCDEFG1");

    data.resize(BITMAP_OFFSET as usize, 0);
    data.push(0xFF); // 8 blocks, all allocated
    data.resize(BLOCK_REGION_OFFSET as usize, 0);

    let url = url_record_v52(b"https://www.google.com/chart?UTF-8\0", b"chart[1].png\0", 4);
    data.extend_from_slice(&url);
    data.resize(file_size as usize, 0);

    let mut tmp = NamedTempFile::new().unwrap();
    tmp.write_all(&data).unwrap();
    tmp.flush().unwrap();

    let mut file = File::open(tmp.path()).unwrap();
    assert_eq!(file.format_version(), (5, 2));
    assert_eq!(file.file_size(), file_size);
    assert_eq!(file.num_cache_directories(), 1);
    let name = file.cache_directory_name(0).unwrap();
    assert_eq!(&name[..8], b"ABCDEFG1");
    assert_eq!(name[8], 0);
    assert_eq!(file.cache_directory_file_count(0), Some(42));

    assert_eq!(file.num_items(), 1);
    let item = file.item_values(0).unwrap();
    assert_eq!(item.kind(), ItemKind::Url);
    let url_values = item.as_url().unwrap();
    assert_eq!(url_values.primary_time, 0x01ce1d788e4487e0);
    assert_eq!(url_values.cached_file_size, 0x0000046b);
    assert_eq!(url_values.filename.as_ref().unwrap().to_utf8_string(), "chart[1].png");
}

#[test]
fn recovers_a_url_record_from_unallocated_space() {
    let total_blocks = 8u32;
    let file_size = BLOCK_REGION_OFFSET + total_blocks as u64 * BLOCK_SIZE;

    let mut data = build_header(file_size as u32, 0x100, total_blocks, 0);
    data.extend_from_slice(&0u32.to_le_bytes()); // no cache directories

    data.resize(BITMAP_OFFSET as usize, 0);
    data.push(0x00); // all 8 blocks unallocated
    data.resize(BLOCK_REGION_OFFSET as usize, 0);

    let url = url_record_v52(b"Cookie:user@example.com/\0", b"\0", 2);
    data.extend_from_slice(&url);
    data.resize(file_size as usize, 0);

    let mut tmp = NamedTempFile::new().unwrap();
    tmp.write_all(&data).unwrap();
    tmp.flush().unwrap();

    let mut file = File::open(tmp.path()).unwrap();
    assert_eq!(file.num_items(), 0);
    assert_eq!(file.num_recovered_items(), 1);

    let recovered = file.recovered_item_values(0).unwrap();
    assert!(recovered.flags().contains(ItemFlags::RECOVERED));
    let url_values = recovered.as_url().unwrap();
    assert_eq!(url_values.url_kind, msiecf_core::record::url_kind::UrlKind::Cookie);

    let (url_count, redr_count, leak_count) = file.recovered_item_count_by_kind();
    assert_eq!((url_count, redr_count, leak_count), (1, 0, 0));
}

#[test]
fn rejects_unsupported_format_version() {
    let total_blocks = 8u32;
    let file_size = BLOCK_REGION_OFFSET + total_blocks as u64 * BLOCK_SIZE;
    let mut data = build_header(file_size as u32, 0x100, total_blocks, total_blocks);
    data.extend_from_slice(&0u32.to_le_bytes());
    data.resize(BITMAP_OFFSET as usize, 0);
    data.push(0xFF);
    data.resize(file_size as usize, 0);
    data[24] = b'9'; // corrupt the "5" in "5.2" -> unsupported version

    let mut tmp = NamedTempFile::new().unwrap();
    tmp.write_all(&data).unwrap();
    tmp.flush().unwrap();

    let result = File::open(tmp.path());
    assert!(matches!(result, Err(MsiecfError::InvalidFormat(_))), "expected InvalidFormat, got {result:?}");
}
