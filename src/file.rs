//! `File` — the read-only facade tying header, directory table, allocation
//! bitmap, and record scan together into one queryable view.
//!
//! Holds an opened source plus whatever indices were parsed eagerly at open
//! time, exposing accessors instead of re-parsing on every call.

use std::fs::File as StdFile;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::bitmap::{scan_bitmap, UnallocatedRanges};
use crate::byte_source::ByteSource;
use crate::directory::CacheDirectoryTable;
use crate::error::{MsiecfError, Result};
use crate::hash_chain::{walk_hash_chain, HashChainError};
use crate::header::FileHeader;
use crate::item::{Item, ItemDescriptor, ItemKind, ItemValues};
use crate::record::RecordError;
use crate::scanner::{scan_records, ScannerError};
use crate::string_field::CodepageId;

/// Default block size, in bytes, for all known format versions.
pub const DEFAULT_BLOCK_SIZE: u32 = 128;
/// Fixed offset of the allocation bitmap.
pub const BITMAP_OFFSET: u64 = 0x250;
/// Fixed start of the block region the bitmap and scanner operate over.
pub const BLOCK_REGION_OFFSET: u64 = 0x4000;

/// Upper bound on any single in-memory allocation this crate performs while
/// parsing a file (directory table, bitmap buffer, record buffers). Guards
/// against a corrupt or hostile file driving an unbounded allocation.
pub const MAX_ALLOC: usize = 64 * 1024 * 1024;

impl From<crate::header::HeaderError> for MsiecfError {
    fn from(e: crate::header::HeaderError) -> Self {
        match e {
            crate::header::HeaderError::InvalidSignature => MsiecfError::InvalidFormat(e.to_string()),
            crate::header::HeaderError::UnsupportedVersion(..) => MsiecfError::InvalidFormat(e.to_string()),
            crate::header::HeaderError::HashTableOffsetOutOfRange { .. } => {
                MsiecfError::ValueOutOfBounds(e.to_string())
            }
            crate::header::HeaderError::Io(io) => MsiecfError::IoError(io),
        }
    }
}

impl From<crate::directory::DirectoryTableError> for MsiecfError {
    fn from(e: crate::directory::DirectoryTableError) -> Self {
        match e {
            crate::directory::DirectoryTableError::CountExceedsMaxAlloc { .. } => {
                MsiecfError::ValueExceedsMaximum(e.to_string())
            }
            crate::directory::DirectoryTableError::Io(io) => MsiecfError::IoError(io),
        }
    }
}

impl From<crate::bitmap::BitmapError> for MsiecfError {
    fn from(e: crate::bitmap::BitmapError) -> Self {
        match e {
            crate::bitmap::BitmapError::OverlapsBlockRegion { .. } => MsiecfError::ValueOutOfBounds(e.to_string()),
            crate::bitmap::BitmapError::Io(io) => MsiecfError::IoError(io),
        }
    }
}

impl From<ScannerError> for MsiecfError {
    fn from(e: ScannerError) -> Self {
        match e {
            ScannerError::Io(io) => MsiecfError::IoError(io),
            ScannerError::Aborted => MsiecfError::Aborted,
        }
    }
}

impl From<RecordError> for MsiecfError {
    fn from(e: RecordError) -> Self {
        match e {
            RecordError::BadSignature { .. } => MsiecfError::InvalidFormat(e.to_string()),
            RecordError::OffsetOutOfBounds { .. }
            | RecordError::DataSliceOutOfBounds { .. }
            | RecordError::TooShort { .. } => MsiecfError::ValueOutOfBounds(e.to_string()),
            RecordError::StringField(crate::string_field::StringFieldError::Unterminated { .. }) => {
                MsiecfError::InvalidData(e.to_string())
            }
            RecordError::StringField(crate::string_field::StringFieldError::BufferTooSmall { .. }) => {
                MsiecfError::ValueOutOfBounds(e.to_string())
            }
        }
    }
}

/// Opened cache file: header, cache directory table, allocation bitmap scan,
/// and the full live/recovered item listings, built eagerly at open time.
pub struct File<S> {
    src: S,
    header: FileHeader,
    directories: CacheDirectoryTable,
    unallocated: UnallocatedRanges,
    allocated_count_mismatch: bool,
    live_items: Vec<ItemDescriptor>,
    recovered_items: Vec<ItemDescriptor>,
    /// Structural validation result of the hash-chain walk performed at open
    /// time. `Err` holds the walk's failure reason as a diagnostic string —
    /// a broken hash chain does not abort `open` (the scanner is
    /// authoritative for item discovery and never consults this), but the
    /// diagnostic is kept for callers doing structural integrity reporting.
    hash_chain: std::result::Result<usize, String>,
    codepage: RwLock<CodepageId>,
    abort_flag: AtomicBool,
}

impl File<StdFile> {
    /// Open a plain filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = crate::byte_source::open(path)?;
        Self::from_source(f)
    }
}

impl<S: ByteSource> File<S> {
    /// Parse header, directory table, allocation bitmap, and perform the full
    /// record scan against an already-opened [`ByteSource`].
    pub fn from_source(mut src: S) -> Result<Self> {
        let file_size = src.len()?;

        let mut header_buf = vec![0u8; crate::header::HEADER_SIZE];
        src.read_at(0, &mut header_buf)?;
        let header = FileHeader::read(&header_buf[..])?;

        let directories = CacheDirectoryTable::read_table(&mut src, crate::header::HEADER_SIZE as u64)?;

        let bitmap_result = scan_bitmap(
            &mut src,
            BITMAP_OFFSET,
            file_size,
            BLOCK_REGION_OFFSET,
            DEFAULT_BLOCK_SIZE,
            header.total_blocks,
            header.allocated_blocks,
        )?;

        let abort_flag = AtomicBool::new(false);
        let scan = scan_records(
            &mut src,
            BLOCK_REGION_OFFSET,
            file_size,
            DEFAULT_BLOCK_SIZE,
            &bitmap_result.unallocated,
            || abort_flag.load(Ordering::Relaxed),
        )?;

        let hash_chain = walk_hash_chain(&mut src, header.hash_table_offset as u64, DEFAULT_BLOCK_SIZE)
            .map(|entries| entries.len())
            .map_err(|e: HashChainError| e.to_string());

        Ok(File {
            src,
            header,
            directories,
            unallocated: bitmap_result.unallocated,
            allocated_count_mismatch: bitmap_result.allocated_count_mismatch,
            live_items: scan.live,
            recovered_items: scan.recovered,
            hash_chain,
            codepage: RwLock::new(CodepageId::DEFAULT),
            abort_flag: AtomicBool::new(false),
        })
    }

    /// `true` when the hash-chain walk at open time completed without a
    /// structural error (bad signature, misaligned body, or depth exceeded).
    /// Purely diagnostic — the record scanner never consults the hash table
    /// for item discovery, so a `false` here does not affect `items()`.
    pub fn hash_chain_valid(&self) -> bool {
        self.hash_chain.is_ok()
    }

    /// Number of hash-chain entries that passed the entry filter, or `None`
    /// if the walk failed structurally.
    pub fn hash_chain_entry_count(&self) -> Option<usize> {
        self.hash_chain.as_ref().ok().copied()
    }

    pub fn file_size(&self) -> u64 {
        self.header.file_size
    }

    pub fn format_version(&self) -> (u8, u8) {
        self.header.format_version()
    }

    /// Non-fatal: set when the bitmap's computed allocated-block count
    /// disagrees with the header's declared count.
    pub fn allocated_count_mismatch(&self) -> bool {
        self.allocated_count_mismatch
    }

    pub fn codepage(&self) -> CodepageId {
        *self.codepage.read().expect("codepage lock poisoned")
    }

    /// Validate and install a codepage for subsequent string decoding. Only
    /// the whitelist in [`CodepageId::from_numeric`] is accepted.
    pub fn set_codepage(&self, numeric: u32) -> Result<()> {
        let id = CodepageId::from_numeric(numeric)
            .ok_or_else(|| MsiecfError::UnsupportedValue(format!("codepage {numeric} is not supported")))?;
        *self.codepage.write().expect("codepage lock poisoned") = id;
        Ok(())
    }

    pub fn num_cache_directories(&self) -> usize {
        self.directories.len()
    }

    pub fn cache_directory_name(&self, index: usize) -> Option<[u8; 9]> {
        self.directories.lookup_name(index)
    }

    pub fn cache_directory_file_count(&self, index: usize) -> Option<u32> {
        self.directories.get(index).map(|d| d.cached_file_count)
    }

    pub fn num_unallocated_blocks(&self) -> usize {
        self.unallocated.len()
    }

    pub fn unallocated_block(&self, index: usize) -> Option<(u64, u64)> {
        self.unallocated.get(index)
    }

    pub fn num_items(&self) -> usize {
        self.live_items.len()
    }

    pub fn item(&self, index: usize) -> Option<&ItemDescriptor> {
        self.live_items.get(index)
    }

    pub fn items(&self) -> impl Iterator<Item = &ItemDescriptor> {
        self.live_items.iter()
    }

    pub fn num_recovered_items(&self) -> usize {
        self.recovered_items.len()
    }

    pub fn recovered_item(&self, index: usize) -> Option<&ItemDescriptor> {
        self.recovered_items.get(index)
    }

    pub fn recovered_items(&self) -> impl Iterator<Item = &ItemDescriptor> {
        self.recovered_items.iter()
    }

    /// Read the raw record bytes an [`ItemDescriptor`] names, for handing to
    /// a `record::{url,redr,leak}::decode` call.
    ///
    /// Per spec.md §4.6: a tainted descriptor's declared `record_size` is
    /// only a lower bound once downstream scanning found it suspect, so one
    /// extra block is read past it to give the decoder a chance at the real
    /// tail; the whole read is clamped to `MAX_ALLOC` and to the bytes
    /// actually remaining in the file.
    pub fn read_record_bytes(&mut self, descriptor: &ItemDescriptor) -> Result<Vec<u8>> {
        let extra = if descriptor.is_tainted() { DEFAULT_BLOCK_SIZE as u64 } else { 0 };
        let wanted = descriptor.record_size as u64 + extra;
        let remaining_in_file = self.header.file_size.saturating_sub(descriptor.file_offset);
        let read_len = wanted.min(MAX_ALLOC as u64).min(remaining_in_file);
        let mut buf = vec![0u8; read_len as usize];
        self.src.read_at(descriptor.file_offset, &mut buf)?;
        Ok(buf)
    }

    /// Read and decode the record an [`ItemDescriptor`] names into its
    /// kind-specific values. `descriptor.flags` controls how strictly the
    /// decoder treats offsets and string termination: a `Partial` descriptor
    /// softens integrity checks instead of failing.
    pub fn materialize(&mut self, descriptor: &ItemDescriptor) -> Result<Item> {
        let buf = self.read_record_bytes(descriptor)?;
        let is_partial = descriptor.is_partial();
        let (major, minor) = self.header.format_version();
        let codepage = self.codepage();

        let values = match descriptor.kind {
            ItemKind::Url => ItemValues::Url(crate::record::url::decode(&buf, major, minor, codepage, is_partial)?),
            ItemKind::Redirected => ItemValues::Redirected(crate::record::redr::decode(&buf, codepage, is_partial)?),
            ItemKind::Leak => ItemValues::Leak(crate::record::leak::decode(&buf, codepage, is_partial)?),
            ItemKind::Undefined => {
                return Err(MsiecfError::InvalidArgument(
                    "descriptor kind Undefined has no decodable values".to_string(),
                ))
            }
        };

        Ok(Item { descriptor: *descriptor, values })
    }

    /// Materialize live item `index`. Fails only for that one item — a
    /// corrupt record does not invalidate the rest of the listing.
    pub fn item_values(&mut self, index: usize) -> Result<Item> {
        let descriptor = *self
            .item(index)
            .ok_or_else(|| MsiecfError::InvalidArgument(format!("item index {index} out of range")))?;
        self.materialize(&descriptor)
    }

    /// Materialize recovered item `index`.
    pub fn recovered_item_values(&mut self, index: usize) -> Result<Item> {
        let descriptor = *self
            .recovered_item(index)
            .ok_or_else(|| MsiecfError::InvalidArgument(format!("recovered item index {index} out of range")))?;
        self.materialize(&descriptor)
    }

    /// Counts of recovered items by kind, as `(url, redirected, leak)`. A
    /// forensic summary aggregate, useful for a verbose-mode tally; not part
    /// of the item listing itself.
    pub fn recovered_item_count_by_kind(&self) -> (usize, usize, usize) {
        let mut counts = (0usize, 0usize, 0usize);
        for descriptor in &self.recovered_items {
            match descriptor.kind {
                ItemKind::Url => counts.0 += 1,
                ItemKind::Redirected => counts.1 += 1,
                ItemKind::Leak => counts.2 += 1,
                ItemKind::Undefined => {}
            }
        }
        counts
    }

    /// Requests cooperative cancellation of any operation currently polling
    /// `abort`. Has no effect once `from_source` has already returned, since
    /// the eager scan is already complete; retained for parity with
    /// longer-running future operations (e.g. a caller-driven rescan).
    pub fn signal_abort(&self) {
        self.abort_flag.store(true, Ordering::Relaxed);
    }
}
