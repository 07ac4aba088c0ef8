//! In-memory index entry produced by the record scanner.

use serde::Serialize;

/// Fixed key for the forensic record fingerprint (see [`fingerprint`]).
/// `index.dat` has no on-disk checksums; this key exists only so repeated
/// scans of the same bytes produce a stable, comparable digest, not for any
/// cryptographic guarantee.
const FINGERPRINT_KEY: [u8; 32] = *b"msiecf-core.record-fingerprint.0";

/// BLAKE3-keyed fingerprint of a record's raw bytes, for forensic dedup
/// across scan passes (e.g. confirming a recovered fragment and a live item
/// that overlap are the same underlying bytes). Not a format-defined value —
/// this crate's own derived field.
pub fn fingerprint(bytes: &[u8]) -> [u8; 32] {
    *blake3::keyed_hash(&FINGERPRINT_KEY, bytes).as_bytes()
}

/// Which record variant an [`ItemDescriptor`] names. `Undefined` is used
/// internally by the scanner for HASH records and unclassified spans; it is
/// never returned from `File::item`/`File::recovered_item`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemKind {
    Url,
    Redirected,
    Leak,
    Undefined,
}

/// Flags describing how an [`ItemDescriptor`] was discovered or its
/// reliability after downstream scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemFlags(u8);

impl ItemFlags {
    /// Found in a bitmap-unallocated range, not via live traversal.
    pub const RECOVERED: ItemFlags = ItemFlags(0b0000_0001);
    /// A recovered fragment truncated by a subsequent record.
    pub const PARTIAL: ItemFlags = ItemFlags(0b0000_0010);
    /// A live item whose declared block count was later found suspect.
    pub const TAINTED: ItemFlags = ItemFlags(0b0000_0100);
    pub const NONE: ItemFlags = ItemFlags(0);

    pub fn contains(self, other: ItemFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: ItemFlags) {
        self.0 |= other.0;
    }
}

impl std::ops::BitOr for ItemFlags {
    type Output = ItemFlags;
    fn bitor(self, rhs: ItemFlags) -> ItemFlags {
        ItemFlags(self.0 | rhs.0)
    }
}

impl Serialize for ItemFlags {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("ItemFlags", 3)?;
        s.serialize_field("recovered", &self.contains(ItemFlags::RECOVERED))?;
        s.serialize_field("partial", &self.contains(ItemFlags::PARTIAL))?;
        s.serialize_field("tainted", &self.contains(ItemFlags::TAINTED))?;
        s.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ItemDescriptor {
    pub kind: ItemKind,
    pub file_offset: u64,
    pub record_size: u32,
    pub flags: ItemFlags,
}

impl ItemDescriptor {
    pub fn is_recovered(&self) -> bool {
        self.flags.contains(ItemFlags::RECOVERED)
    }

    pub fn is_partial(&self) -> bool {
        self.flags.contains(ItemFlags::PARTIAL)
    }

    pub fn is_tainted(&self) -> bool {
        self.flags.contains(ItemFlags::TAINTED)
    }
}

/// Decoded record payload, tagged by variant. `Hash`/`Undefined` descriptors
/// are never materialized — the scanner never emits them as items (see
/// `crate::scanner` module docs).
#[derive(Debug, Clone, Serialize)]
pub enum ItemValues {
    Url(crate::record::url::UrlValues),
    Redirected(crate::record::redr::RedrValues),
    Leak(crate::record::leak::LeakValues),
}

/// A fully materialized item: the descriptor that located it plus its
/// decoded field values. Produced on demand by `File::item_values` /
/// `File::recovered_item_values` — the facade does not keep these around,
/// only the lightweight `ItemDescriptor` lists are held eagerly.
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub descriptor: ItemDescriptor,
    pub values: ItemValues,
}

impl Item {
    pub fn kind(&self) -> ItemKind {
        self.descriptor.kind
    }

    pub fn file_offset(&self) -> u64 {
        self.descriptor.file_offset
    }

    pub fn record_size(&self) -> u32 {
        self.descriptor.record_size
    }

    pub fn flags(&self) -> ItemFlags {
        self.descriptor.flags
    }

    pub fn as_url(&self) -> Option<&crate::record::url::UrlValues> {
        match &self.values {
            ItemValues::Url(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_redirected(&self) -> Option<&crate::record::redr::RedrValues> {
        match &self.values {
            ItemValues::Redirected(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_leak(&self) -> Option<&crate::record::leak::LeakValues> {
        match &self.values {
            ItemValues::Leak(v) => Some(v),
            _ => None,
        }
    }
}
