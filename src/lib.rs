//! # msiecf-core — MSIE URL cache file (`index.dat`) parser core
//!
//! Format guarantees this crate relies on:
//! - All multi-byte fields are little-endian; format versions 4.7 and 5.2
//!   are the only ones accepted, both sharing the same 72-byte file header
//! - The allocation bitmap at a fixed offset is the authoritative allocated/
//!   unallocated partition of the block region; the record scanner treats it
//!   as ground truth, never the hash table
//! - Every record is self-describing: a 4-byte signature plus declared block
//!   count is enough to read it without following any index
//! - The hash table is validated structurally but is never consulted for
//!   item discovery — see [`scanner`] module docs
//! - This crate is read-only: it never writes, builds, or modifies an
//!   index.dat file, and never reconstructs cached payload files

pub mod bitmap;
pub mod byte_source;
pub mod directory;
pub mod error;
pub mod file;
pub mod hash_chain;
pub mod header;
pub mod item;
pub mod record;
pub mod scanner;
pub mod string_field;

pub use byte_source::ByteSource;
pub use directory::{CacheDirectory, CacheDirectoryTable};
pub use error::{MsiecfError, Result};
pub use file::{File, DEFAULT_BLOCK_SIZE, MAX_ALLOC};
pub use header::FileHeader;
pub use item::{Item, ItemDescriptor, ItemFlags, ItemKind, ItemValues};
pub use string_field::{CodepageId, StringField};
