//! Error taxonomy shared by every component, unified under [`MsiecfError`].
//!
//! Each parsing component returns its own narrow error type where that is
//! useful for matching (see `header.rs`, `hash_chain.rs`); all of them convert
//! into `MsiecfError` at the `File` facade boundary.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MsiecfError {
    /// A caller-supplied parameter violates a stated precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Signature mismatch, unsupported version, misaligned sizes.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// An in-band value fails a consistency invariant.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A size or offset derived from the file would exceed the file or `MAX_ALLOC`.
    #[error("value out of bounds: {0}")]
    ValueOutOfBounds(String),

    /// Explicit allocation-cap violation.
    #[error("value exceeds maximum allowed allocation: {0}")]
    ValueExceedsMaximum(String),

    /// A recognized but not-implemented value.
    #[error("unsupported value: {0}")]
    UnsupportedValue(String),

    /// Underlying `ByteSource` failure.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// `signal_abort` observed mid-operation.
    #[error("operation aborted")]
    Aborted,
}

pub type Result<T> = std::result::Result<T, MsiecfError>;
