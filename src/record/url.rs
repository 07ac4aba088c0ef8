//! URL record decoder — the `"URL "` signature, version-split header layout.
//!
//! Byte offsets below are fixed to the original on-disk struct layout
//! (`msiecf_url_record_header_v47`/`_v52`), not the rounded summary table;
//! v4.7 carries `expiration_time` as an 8-byte FILETIME, v5.2 as a 4-byte FAT
//! date-time, which shifts every subsequent field by 4 bytes.

use super::{check_min_len, check_offset, FatDateTime, FileTime, RecordError};
use crate::string_field::{CodepageId, StringField};

/// Cache-entry flag bits from the original format's definitions header.
/// Used only for the non-fatal sanity-warning cross-check in
/// [`UrlValues::warnings`] — never load-bearing for decode success.
const CACHE_ENTRY_FLAG_COOKIE: u32 = 0x0010_0000;
const CACHE_ENTRY_FLAG_URLHISTORY: u32 = 0x0020_0000;

const V47_HEADER_SIZE: usize = 100;
const V52_HEADER_SIZE: usize = 96;

/// `expiration_time`'s on-disk representation is version-dependent; both
/// sentinel values mean "never" and are surfaced raw, never converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ExpirationTime {
    FileTime(FileTime),
    Fat(FatDateTime),
}

impl ExpirationTime {
    pub fn is_never(&self) -> bool {
        match self {
            ExpirationTime::FileTime(t) => *t == 0x7FFF_FFFF_FFFF_FFFF,
            ExpirationTime::Fat(t) => *t == 0xFFFF_FFFF,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Warning {
    /// Kind classified as Cookie but `CACHE_ENTRY_FLAG_COOKIE` was not set.
    CookieFlagMismatch,
    /// Kind classified as a history variant but `CACHE_ENTRY_FLAG_URLHISTORY`
    /// was not set.
    HistoryFlagMismatch,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct UrlValues {
    pub url_kind: super::url_kind::UrlKind,
    pub secondary_time: FileTime,
    pub primary_time: FileTime,
    pub expiration_time: ExpirationTime,
    pub last_checked_time: FatDateTime,
    pub cached_file_size: u32,
    pub cache_directory_index: u8,
    pub number_of_hits: u32,
    pub location: Option<StringField>,
    pub filename: Option<StringField>,
    pub data: Option<Vec<u8>>,
    /// Trailing `unknown_time` FAT field, preserved for forensic completeness.
    pub reserved_time: u32,
    warnings: Vec<Warning>,
}

impl UrlValues {
    /// Sentinel meaning "no cache directory" for `cache_directory_index`.
    pub fn has_cache_directory(&self) -> bool {
        !matches!(self.cache_directory_index, 0xFE | 0xFF)
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

fn resolve_string_offset(
    field: &'static str,
    offset: u32,
    buf_len: usize,
    is_partial: bool,
) -> Result<Option<u32>, RecordError> {
    if offset == 0 {
        return Ok(None);
    }
    match check_offset(field, offset, buf_len) {
        Ok(()) => Ok(Some(offset)),
        Err(e) => {
            if is_partial {
                Ok(None)
            } else {
                Err(e)
            }
        }
    }
}

fn resolve_data_slice(
    data_offset: u32,
    data_size: u32,
    buf_len: usize,
    is_partial: bool,
) -> Result<Option<(u32, u32)>, RecordError> {
    if data_offset == 0 {
        return Ok(None);
    }
    let end = data_offset as u64 + data_size as u64;
    let overflows = data_offset as usize > buf_len || end > buf_len as u64;
    if overflows {
        if is_partial {
            Ok(None)
        } else {
            Err(RecordError::DataSliceOutOfBounds { data_offset, data_size, buf_len })
        }
    } else {
        Ok(Some((data_offset, data_size)))
    }
}

/// Decode a `"URL "` record from `buf`, which must begin at the record's
/// declared `file_offset` and run at least through the fixed-size header.
pub fn decode(
    buf: &[u8],
    major_version: u8,
    minor_version: u8,
    codepage: CodepageId,
    is_partial: bool,
) -> Result<UrlValues, RecordError> {
    check_min_len(buf, 4)?;
    if &buf[0..4] != b"URL " {
        let mut found = [0u8; 4];
        found.copy_from_slice(&buf[0..4]);
        return Err(RecordError::BadSignature { expected: *b"URL ", found });
    }
    check_min_len(buf, if (major_version, minor_version) == (4, 7) { V47_HEADER_SIZE } else { V52_HEADER_SIZE })?;

    let u32_at = |off: usize| u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
    let u64_at = |off: usize| u64::from_le_bytes(buf[off..off + 8].try_into().unwrap());

    let secondary_time = u64_at(8);
    let primary_time = u64_at(16);

    let (
        expiration_time,
        cached_file_size,
        location_offset,
        cache_directory_index,
        filename_offset,
        cache_entry_flags,
        data_offset,
        data_size,
        last_checked_time,
        number_of_hits,
        reserved_time,
    ) = if (major_version, minor_version) == (4, 7) {
        debug_assert!(buf.len() >= V47_HEADER_SIZE);
        (
            ExpirationTime::FileTime(u64_at(24)),
            u32_at(32),
            u32_at(56),
            buf[60],
            u32_at(64),
            u32_at(68),
            u32_at(72),
            u32_at(76),
            u32_at(84),
            u32_at(88),
            u32_at(96),
        )
    } else {
        debug_assert!(buf.len() >= V52_HEADER_SIZE);
        (
            ExpirationTime::Fat(u32_at(24)),
            u32_at(32),
            u32_at(52),
            buf[56],
            u32_at(60),
            u32_at(64),
            u32_at(68),
            u32_at(72),
            u32_at(80),
            u32_at(84),
            u32_at(92),
        )
    };

    let buf_len = buf.len();

    let location = match resolve_string_offset("location_offset", location_offset, buf_len, is_partial)? {
        Some(off) => Some(StringField::slice_from(buf, off, codepage, is_partial)?),
        None => None,
    };
    let filename = match resolve_string_offset("filename_offset", filename_offset, buf_len, is_partial)? {
        Some(off) => Some(StringField::slice_from(buf, off, codepage, is_partial)?),
        None => None,
    };
    let data = match resolve_data_slice(data_offset, data_size, buf_len, is_partial)? {
        Some((off, size)) => Some(buf[off as usize..off as usize + size as usize].to_vec()),
        None => None,
    };

    let url_kind = location
        .as_ref()
        .map(|l| super::url_kind::classify(l.bytes()))
        .unwrap_or(super::url_kind::UrlKind::Unknown);

    let mut warnings = Vec::new();
    match url_kind {
        super::url_kind::UrlKind::Cookie if cache_entry_flags & CACHE_ENTRY_FLAG_COOKIE == 0 => {
            warnings.push(Warning::CookieFlagMismatch);
        }
        super::url_kind::UrlKind::History
        | super::url_kind::UrlKind::HistoryDaily
        | super::url_kind::UrlKind::HistoryWeekly
            if cache_entry_flags & CACHE_ENTRY_FLAG_URLHISTORY == 0 =>
        {
            warnings.push(Warning::HistoryFlagMismatch);
        }
        _ => {}
    }

    Ok(UrlValues {
        url_kind,
        secondary_time,
        primary_time,
        expiration_time,
        last_checked_time,
        cached_file_size,
        cache_directory_index,
        number_of_hits,
        location,
        filename,
        data,
        reserved_time,
        warnings,
    })
}
