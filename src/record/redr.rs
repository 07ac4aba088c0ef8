//! REDR record decoder — the `"REDR"` signature, a thin wrapper around a
//! single variable-length location string starting at byte 16.

use super::{check_min_len, RecordError};
use crate::string_field::{CodepageId, StringField};

#[derive(Debug, Clone, serde::Serialize)]
pub struct RedrValues {
    pub location: StringField,
}

/// Decode a `"REDR"` record from `buf`, beginning at the record's declared
/// `file_offset`.
pub fn decode(buf: &[u8], codepage: CodepageId, is_partial: bool) -> Result<RedrValues, RecordError> {
    if buf.len() < 4 || &buf[0..4] != b"REDR" {
        let mut found = [0u8; 4];
        found[..buf.len().min(4)].copy_from_slice(&buf[..buf.len().min(4)]);
        return Err(RecordError::BadSignature { expected: *b"REDR", found });
    }
    check_min_len(buf, 16)?;

    let location = StringField::slice_from(buf, 16, codepage, is_partial)?;
    Ok(RedrValues { location })
}
