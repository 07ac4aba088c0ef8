//! `StringField` — a codepage-aware, length-bounded string holder, plus the
//! fixed codepage whitelist the `File` facade validates `set_codepage`
//! against.
//!
//! The core never decodes bytes to Unicode itself — codepage tables are an
//! external collaborator — but it does own the slicing, NUL-termination
//! check, and size/copy-out accounting that the whitelist and on-disk layout
//! require.

use serde::Serialize;
use thiserror::Error;

/// Windows/ISO/KOI8 codepage identifiers the facade accepts, mirroring the
/// exact set the original format's codepage table exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u32")]
pub enum CodepageId {
    Ascii,
    Iso8859(u8),
    Koi8R,
    Koi8U,
    Windows(u16),
}

impl CodepageId {
    pub const DEFAULT: CodepageId = CodepageId::Windows(1252);

    pub fn numeric(self) -> u32 {
        match self {
            CodepageId::Ascii => 20127,
            CodepageId::Iso8859(n) => iso8859_numeric(n),
            CodepageId::Koi8R => 20866,
            CodepageId::Koi8U => 21866,
            CodepageId::Windows(n) => n as u32,
        }
    }

    /// Accepts exactly the whitelist below; any other value is rejected.
    pub fn from_numeric(cp: u32) -> Option<CodepageId> {
        Some(match cp {
            20127 => CodepageId::Ascii,
            28591 => CodepageId::Iso8859(1),
            28592 => CodepageId::Iso8859(2),
            28593 => CodepageId::Iso8859(3),
            28594 => CodepageId::Iso8859(4),
            28595 => CodepageId::Iso8859(5),
            28596 => CodepageId::Iso8859(6),
            28597 => CodepageId::Iso8859(7),
            28598 => CodepageId::Iso8859(8),
            28599 => CodepageId::Iso8859(9),
            28600 => CodepageId::Iso8859(10),
            28603 => CodepageId::Iso8859(13),
            28604 => CodepageId::Iso8859(14),
            28605 => CodepageId::Iso8859(15),
            28606 => CodepageId::Iso8859(16),
            20866 => CodepageId::Koi8R,
            21866 => CodepageId::Koi8U,
            874 => CodepageId::Windows(874),
            932 => CodepageId::Windows(932),
            936 => CodepageId::Windows(936),
            949 => CodepageId::Windows(949),
            950 => CodepageId::Windows(950),
            1250 => CodepageId::Windows(1250),
            1251 => CodepageId::Windows(1251),
            1252 => CodepageId::Windows(1252),
            1253 => CodepageId::Windows(1253),
            1254 => CodepageId::Windows(1254),
            1255 => CodepageId::Windows(1255),
            1256 => CodepageId::Windows(1256),
            1257 => CodepageId::Windows(1257),
            1258 => CodepageId::Windows(1258),
            _ => return None,
        })
    }
}

fn iso8859_numeric(n: u8) -> u32 {
    28590 + n as u32
}

impl From<CodepageId> for u32 {
    fn from(cp: CodepageId) -> u32 {
        cp.numeric()
    }
}

#[derive(Error, Debug)]
pub enum StringFieldError {
    #[error("invalid data: string at offset {offset} is not NUL-terminated in a non-partial record")]
    Unterminated { offset: u32 },
    #[error("value too small: buffer of {provided} bytes is smaller than the required {required}")]
    BufferTooSmall { provided: usize, required: usize },
}

/// A raw byte slice captured under a given codepage, plus the slicing rules
/// the decoders need (offset-bounded extraction, NUL-termination integrity).
#[derive(Debug, Clone)]
pub struct StringField {
    bytes: Vec<u8>,
    codepage: CodepageId,
}

impl Serialize for StringField {
    /// Serializes as the decoded string, not the raw bytes — the shape a CLI
    /// consumer of `msiecfinfo --json` actually wants. The codepage is
    /// reported separately where a caller needs to tell raw encoding apart.
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_utf8_string())
    }
}

impl StringField {
    /// Extracts the string starting at `offset` within `buf`, running to the
    /// first NUL byte or end-of-buffer. When `is_partial` is false, an
    /// unterminated string (ran off the end of `buf` without a NUL) is an
    /// error; partial descriptors accept it since the tail was truncated.
    pub fn slice_from(
        buf: &[u8],
        offset: u32,
        codepage: CodepageId,
        is_partial: bool,
    ) -> Result<StringField, StringFieldError> {
        let start = offset as usize;
        let nul_pos = buf[start..].iter().position(|&b| b == 0);
        let (end, terminated) = match nul_pos {
            Some(p) => (start + p, true),
            None => (buf.len(), false),
        };
        if !terminated && !is_partial {
            return Err(StringFieldError::Unterminated { offset });
        }
        // The slice excludes the NUL terminator itself.
        Ok(StringField { bytes: buf[start..end].to_vec(), codepage })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn codepage(&self) -> CodepageId {
        self.codepage
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of bytes a UTF-8 transcoding (NUL-terminated) would require.
    /// The core does not itself perform codepage->Unicode conversion for
    /// non-ASCII codepages; for `Ascii`/`Windows(1252)` the raw bytes are a
    /// valid Latin-1 superset-compatible source, decoded losslessly via
    /// `String::from_utf8_lossy`'s byte-for-byte ASCII path. Non-ASCII
    /// multi-byte codepages are the responsibility of the caller's codepage
    /// table; this accessor reports the length assuming a 1:1 byte mapping.
    pub fn utf8_size(&self) -> usize {
        self.bytes.len() + 1
    }

    /// Size, in bytes, a UTF-16 (NUL-terminated) transcoding would require —
    /// i.e. `utf16_code_units() * 2`.
    pub fn utf16_size(&self) -> usize {
        self.utf16_code_units() * 2
    }

    /// Number of UTF-16 code units (including the NUL terminator) a
    /// `copy_utf16` call requires `out` to hold. Same 1:1 byte-to-code-unit
    /// mapping `utf8_size`/`copy_utf8` document applies here.
    fn utf16_code_units(&self) -> usize {
        self.bytes.len() + 1
    }

    /// Copies a NUL-terminated UTF-8 rendering into `out`. `out` must be at
    /// least `utf8_size()` bytes.
    pub fn copy_utf8(&self, out: &mut [u8]) -> Result<usize, StringFieldError> {
        let required = self.utf8_size();
        if out.len() < required {
            return Err(StringFieldError::BufferTooSmall { provided: out.len(), required });
        }
        out[..self.bytes.len()].copy_from_slice(&self.bytes);
        out[self.bytes.len()] = 0;
        Ok(required)
    }

    /// Copies a NUL-terminated UTF-16 rendering into `out`. `out` must be at
    /// least `utf16_code_units()` elements (`utf16_size() / 2`).
    pub fn copy_utf16(&self, out: &mut [u16]) -> Result<usize, StringFieldError> {
        let required = self.utf16_code_units();
        if out.len() < required {
            return Err(StringFieldError::BufferTooSmall { provided: out.len() * 2, required: required * 2 });
        }
        for (i, &b) in self.bytes.iter().enumerate() {
            out[i] = b as u16;
        }
        out[self.bytes.len()] = 0;
        Ok(required)
    }

    pub fn to_utf8_string(&self) -> String {
        self.bytes.iter().map(|&b| b as char).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_whitelisted_codepages() {
        assert_eq!(CodepageId::from_numeric(1252), Some(CodepageId::Windows(1252)));
        assert_eq!(CodepageId::from_numeric(20127), Some(CodepageId::Ascii));
        assert_eq!(CodepageId::from_numeric(28591), Some(CodepageId::Iso8859(1)));
        assert_eq!(CodepageId::from_numeric(21866), Some(CodepageId::Koi8U));
    }

    #[test]
    fn rejects_non_whitelisted_codepage() {
        assert_eq!(CodepageId::from_numeric(65001), None); // UTF-8 is not in the whitelist
    }

    #[test]
    fn slices_to_first_nul() {
        let buf = b"hello\0world\0";
        let s = StringField::slice_from(buf, 0, CodepageId::DEFAULT, false).unwrap();
        assert_eq!(s.bytes(), b"hello");
        assert_eq!(s.utf8_size(), 6);
    }

    #[test]
    fn rejects_unterminated_non_partial() {
        let buf = b"no terminator here";
        let err = StringField::slice_from(buf, 0, CodepageId::DEFAULT, false);
        assert!(matches!(err, Err(StringFieldError::Unterminated { .. })));
    }

    #[test]
    fn accepts_unterminated_partial() {
        let buf = b"no terminator here";
        let s = StringField::slice_from(buf, 0, CodepageId::DEFAULT, true).unwrap();
        assert_eq!(s.bytes(), &buf[..]);
    }

    #[test]
    fn copy_utf8_buffer_too_small_fails() {
        let buf = b"abc\0";
        let s = StringField::slice_from(buf, 0, CodepageId::DEFAULT, false).unwrap();
        let mut small = [0u8; 3];
        assert!(matches!(s.copy_utf8(&mut small), Err(StringFieldError::BufferTooSmall { .. })));
        let mut exact = [0u8; 4];
        assert_eq!(s.copy_utf8(&mut exact).unwrap(), 4);
        assert_eq!(&exact, b"abc\0");
    }

    #[test]
    fn copy_utf16_buffer_too_small_fails() {
        let buf = b"abc\0";
        let s = StringField::slice_from(buf, 0, CodepageId::DEFAULT, false).unwrap();
        let mut small = [0u16; 3];
        assert!(matches!(s.copy_utf16(&mut small), Err(StringFieldError::BufferTooSmall { .. })));
        let mut exact = [0u16; 4];
        assert_eq!(s.copy_utf16(&mut exact).unwrap(), 4);
        assert_eq!(exact, [b'a' as u16, b'b' as u16, b'c' as u16, 0]);
        assert_eq!(s.utf16_size(), 8);
    }
}
