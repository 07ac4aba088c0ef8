//! `ByteSource` — the capability the core consumes for random-access reads.
//!
//! This is the narrow seam between the parser and whatever buffered-I/O
//! abstraction a caller already has (a memory-mapped file, a `std::fs::File`,
//! a disk-image slice). The core never owns a generic reader stack; it only
//! ever asks for `seek` + `read_exact` + `len`.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

pub trait ByteSource {
    fn seek(&mut self, offset: u64) -> io::Result<()>;
    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()>;
    fn len(&mut self) -> io::Result<u64>;

    fn is_empty(&mut self) -> io::Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Convenience: seek then read exactly `buf.len()` bytes.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.seek(offset)?;
        self.read_exact(buf)
    }
}

impl<T: Read + Seek> ByteSource for T {
    fn seek(&mut self, offset: u64) -> io::Result<()> {
        Seek::seek(self, SeekFrom::Start(offset)).map(|_| ())
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        Read::read_exact(self, buf)
    }

    fn len(&mut self) -> io::Result<u64> {
        let cur = Seek::stream_position(self)?;
        let end = Seek::seek(self, SeekFrom::End(0))?;
        Seek::seek(self, SeekFrom::Start(cur))?;
        Ok(end)
    }
}

/// Opens a plain file for use as a `ByteSource`. Provided as a convenience
/// since the overwhelming majority of callers hand the core a `File`.
pub fn open(path: impl AsRef<std::path::Path>) -> io::Result<File> {
    File::open(path)
}
