//! Random-access byte reader used by all decoders.

use std::borrow::Cow;
use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use log::{debug, trace};

use crate::types::Result;
use crate::utils::read_fully;

/// A scoped reader over one open input.
///
/// Every read is addressed by an absolute offset; no read position is carried between
/// calls. The underlying handle is released when the source is dropped, which happens on
/// every exit path of the decode call that owns it.
pub struct ByteSource<R = File> {
    inner: R,
    name: Cow<'static, str>,
    reads: usize,
}

impl ByteSource<File> {
    /// Opens the file at `path` for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<ByteSource<File>> {
        let path = path.as_ref();
        let file = File::open(path)?;
        debug!("opened {}", path.display());
        Ok(ByteSource::new(file, path.display().to_string()))
    }
}

impl<'a> ByteSource<Cursor<&'a [u8]>> {
    /// Wraps an in-memory buffer.
    pub fn from_buffer(buf: &'a [u8]) -> ByteSource<Cursor<&'a [u8]>> {
        ByteSource::new(Cursor::new(buf), "<buffer>")
    }
}

impl<R: Read + Seek> ByteSource<R> {
    pub fn new<N: Into<Cow<'static, str>>>(inner: R, name: N) -> ByteSource<R> {
        ByteSource {
            inner,
            name: name.into(),
            reads: 0,
        }
    }

    /// Human-readable name of the input (the file path for files).
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads up to `len` bytes at `offset`. The result is shorter than `len` only when the
    /// input ends first.
    pub fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        self.inner.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        let n = read_fully(&mut self.inner, &mut buf)?;
        buf.truncate(n);
        self.reads += 1;
        Ok(buf)
    }

    /// Reads exactly `len` bytes at `offset`, failing with `UnexpectedEndOfFile` otherwise.
    pub fn read_exact_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let buf = self.read_at(offset, len)?;
        if buf.len() != len {
            return Err(unexpected_eof!(
                "failed to read {} bytes at offset {} (got {})",
                len,
                offset,
                buf.len()
            ));
        }
        Ok(buf)
    }
}

impl<R> Drop for ByteSource<R> {
    fn drop(&mut self) {
        trace!("releasing {} after {} reads", self.name, self.reads);
    }
}
