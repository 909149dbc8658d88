use std::io::{self, ErrorKind, Read};

/// Reads into `buf` until it is full or the reader is exhausted, returning the number of
/// bytes actually read. Unlike `Read::read_exact`, a short read is not an error here.
pub fn read_fully<R: Read + ?Sized>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut read = 0;
    while read < buf.len() {
        match r.read(&mut buf[read..]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(read)
}

/// Advances a slice reader by up to `n` bytes and returns how many were dropped.
pub fn drop_bytes(r: &mut &[u8], n: usize) -> usize {
    let n = n.min(r.len());
    *r = &r[n..];
    n
}
