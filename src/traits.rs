use std::io::{Read, Seek};
use std::path::Path;

use crate::source::ByteSource;
use crate::types::{Dimensions, Result};

/// Properties shared by all still image formats.
pub trait ImageMetadata {
    fn mime_type(&self) -> &'static str;

    fn dimensions(&self) -> Dimensions;

    /// Bits per pixel, if the format header defines it.
    fn color_depth(&self) -> Option<u8>;
}

pub trait LoadableMetadata: Sized {
    fn load<R: Read + Seek>(src: &mut ByteSource<R>) -> Result<Self>;

    #[inline]
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut src = ByteSource::open(path)?;
        Self::load(&mut src)
    }

    #[inline]
    fn load_from_buffer(buf: &[u8]) -> Result<Self> {
        Self::load(&mut ByteSource::from_buffer(buf))
    }
}
