use std::fmt;
use std::io::{Read, Seek};
use std::path::Path;

use log::debug;

use crate::formats::{gif, jpeg, mp4, png};
use crate::source::ByteSource;
use crate::traits::{ImageMetadata, LoadableMetadata};
use crate::types::{Dimensions, Error, Result};

/// Still image formats recognized by their leading bytes.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Png => "PNG",
            ImageFormat::Gif => "GIF",
        })
    }
}

// Checked in this order; the first match wins.
const SIGNATURES: &[(&[u8], ImageFormat)] = &[
    (b"\xff\xd8", ImageFormat::Jpeg),
    (b"\x89PNG\r\n\x1a\n", ImageFormat::Png),
    (b"GIF89a", ImageFormat::Gif),
    (b"GIF87a", ImageFormat::Gif),
];

const SNIFF_LEN: usize = 8;

/// Detects the image format from the first bytes of `src`.
pub fn sniff<R: Read + Seek>(src: &mut ByteSource<R>) -> Result<Option<ImageFormat>> {
    let head = src.read_at(0, SNIFF_LEN)?;
    let format = SIGNATURES
        .iter()
        .find(|&&(signature, _)| head.starts_with(signature))
        .map(|&(_, format)| format);
    debug!("{}: sniffed {:?}", src.name(), format);
    Ok(format)
}

/// Metadata of an image of any supported format.
#[derive(Clone, PartialEq, Debug)]
pub enum GenericMetadata {
    Png(png::Metadata),
    Gif(gif::Metadata),
    Jpeg(jpeg::Metadata),
}

/// Conversion from `GenericMetadata` to a concrete format's metadata.
pub trait FromGenericMetadata: Sized {
    fn from_generic_metadata(md: GenericMetadata) -> ::std::result::Result<Self, GenericMetadata>;
    fn from_generic_metadata_ref(md: &GenericMetadata) -> Option<&Self>;
}

impl GenericMetadata {
    pub fn format(&self) -> ImageFormat {
        match *self {
            GenericMetadata::Png(_) => ImageFormat::Png,
            GenericMetadata::Gif(_) => ImageFormat::Gif,
            GenericMetadata::Jpeg(_) => ImageFormat::Jpeg,
        }
    }

    #[inline]
    pub fn as_metadata<T: FromGenericMetadata>(&self) -> Option<&T> {
        T::from_generic_metadata_ref(self)
    }

    /// Returns the concrete metadata, or `self` back if it is of a different format.
    #[inline]
    pub fn into_metadata<T: FromGenericMetadata>(self) -> ::std::result::Result<T, GenericMetadata> {
        T::from_generic_metadata(self)
    }

    fn inner(&self) -> &dyn ImageMetadata {
        match *self {
            GenericMetadata::Png(ref md) => md,
            GenericMetadata::Gif(ref md) => md,
            GenericMetadata::Jpeg(ref md) => md,
        }
    }
}

impl ImageMetadata for GenericMetadata {
    #[inline]
    fn mime_type(&self) -> &'static str {
        self.inner().mime_type()
    }

    #[inline]
    fn dimensions(&self) -> Dimensions {
        self.inner().dimensions()
    }

    #[inline]
    fn color_depth(&self) -> Option<u8> {
        self.inner().color_depth()
    }
}

/// Sniffs the format of an already open source and decodes it with the matching decoder.
pub fn load_image<R: Read + Seek>(src: &mut ByteSource<R>) -> Result<GenericMetadata> {
    match sniff(src)? {
        Some(ImageFormat::Jpeg) => jpeg::Metadata::load(src).map(GenericMetadata::Jpeg),
        Some(ImageFormat::Png) => png::Metadata::load(src).map(GenericMetadata::Png),
        Some(ImageFormat::Gif) => gif::Metadata::load(src).map(GenericMetadata::Gif),
        None => Err(Error::UnknownFormat(src.name().to_owned().into())),
    }
}

/// Detects the format of the image at `path` and decodes it.
///
/// The file is opened once for sniffing and closed again; the chosen decoder opens it anew.
pub fn decode_image<P: AsRef<Path>>(path: P) -> Result<GenericMetadata> {
    let path = path.as_ref();
    let format = sniff(&mut ByteSource::open(path)?)?;
    match format {
        Some(ImageFormat::Jpeg) => decode_jpeg(path).map(GenericMetadata::Jpeg),
        Some(ImageFormat::Png) => decode_png(path).map(GenericMetadata::Png),
        Some(ImageFormat::Gif) => decode_gif(path).map(GenericMetadata::Gif),
        None => Err(Error::UnknownFormat(path.display().to_string().into())),
    }
}

pub fn decode_png<P: AsRef<Path>>(path: P) -> Result<png::Metadata> {
    png::Metadata::load_from_file(path)
}

pub fn decode_gif<P: AsRef<Path>>(path: P) -> Result<gif::Metadata> {
    gif::Metadata::load_from_file(path)
}

pub fn decode_jpeg<P: AsRef<Path>>(path: P) -> Result<jpeg::Metadata> {
    jpeg::Metadata::load_from_file(path)
}

/// Decodes MP4 timing and frame size. MP4 has no signature and is never auto-detected.
pub fn decode_mp4<P: AsRef<Path>>(path: P) -> Result<mp4::Metadata> {
    mp4::Metadata::load_from_file(path)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::types::ErrorKind;

    #[rstest]
    #[case(b"\xff\xd8\xff\xe0", Some(ImageFormat::Jpeg))]
    #[case(b"\x89PNG\r\n\x1a\n\0\0", Some(ImageFormat::Png))]
    #[case(b"GIF89a\x01\x00", Some(ImageFormat::Gif))]
    #[case(b"GIF87a", Some(ImageFormat::Gif))]
    #[case(b"\x89PNG\r\n", None)]
    #[case(b"GIF88a\x01\x00", None)]
    #[case(b"", None)]
    fn test_sniff(#[case] head: &[u8], #[case] expected: Option<ImageFormat>) {
        let mut src = ByteSource::from_buffer(head);
        assert_eq!(sniff(&mut src).unwrap(), expected);
    }

    #[test]
    fn test_load_image_dispatches() {
        let mut data = b"GIF89a".to_vec();
        data.extend_from_slice(&[7, 0, 39, 0, 0, 0, 0]);
        let md = load_image(&mut ByteSource::from_buffer(&data)).unwrap();
        assert_eq!(md.format(), ImageFormat::Gif);
        assert_eq!(md.mime_type(), "image/gif");
        assert_eq!(md.dimensions(), Dimensions { width: 7, height: 39 });
        assert!(md.as_metadata::<png::Metadata>().is_none());
        let gif = md.into_metadata::<gif::Metadata>().unwrap();
        assert_eq!(gif.pixel_aspect_ratio_computed, None);
    }

    #[test]
    fn test_load_image_unknown_format_names_source() {
        let err = load_image(&mut ByteSource::from_buffer(b"hello")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownFormat);
        assert!(err.to_string().contains("<buffer>"));
    }

    #[test]
    fn test_into_metadata_returns_original_on_mismatch() {
        let md = GenericMetadata::from(jpeg::Metadata {
            width: 1,
            height: 2,
            bits_per_sample: 8,
            coding_process: jpeg::CodingProcess::Baseline,
        });
        let md = md.into_metadata::<gif::Metadata>().unwrap_err();
        assert_eq!(md.format(), ImageFormat::Jpeg);
        assert_eq!(md.color_depth(), None);
    }
}
