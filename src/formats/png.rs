//! Metadata of PNG images, taken from the IHDR chunk.

use std::fmt;
use std::io::{Read, Seek};

use byteorder::{BigEndian, ReadBytesExt};
use log::debug;

use crate::source::ByteSource;
use crate::traits::{ImageMetadata, LoadableMetadata};
use crate::types::{Dimensions, Result};

const SIGNATURE_LEN: u64 = 8;
const CHUNK_HEADER_LEN: usize = 8;
const IHDR_LEN: u32 = 13;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ColorType {
    Grayscale,
    Rgb,
    Indexed,
    GrayscaleAlpha,
    RgbAlpha,
}

const CT_GRAYSCALE: u8 = 0;
const CT_RGB: u8 = 2;
const CT_INDEXED: u8 = 3;
const CT_GRAYSCALE_ALPHA: u8 = 4;
const CT_RGB_ALPHA: u8 = 6;

impl ColorType {
    fn from_u8(n: u8) -> Option<ColorType> {
        match n {
            CT_GRAYSCALE       => Some(ColorType::Grayscale),
            CT_RGB             => Some(ColorType::Rgb),
            CT_INDEXED         => Some(ColorType::Indexed),
            CT_GRAYSCALE_ALPHA => Some(ColorType::GrayscaleAlpha),
            CT_RGB_ALPHA       => Some(ColorType::RgbAlpha),
            _                  => None,
        }
    }
}

fn compute_color_depth(bit_depth: u8, color_type: u8) -> Option<u8> {
    match color_type {
        CT_INDEXED => match bit_depth {
            1 | 2 | 4 | 8 => Some(bit_depth),
            _ => None,
        },
        CT_GRAYSCALE => match bit_depth {
            1 | 2 | 4 | 8 | 16 => Some(bit_depth),
            _ => None,
        },
        CT_GRAYSCALE_ALPHA => match bit_depth {
            8 | 16 => Some(bit_depth * 2),
            _ => None,
        },
        CT_RGB => match bit_depth {
            8 | 16 => Some(bit_depth * 3),
            _ => None,
        },
        CT_RGB_ALPHA => match bit_depth {
            8 | 16 => Some(bit_depth * 4),
            _ => None,
        },
        _ => None,
    }
}

/// Interlacing scheme of a PNG image.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum InterlaceMethod {
    Disabled,
    Adam7,
}

impl InterlaceMethod {
    // Only 0 and 1 are legal; anything but 1 is reported as not interlaced.
    fn from_u8(n: u8) -> InterlaceMethod {
        match n {
            1 => InterlaceMethod::Adam7,
            _ => InterlaceMethod::Disabled,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            InterlaceMethod::Disabled => "none",
            InterlaceMethod::Adam7 => "Adam7",
        }
    }
}

impl fmt::Display for InterlaceMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Metadata {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    /// Raw color type byte; see `typed_color_type()`.
    pub color_type: u8,
    pub compression_method: u8,
    pub filter_method: u8,
    pub interlace_method: InterlaceMethod,
}

impl Metadata {
    #[inline]
    pub fn typed_color_type(&self) -> Option<ColorType> {
        ColorType::from_u8(self.color_type)
    }
}

impl ImageMetadata for Metadata {
    #[inline]
    fn mime_type(&self) -> &'static str { "image/png" }

    #[inline]
    fn dimensions(&self) -> Dimensions {
        (self.width, self.height).into()
    }

    #[inline]
    fn color_depth(&self) -> Option<u8> {
        compute_color_depth(self.bit_depth, self.color_type)
    }
}

impl LoadableMetadata for Metadata {
    fn load<R: Read + Seek>(src: &mut ByteSource<R>) -> Result<Metadata> {
        // a short header is reported the same way as a wrong chunk type
        let header = src.read_at(SIGNATURE_LEN, CHUNK_HEADER_LEN)?;
        if header.len() != CHUNK_HEADER_LEN || &header[4..] != b"IHDR" {
            return Err(invalid_format!("IHDR chunk not found"));
        }

        let len = (&header[..4]).read_u32::<BigEndian>()?;
        if len != IHDR_LEN {
            return Err(invalid_format!("IHDR chunk should be exactly {} bytes, got {}", IHDR_LEN, len));
        }

        let data = src.read_exact_at(SIGNATURE_LEN + CHUNK_HEADER_LEN as u64, IHDR_LEN as usize)?;
        let r = &mut &data[..];

        let width = r.read_u32::<BigEndian>().map_err(if_eof!("when reading width"))?;
        let height = r.read_u32::<BigEndian>().map_err(if_eof!("when reading height"))?;
        let bit_depth = r.read_u8().map_err(if_eof!("when reading bit depth"))?;
        let color_type = r.read_u8().map_err(if_eof!("when reading color type"))?;
        let compression_method = r.read_u8().map_err(if_eof!("when reading compression method"))?;
        let filter_method = r.read_u8().map_err(if_eof!("when reading filter method"))?;
        let interlace_method = r.read_u8().map_err(if_eof!("when reading interlace method"))?;

        debug!("{}: PNG {}x{}, {} bits, color type {}", src.name(), width, height, bit_depth, color_type);

        Ok(Metadata {
            width,
            height,
            bit_depth,
            color_type,
            compression_method,
            filter_method,
            interlace_method: InterlaceMethod::from_u8(interlace_method),
        })
    }
}

impl_from_generic_metadata! { Metadata, Png }

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::types::ErrorKind;

    fn png_header(len: u32, kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
        data.extend_from_slice(&len.to_be_bytes());
        data.extend_from_slice(kind);
        data.extend_from_slice(body);
        data
    }

    fn ihdr(width: u32, height: u32, bit_depth: u8, color_type: u8, interlace: u8) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&width.to_be_bytes());
        body.extend_from_slice(&height.to_be_bytes());
        body.extend_from_slice(&[bit_depth, color_type, 0, 0, interlace]);
        // CRC, never checked
        body.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        png_header(13, b"IHDR", &body)
    }

    #[test]
    fn test_grayscale_fields() {
        let md = Metadata::load_from_buffer(&ihdr(7, 39, 1, 0, 0)).unwrap();
        assert_eq!(md, Metadata {
            width: 7,
            height: 39,
            bit_depth: 1,
            color_type: 0,
            compression_method: 0,
            filter_method: 0,
            interlace_method: InterlaceMethod::Disabled,
        });
        assert_eq!(md.interlace_method.to_string(), "none");
        assert_eq!(md.typed_color_type(), Some(ColorType::Grayscale));
    }

    #[test]
    fn test_big_endian_dimensions() {
        let md = Metadata::load_from_buffer(&ihdr(0x0102_0304, 0x0a0b_0c0d, 8, 6, 0)).unwrap();
        assert_eq!(md.dimensions(), Dimensions { width: 0x0102_0304, height: 0x0a0b_0c0d });
        assert_eq!(md.color_depth(), Some(32));
        assert_eq!(md.mime_type(), "image/png");
    }

    #[rstest]
    #[case(0, InterlaceMethod::Disabled)]
    #[case(1, InterlaceMethod::Adam7)]
    #[case(2, InterlaceMethod::Disabled)]
    #[case(255, InterlaceMethod::Disabled)]
    fn test_interlace_mapping(#[case] raw: u8, #[case] expected: InterlaceMethod) {
        let md = Metadata::load_from_buffer(&ihdr(1, 1, 8, 2, raw)).unwrap();
        assert_eq!(md.interlace_method, expected);
    }

    #[test]
    fn test_adam7_label() {
        let md = Metadata::load_from_buffer(&ihdr(1, 1, 8, 2, 1)).unwrap();
        assert_eq!(md.interlace_method.to_string(), "Adam7");
    }

    #[test]
    fn test_wrong_chunk_type() {
        let err = Metadata::load_from_buffer(&png_header(13, b"PLTE", &[0; 17])).unwrap_err();
        match err {
            crate::Error::InvalidFormat(ref s) => assert_eq!(s, "IHDR chunk not found"),
            ref e => panic!("unexpected error: {:?}", e),
        }
    }

    #[test]
    fn test_short_input_is_missing_ihdr() {
        let err = Metadata::load_from_buffer(b"not image\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatValidation);
        assert!(err.to_string().ends_with("IHDR chunk not found"));
    }

    #[rstest]
    #[case(12)]
    #[case(14)]
    #[case(0)]
    fn test_ihdr_length_mismatch(#[case] len: u32) {
        // payload is deliberately missing: the length check must fail first
        let err = Metadata::load_from_buffer(&png_header(len, b"IHDR", &[])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatValidation);
        assert!(err.to_string().contains(&format!("got {}", len)));
    }

    #[test]
    fn test_truncated_payload() {
        let err = Metadata::load_from_buffer(&png_header(13, b"IHDR", &[0; 6])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ShortRead);
    }

    #[test]
    fn test_illegal_bit_depth_has_no_color_depth() {
        let md = Metadata::load_from_buffer(&ihdr(1, 1, 3, 2, 0)).unwrap();
        assert_eq!(md.color_depth(), None);
    }
}
