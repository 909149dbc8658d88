//! Metadata of GIF images, taken from the logical screen descriptor.

use std::io::{Read, Seek};

use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;

use crate::source::ByteSource;
use crate::traits::{ImageMetadata, LoadableMetadata};
use crate::types::{Dimensions, Result};

const SIGNATURE_LEN: usize = 6;
// width, height, packed flags, background color index, pixel aspect ratio
const DESCRIPTOR_LEN: usize = 7;

/// GIF file version number.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Version {
    V87a,
    V89a,
}

impl Version {
    fn from_signature(b: &[u8]) -> Option<Version> {
        match b {
            b"GIF87a" => Some(Version::V87a),
            b"GIF89a" => Some(Version::V89a),
            _ => None,
        }
    }
}

/// Contains information about the global color table.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ColorTable {
    /// Color table size, between 2 and 256.
    pub size: u16,
    /// Whether the color table is sorted in order of decreasing importance.
    pub sorted: bool,
}

/// Contains metadata about the whole GIF image.
#[derive(Clone, PartialEq, Debug)]
pub struct Metadata {
    /// GIF format version, if the file starts with a recognized signature.
    pub version: Option<Version>,

    /// Logical screen width.
    pub width: u16,
    /// Logical screen height.
    pub height: u16,

    /// Information about global color table, if it is present.
    pub global_color_table: Option<ColorTable>,

    /// Index of the default background color in the global color table.
    ///
    /// Only meaningful when a global color table is present, so it is `None` otherwise.
    pub background_color_index: Option<u8>,

    /// Number of bits per primary color available to the original image, minus 1.
    ///
    /// This is the raw 3-bit field, between 0 and 7.
    pub color_resolution: u8,

    /// A factor which defines the aspect ratio of a pixel in the original image.
    ///
    /// If zero, no information about pixel aspect ratio is available.
    pub pixel_aspect_ratio: u8,

    /// Approximation of the pixel aspect ratio computed with the formula from the GIF spec:
    ///
    /// > Aspect Ratio = (Pixel Aspect Ratio + 15) / 64
    ///
    /// `None` when `pixel_aspect_ratio` is zero.
    pub pixel_aspect_ratio_computed: Option<f64>,
}

fn pixel_aspect_ratio_approx(raw: u8) -> Option<f64> {
    if raw == 0 {
        None
    } else {
        Some((raw as f64 + 15.0) / 64.0)
    }
}

impl ImageMetadata for Metadata {
    #[inline]
    fn mime_type(&self) -> &'static str { "image/gif" }

    #[inline]
    fn dimensions(&self) -> Dimensions {
        (self.width, self.height).into()
    }

    // GIF has no per-pixel depth in its header; the palette index width is derived from
    // the global color table size.
    fn color_depth(&self) -> Option<u8> {
        self.global_color_table
            .as_ref()
            .map(|t| 16 - t.size.leading_zeros() as u8 - 1)
    }
}

impl LoadableMetadata for Metadata {
    fn load<R: Read + Seek>(src: &mut ByteSource<R>) -> Result<Metadata> {
        let signature = src.read_at(0, SIGNATURE_LEN)?;
        let version = Version::from_signature(&signature);

        let descriptor = src.read_at(SIGNATURE_LEN as u64, DESCRIPTOR_LEN)?;
        if descriptor.len() != DESCRIPTOR_LEN {
            return Err(unexpected_eof!("Logical screen descriptor is missing or malformed"));
        }
        let r = &mut &descriptor[..];

        let width = r.read_u16::<LittleEndian>().map_err(if_eof!("when reading logical width"))?;
        let height = r.read_u16::<LittleEndian>().map_err(if_eof!("when reading logical height"))?;

        let packed_flags = r.read_u8().map_err(if_eof!("when reading global flags"))?;
        let global_color_table =        (packed_flags & 0b1000_0000) > 0;
        let color_resolution =          (packed_flags & 0b0111_0000) >> 4;
        let global_color_table_sorted = (packed_flags & 0b0000_1000) > 0;
        let global_color_table_size_p =  packed_flags & 0b0000_0111;

        let background_color_index = r.read_u8().map_err(if_eof!("when reading background color index"))?;
        let pixel_aspect_ratio = r.read_u8().map_err(if_eof!("when reading pixel aspect ratio"))?;

        debug!("{}: GIF {}x{}, flags 0b{:08b}", src.name(), width, height, packed_flags);

        Ok(Metadata {
            version,
            width,
            height,
            global_color_table: if global_color_table {
                Some(ColorTable {
                    size: 1u16 << (global_color_table_size_p + 1),
                    sorted: global_color_table_sorted,
                })
            } else {
                None
            },
            background_color_index: if global_color_table {
                Some(background_color_index)
            } else {
                None
            },
            color_resolution,
            pixel_aspect_ratio,
            pixel_aspect_ratio_computed: pixel_aspect_ratio_approx(pixel_aspect_ratio),
        })
    }
}

impl_from_generic_metadata! { Metadata, Gif }
