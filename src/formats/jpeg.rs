//! Metadata of JPEG images, taken from the first baseline or progressive SOF segment.

use std::fmt;
use std::io::{Read, Seek};

use byteorder::{BigEndian, ReadBytesExt};
use log::{debug, trace};

use crate::source::ByteSource;
use crate::traits::{ImageMetadata, LoadableMetadata};
use crate::types::{Dimensions, Result};

const SOI_LEN: u64 = 2;
const MARKER_LEN: usize = 2;
const LENGTH_LEN: usize = 2;

const SOF0: u8 = 0xc0;
const SOF2: u8 = 0xc2;

/// Which start-of-frame marker carried the image geometry.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CodingProcess {
    Baseline,
    Progressive,
}

impl fmt::Display for CodingProcess {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            CodingProcess::Baseline => "Baseline DCT",
            CodingProcess::Progressive => "Progressive DCT",
        })
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Metadata {
    pub width: u16,
    pub height: u16,
    pub bits_per_sample: u8,
    pub coding_process: CodingProcess,
}

impl ImageMetadata for Metadata {
    #[inline]
    fn mime_type(&self) -> &'static str { "image/jpeg" }

    #[inline]
    fn dimensions(&self) -> Dimensions {
        (self.width, self.height).into()
    }

    #[inline]
    fn color_depth(&self) -> Option<u8> { None }
}

// Segment lengths count their own two bytes.
fn read_segment_length<R: Read + Seek>(src: &mut ByteSource<R>, offset: u64) -> Result<u16> {
    let data = src.read_at(offset, LENGTH_LEN)?;
    if data.len() != LENGTH_LEN {
        return Err(unexpected_eof!("failed to read two bytes at offset {}", offset));
    }
    let len = (&data[..]).read_u16::<BigEndian>()?;
    if (len as usize) < LENGTH_LEN {
        return Err(malformed!("invalid segment length {} at offset {}", len, offset));
    }
    Ok(len)
}

impl LoadableMetadata for Metadata {
    fn load<R: Read + Seek>(src: &mut ByteSource<R>) -> Result<Metadata> {
        let mut offset = SOI_LEN;
        loop {
            let marker = src.read_at(offset, MARKER_LEN)?;
            if marker.len() != MARKER_LEN {
                return Err(malformed!("reached end of stream without finding SOF marker"));
            }
            if marker[0] != 0xff {
                return Err(malformed!("unknown byte value 0x{:02X} at offset {}", marker[0], offset));
            }
            offset += MARKER_LEN as u64;

            match marker[1] {
                SOF0 | SOF2 => {
                    let len = read_segment_length(src, offset)? as usize;
                    let payload = src.read_exact_at(offset + LENGTH_LEN as u64, len - LENGTH_LEN)?;
                    let r = &mut &payload[..];

                    let bits_per_sample = r.read_u8().map_err(if_eof!("when reading sample precision"))?;
                    let height = r.read_u16::<BigEndian>().map_err(if_eof!("when reading height"))?;
                    let width = r.read_u16::<BigEndian>().map_err(if_eof!("when reading width"))?;

                    debug!("{}: JPEG {}x{}, {} bits per sample", src.name(), width, height, bits_per_sample);

                    return Ok(Metadata {
                        width,
                        height,
                        bits_per_sample,
                        coding_process: if marker[1] == SOF0 {
                            CodingProcess::Baseline
                        } else {
                            CodingProcess::Progressive
                        },
                    });
                }
                // RSTn, SOI and EOI have no payload
                0xd0..=0xd9 => trace!("standalone marker 0x{:02X} at offset {}", marker[1], offset - 2),
                other => {
                    let len = read_segment_length(src, offset)?;
                    trace!("skipping marker 0x{:02X} at offset {}, {} bytes", other, offset - 2, len);
                    offset += len as u64;
                }
            }
        }
    }
}

impl_from_generic_metadata! { Metadata, Jpeg }
