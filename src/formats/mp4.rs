//! Metadata of MP4 (ISO base media) files: movie timing and the first track's frame size.
//!
//! Boxes are length-prefixed records with a four-character type. The walker looks for the
//! `moov` box at the top level and, inside it, for `mvhd` (timing) and the `tkhd` of the
//! first `trak` (frame size). Everything else is skipped by its declared length.

use std::cmp;
use std::fmt;
use std::io::{Read, Seek};
use std::str;

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use log::{debug, trace};

use crate::source::ByteSource;
use crate::traits::LoadableMetadata;
use crate::types::{Dimensions, Result};
use crate::utils::drop_bytes;

const HEADER_LEN: u64 = 8;
const LARGE_HEADER_LEN: u64 = 16;


#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct BoxType([u8; 4]);

pub const MOOV: BoxType = BoxType(*b"moov");
pub const MVHD: BoxType = BoxType(*b"mvhd");
pub const TRAK: BoxType = BoxType(*b"trak");
pub const TKHD: BoxType = BoxType(*b"tkhd");

impl BoxType {
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        str::from_utf8(&self.0).ok()
    }
}

impl fmt::Display for BoxType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.as_str() {
            Some(s) => f.write_str(s),
            None => write!(f, "{:?}", self.0),
        }
    }
}

impl fmt::Debug for BoxType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BoxType({})", self)
    }
}

#[derive(Copy, Clone, Debug)]
struct BoxHeader {
    offset: u64,
    /// Declared size including the header; 0 means "up to the end of the enclosing space".
    size: u64,
    header_len: u64,
    box_type: BoxType,
}

impl BoxHeader {
    #[inline]
    fn payload_offset(&self) -> u64 {
        self.offset + self.header_len
    }

    #[inline]
    fn payload_len(&self) -> u64 {
        self.size.saturating_sub(self.header_len)
    }

    /// End offset of a box that must carry its own length.
    fn end(&self) -> Result<u64> {
        if self.size < self.header_len {
            return Err(malformed!(
                "invalid length {} of {} box at offset {}", self.size, self.box_type, self.offset
            ));
        }
        Ok(self.offset.saturating_add(self.size))
    }
}

#[derive(Copy, Clone, Debug)]
struct MovieTiming {
    timescale: u32,
    duration: u64,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Metadata {
    /// Number of time units per second.
    pub timescale: u32,
    /// Movie duration in `timescale` units.
    pub duration: u64,
    pub duration_seconds: f64,
    /// Frame width of the first track, converted from 16.16 fixed point.
    pub width: f64,
    /// Frame height of the first track, converted from 16.16 fixed point.
    pub height: f64,
}

impl Metadata {
    /// Frame size rounded to whole pixels.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width.round() as u32,
            height: self.height.round() as u32,
        }
    }
}

fn fixed_16_16(raw: u32) -> f64 {
    raw as f64 / 65536.0
}

fn skip(r: &mut &[u8], n: usize, what: &str) -> Result<()> {
    if drop_bytes(r, n) != n {
        return Err(unexpected_eof!("when skipping {}", what));
    }
    Ok(())
}

/// Walks the box tree of one source. The cursor only ever moves forward.
struct BoxWalker<'a, R> {
    src: &'a mut ByteSource<R>,
    cursor: u64,
}

impl<'a, R: Read + Seek> BoxWalker<'a, R> {
    fn new(src: &'a mut ByteSource<R>) -> BoxWalker<'a, R> {
        BoxWalker { src, cursor: 0 }
    }

    fn advance_to(&mut self, offset: u64) {
        self.cursor = cmp::max(self.cursor, offset);
    }

    /// Reads the box header at the cursor. Running out of input or failing to read is
    /// reported as `None`: at this level it only means there are no more boxes.
    fn next_header(&mut self) -> Option<BoxHeader> {
        let offset = self.cursor;
        let data = match self.src.read_at(offset, HEADER_LEN as usize) {
            Ok(data) => data,
            Err(e) => {
                debug!("{}: stopping box scan at offset {}: {}", self.src.name(), offset, e);
                return None;
            }
        };
        if data.len() != HEADER_LEN as usize {
            return None;
        }

        let box_type = BoxType([data[4], data[5], data[6], data[7]]);
        let (size, header_len) = match BigEndian::read_u32(&data[..4]) {
            // 64-bit size follows the type
            1 => {
                let ext = self.src.read_at(offset + HEADER_LEN, 8).ok()?;
                if ext.len() != 8 {
                    return None;
                }
                (BigEndian::read_u64(&ext), LARGE_HEADER_LEN)
            }
            n => (n as u64, HEADER_LEN),
        };

        trace!("{} box at offset {}, {} bytes", box_type, offset, size);
        Some(BoxHeader { offset, size, header_len, box_type })
    }

    fn find_movie(&mut self) -> Result<Metadata> {
        loop {
            let header = match self.next_header() {
                Some(h) => h,
                None => return Err(malformed!("failed to find relevant moov or tkhd boxes")),
            };

            if header.box_type == MOOV {
                // a zero-sized moov extends to the end of the file
                let end = if header.size == 0 { u64::MAX } else { header.end()? };
                self.advance_to(header.payload_offset());
                if let Some(md) = self.scan_movie(end)? {
                    return Ok(md);
                }
                debug!("{}: moov box at offset {} is incomplete", self.src.name(), header.offset);
                if end == u64::MAX {
                    return Err(malformed!("failed to find relevant moov or tkhd boxes"));
                }
                self.advance_to(end);
                continue;
            }

            if header.size == 0 {
                return Err(malformed!("failed to read box length at offset {}", header.offset));
            }
            let end = header.end()?;
            self.advance_to(end);
        }
    }

    fn scan_movie(&mut self, end: u64) -> Result<Option<Metadata>> {
        let mut timing = None;
        let mut frame_size = None;

        while self.cursor < end {
            let header = match self.next_header() {
                Some(h) => h,
                None => break,
            };
            let box_end = header.end()?;

            match header.box_type {
                MVHD => {
                    if let Some(t) = self.read_movie_header(&header)? {
                        timing = Some(t);
                    }
                }
                TRAK if frame_size.is_none() => {
                    self.advance_to(header.payload_offset());
                    frame_size = self.find_track_header(box_end)?;
                }
                _ => {}
            }
            self.advance_to(box_end);

            if let (Some(t), Some((width, height))) = (timing, frame_size) {
                return Ok(Some(Metadata {
                    timescale: t.timescale,
                    duration: t.duration,
                    duration_seconds: t.duration as f64 / t.timescale as f64,
                    width,
                    height,
                }));
            }
        }
        Ok(None)
    }

    fn find_track_header(&mut self, end: u64) -> Result<Option<(f64, f64)>> {
        while self.cursor < end {
            let header = match self.next_header() {
                Some(h) => h,
                None => break,
            };
            let box_end = header.end()?;

            if header.box_type == TKHD {
                if let Some(size) = self.read_track_header(&header)? {
                    return Ok(Some(size));
                }
            }
            self.advance_to(box_end);
        }
        Ok(None)
    }

    fn read_movie_header(&mut self, header: &BoxHeader) -> Result<Option<MovieTiming>> {
        if header.payload_len() == 0 {
            return Ok(None);
        }
        let data = self.src.read_exact_at(header.payload_offset(), header.payload_len() as usize)?;
        let r = &mut &data[..];

        let version = r.read_u8().map_err(if_eof!("when reading mvhd version"))?;
        skip(r, 3, "mvhd flags")?;
        skip(r, if version == 1 { 16 } else { 8 }, "mvhd creation and modification times")?;

        let timescale_offset = header.payload_offset() + (data.len() - r.len()) as u64;
        let timescale = r.read_u32::<BigEndian>().map_err(if_eof!("when reading mvhd time scale"))?;
        if timescale == 0 {
            return Err(malformed!("time scale is zero at offset {}", timescale_offset));
        }

        let duration = if version == 1 {
            r.read_u64::<BigEndian>()
        } else {
            r.read_u32::<BigEndian>().map(u64::from)
        }.map_err(if_eof!("when reading mvhd duration"))?;

        debug!("{}: mvhd version {}, time scale {}, duration {}", self.src.name(), version, timescale, duration);
        Ok(Some(MovieTiming { timescale, duration }))
    }

    fn read_track_header(&mut self, header: &BoxHeader) -> Result<Option<(f64, f64)>> {
        if header.payload_len() == 0 {
            return Ok(None);
        }
        let data = self.src.read_exact_at(header.payload_offset(), header.payload_len() as usize)?;
        let r = &mut &data[..];

        let version = r.read_u8().map_err(if_eof!("when reading tkhd version"))?;
        skip(r, 3, "tkhd flags")?;
        skip(r, if version == 1 { 16 } else { 8 }, "tkhd creation and modification times")?;
        skip(r, 4, "tkhd track id")?;
        skip(r, 8, "tkhd reserved bytes")?;
        skip(r, if version == 1 { 8 } else { 4 }, "tkhd duration")?;
        skip(r, 4 + 2 + 2 + 2 + 2, "tkhd layer, alternate group and volume")?;
        skip(r, 36, "tkhd transformation matrix")?;

        let width = r.read_u32::<BigEndian>().map_err(if_eof!("when reading tkhd width"))?;
        let height = r.read_u32::<BigEndian>().map_err(if_eof!("when reading tkhd height"))?;

        debug!("{}: tkhd version {}, frame {:#x}x{:#x}", self.src.name(), version, width, height);
        Ok(Some((fixed_16_16(width), fixed_16_16(height))))
    }
}

impl LoadableMetadata for Metadata {
    fn load<R: Read + Seek>(src: &mut ByteSource<R>) -> Result<Metadata> {
        BoxWalker::new(src).find_movie()
    }
}
