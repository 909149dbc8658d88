//! Reads structural metadata (dimensions, bit depth, interlacing, timing) from PNG, GIF,
//! JPEG and MP4 files without decoding any pixel or sample data.
//!
//! Each decoder reads only the header records it needs, at absolute offsets, through a
//! `ByteSource` that is released when the decode call returns.

pub use crate::generic::*;
pub use crate::source::ByteSource;
pub use crate::traits::*;
pub use crate::types::{Dimensions, Error, ErrorKind, Result};

#[macro_use]
mod macros;
mod generic;
mod source;
mod traits;
mod types;
mod utils;

pub mod formats;
