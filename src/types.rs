use std::borrow::Cow;
use std::io;
use std::result;

use thiserror::Error;

/// Errors which can happen while reading media metadata.
#[derive(Debug, Error)]
pub enum Error {
    /// A record has the wrong type or a wrong fixed size.
    #[error("invalid format: {0}")]
    InvalidFormat(Cow<'static, str>),

    /// Fewer bytes were available than a record requires.
    #[error("unexpected end of file{}", context_suffix(.0))]
    UnexpectedEndOfFile(Option<Cow<'static, str>>),

    /// The structure of the file makes it impossible to continue, e.g. a zero-length box,
    /// a zero time scale or an unknown marker byte.
    #[error("malformed structure: {0}")]
    Malformed(Cow<'static, str>),

    /// None of the known signatures matched; carries the name of the input.
    #[error("unable to detect PNG/JPEG/GIF magic number in \"{0}\"")]
    UnknownFormat(Cow<'static, str>),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn context_suffix(context: &Option<Cow<'static, str>>) -> String {
    match *context {
        Some(ref s) => format!(": {}", s),
        None => String::new(),
    }
}

/// Coarse classification of an `Error`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ErrorKind {
    Io,
    ShortRead,
    FormatValidation,
    UnknownFormat,
    MalformedStructure,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match *self {
            Error::InvalidFormat(_) => ErrorKind::FormatValidation,
            Error::UnexpectedEndOfFile(_) => ErrorKind::ShortRead,
            Error::Malformed(_) => ErrorKind::MalformedStructure,
            Error::UnknownFormat(_) => ErrorKind::UnknownFormat,
            Error::Io(_) => ErrorKind::Io,
        }
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Pixel dimensions of an image or a video frame.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl<T: Into<u32>, U: Into<u32>> From<(T, U)> for Dimensions {
    fn from((w, h): (T, U)) -> Dimensions {
        Dimensions {
            width: w.into(),
            height: h.into(),
        }
    }
}
