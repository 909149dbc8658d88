macro_rules! invalid_format {
    ($s:expr) => {
        $crate::types::Error::InvalidFormat($s.into())
    };
    ($fmt:expr, $($args:tt)*) => {
        $crate::types::Error::InvalidFormat(format!($fmt, $($args)*).into())
    }
}

macro_rules! unexpected_eof {
    () => {
        $crate::types::Error::UnexpectedEndOfFile(None)
    };
    ($s:expr) => {
        $crate::types::Error::UnexpectedEndOfFile(Some($s.into()))
    };
    ($fmt:expr, $($args:tt)*) => {
        $crate::types::Error::UnexpectedEndOfFile(Some(format!($fmt, $($args)*).into()))
    }
}

macro_rules! malformed {
    ($s:expr) => {
        $crate::types::Error::Malformed($s.into())
    };
    ($fmt:expr, $($args:tt)*) => {
        $crate::types::Error::Malformed(format!($fmt, $($args)*).into())
    }
}

// Turns an `UnexpectedEof` coming out of a `byteorder` read into a contextual error.
macro_rules! if_eof {
    ($($args:tt)*) => {
        |e: ::std::io::Error| match e.kind() {
            ::std::io::ErrorKind::UnexpectedEof => unexpected_eof!($($args)*),
            _ => $crate::types::Error::from(e)
        }
    }
}

macro_rules! impl_from_generic_metadata {
    ($t:ident, $variant:ident) => {
        impl $crate::generic::FromGenericMetadata for $t {
            fn from_generic_metadata(
                md: $crate::generic::GenericMetadata,
            ) -> ::std::result::Result<$t, $crate::generic::GenericMetadata> {
                match md {
                    $crate::generic::GenericMetadata::$variant(md) => Ok(md),
                    md => Err(md),
                }
            }

            fn from_generic_metadata_ref(md: &$crate::generic::GenericMetadata) -> Option<&$t> {
                match *md {
                    $crate::generic::GenericMetadata::$variant(ref md) => Some(md),
                    _ => None,
                }
            }
        }

        impl From<$t> for $crate::generic::GenericMetadata {
            #[inline]
            fn from(md: $t) -> $crate::generic::GenericMetadata {
                $crate::generic::GenericMetadata::$variant(md)
            }
        }
    };
}
