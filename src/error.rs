//! Error taxonomy for conversions
//!
//! Every failure carries the runtime's error class and the message the runtime
//! would show. Errors raised while filling a buffer travel through the guard
//! untouched; nothing in this crate wraps them.

use std::fmt;
use thiserror::Error;

/// Error class as seen by the scripting runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Value not coercible to the expected shape
    Type,
    /// Numeric value outside the target width
    Range,
    /// Invalid byte sequence or failed transcoding
    Encoding,
    /// Unrecognized option key, bad encoding name, embedded NUL
    Argument,
}

impl ErrorKind {
    /// Runtime class name for this kind
    pub const fn class_name(self) -> &'static str {
        match self {
            Self::Type => "TypeError",
            Self::Range => "RangeError",
            Self::Encoding => "EncodingError",
            Self::Argument => "ArgumentError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

/// Conversion failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarshalError {
    #[error("{0}")]
    Type(String),
    #[error("{0}")]
    Range(String),
    #[error("{0}")]
    Encoding(String),
    #[error("{0}")]
    Argument(String),
}

impl MarshalError {
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type(message.into())
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        Self::Range(message.into())
    }

    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::Encoding(message.into())
    }

    pub fn argument_error(message: impl Into<String>) -> Self {
        Self::Argument(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Type(_) => ErrorKind::Type,
            Self::Range(_) => ErrorKind::Range,
            Self::Encoding(_) => ErrorKind::Encoding,
            Self::Argument(_) => ErrorKind::Argument,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Type(m) | Self::Range(m) | Self::Encoding(m) | Self::Argument(m) => m,
        }
    }
}

pub type Result<T> = std::result::Result<T, MarshalError>;
