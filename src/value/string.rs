//! Runtime strings: bytes tagged with the charset they are encoded in

use crate::error::Result;
use crate::transcode::{self, Charset};
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RString {
    bytes: Vec<u8>,
    charset: Charset,
}

impl RString {
    /// UTF-8 string
    pub fn new(s: &str) -> Self {
        Self {
            bytes: s.as_bytes().to_vec(),
            charset: Charset::Utf8,
        }
    }

    /// Tag raw bytes with a charset; no validation happens here
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, charset: Charset) -> Self {
        Self {
            bytes: bytes.into(),
            charset,
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    #[inline]
    pub fn charset(&self) -> Charset {
        self.charset
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrow as `&str` when tagged UTF-8 and valid
    pub fn to_str(&self) -> Option<&str> {
        match self.charset {
            Charset::Utf8 => std::str::from_utf8(&self.bytes).ok(),
            _ => None,
        }
    }

    /// Re-encode into `target`
    ///
    /// Fails with an encoding error when the bytes are invalid in the current
    /// charset or a character has no mapping in `target`.
    pub fn export_to(&self, target: Charset) -> Result<RString> {
        let bytes = transcode::transcode(&self.bytes, self.charset, target)?;
        Ok(Self::from_bytes(bytes, target))
    }

    /// Shorthand for `export_to(Charset::Utf8)`
    pub fn to_utf8(&self) -> Result<RString> {
        self.export_to(Charset::Utf8)
    }

    pub(crate) fn write_inspect(&self, out: &mut String) {
        out.push('"');
        let text = match self.charset {
            Charset::Utf8 | Charset::UsAscii => std::str::from_utf8(&self.bytes).ok(),
            _ => None,
        };
        match text {
            Some(text) => {
                let mut chars = text.chars().peekable();
                while let Some(c) = chars.next() {
                    match c {
                        '"' => out.push_str("\\\""),
                        '\\' => out.push_str("\\\\"),
                        '\n' => out.push_str("\\n"),
                        '\t' => out.push_str("\\t"),
                        '\r' => out.push_str("\\r"),
                        '\u{1b}' => out.push_str("\\e"),
                        '#' if matches!(chars.peek(), Some(&('{' | '$' | '@'))) => out.push_str("\\#"),
                        c if c.is_control() => {
                            let _ = write!(out, "\\u{:04X}", c as u32);
                        }
                        c => out.push(c),
                    }
                }
            }
            None => {
                for &b in &self.bytes {
                    match b {
                        b'"' => out.push_str("\\\""),
                        b'\\' => out.push_str("\\\\"),
                        0x20..=0x7e => out.push(b as char),
                        _ => {
                            let _ = write!(out, "\\x{:02X}", b);
                        }
                    }
                }
            }
        }
        out.push('"');
    }
}

impl From<&str> for RString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
