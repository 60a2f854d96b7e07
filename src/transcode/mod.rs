//! Charset-aware transcoding
//!
//! Architecture:
//! - `mod.rs` - `Charset` and byte-level `transcode`
//! - `detect.rs` - one-time filename charset detection (`FilenameCodec`)
//! - `filename.rs` - text and filename conversions on `Marshaller`
//!
//! Runtime text is UTF-8 unless tagged otherwise. Decoding and encoding go
//! through `encoding_rs`; ASCII-8BIT and US-ASCII are handled here since
//! the WHATWG tables have no equivalent for them.

mod detect;
mod filename;


pub use detect::{locale_codeset, FilenameCodec};

use crate::error::{MarshalError, Result};
use crate::logging;
use encoding_rs::{DecoderResult, EncoderResult, Encoding};
use std::fmt;

/// A character encoding a runtime string can be tagged with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Utf8,
    /// ASCII-8BIT: raw bytes, no character semantics
    Binary,
    UsAscii,
    Encoded(&'static Encoding),
}

impl Charset {
    /// Find a charset by name, case-insensitively
    ///
    /// Accepts the runtime's names (`ASCII-8BIT`, `BINARY`, `US-ASCII`), the
    /// POSIX codeset name `ANSI_X3.4-1968`, the runtime's aliases and locale
    /// codesets that WHATWG does not list (`eucJP`, `ujis`, `SJIS`, `CP932`,
    /// `eucKR`, `CP949`, `eucCN`, `CP936`, `Big5-HKSCS`), and every WHATWG label.
    pub fn lookup(name: &str) -> Option<Self> {
        let name = name.trim();
        let is = |candidate: &str| name.eq_ignore_ascii_case(candidate);

        if is("utf-8") || is("utf8") {
            Some(Self::Utf8)
        } else if is("ascii-8bit") || is("binary") {
            Some(Self::Binary)
        } else if is("us-ascii") || is("ascii") || is("ansi_x3.4-1968") || is("646") {
            Some(Self::UsAscii)
        } else if let Some(label) = runtime_alias(name) {
            Encoding::for_label(label.as_bytes()).map(Self::from_encoding)
        } else {
            Encoding::for_label(name.as_bytes()).map(Self::from_encoding)
        }
    }

    pub fn from_encoding(encoding: &'static Encoding) -> Self {
        if encoding == encoding_rs::UTF_8 {
            Self::Utf8
        } else {
            Self::Encoded(encoding)
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Binary => "ASCII-8BIT",
            Self::UsAscii => "US-ASCII",
            Self::Encoded(encoding) => encoding.name(),
        }
    }

    /// Whether ASCII bytes mean ASCII characters in this charset
    pub fn is_ascii_compatible(self) -> bool {
        match self {
            Self::Utf8 | Self::Binary | Self::UsAscii => true,
            Self::Encoded(encoding) => encoding.is_ascii_compatible(),
        }
    }
}

/// WHATWG label for a runtime alias or locale codeset, if `name` is one
fn runtime_alias(name: &str) -> Option<&'static str> {
    const ALIASES: [(&str, &str); 14] = [
        ("eucjp", "euc-jp"),
        ("eucjp-ms", "euc-jp"),
        ("euc-jp-ms", "euc-jp"),
        ("cp51932", "euc-jp"),
        ("ujis", "euc-jp"),
        ("sjis", "shift_jis"),
        ("cp932", "shift_jis"),
        ("pck", "shift_jis"),
        ("euckr", "euc-kr"),
        ("cp949", "euc-kr"),
        ("euccn", "gbk"),
        ("cp936", "gbk"),
        ("big5hkscs", "big5"),
        ("big5-hkscs", "big5"),
    ];
    ALIASES
        .iter()
        .find(|(alias, _)| name.eq_ignore_ascii_case(alias))
        .map(|(_, label)| *label)
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Re-encode `bytes` from `from` into `to`
///
/// Bytes that are invalid in `from` fail even when `from` and `to` are the
/// same charset.
pub fn transcode(bytes: &[u8], from: Charset, to: Charset) -> Result<Vec<u8>> {
    if from == to {
        validate(bytes, from)?;
        return Ok(bytes.to_vec());
    }
    if to == Charset::Binary
        || (bytes.is_ascii() && from.is_ascii_compatible() && to.is_ascii_compatible())
    {
        return Ok(bytes.to_vec());
    }

    let text = decode(bytes, from, to)?;
    let out = encode(&text, to)?;
    logging::log_transcode(from.name(), to.name(), bytes.len(), out.len());
    Ok(out)
}

/// Check that `bytes` are well formed in `charset`
pub fn validate(bytes: &[u8], charset: Charset) -> Result<()> {
    match charset {
        Charset::Binary => Ok(()),
        _ if bytes.is_ascii() && charset.is_ascii_compatible() => Ok(()),
        Charset::Utf8 => match std::str::from_utf8(bytes) {
            Ok(_) => Ok(()),
            Err(err) => Err(utf8_error(bytes, &err)),
        },
        _ => decode(bytes, charset, charset).map(drop),
    }
}

fn utf8_error(bytes: &[u8], err: &std::str::Utf8Error) -> MarshalError {
    let start = err.valid_up_to();
    let end = start + err.error_len().unwrap_or(bytes.len() - start);
    invalid_byte_sequence(&bytes[start..end], Charset::Utf8)
}

fn decode(bytes: &[u8], from: Charset, to: Charset) -> Result<String> {
    match from {
        Charset::Utf8 => match std::str::from_utf8(bytes) {
            Ok(text) => Ok(text.to_owned()),
            Err(err) => Err(utf8_error(bytes, &err)),
        },
        Charset::UsAscii => match bytes.iter().position(|b| !b.is_ascii()) {
            Some(pos) => Err(invalid_byte_sequence(&bytes[pos..pos + 1], from)),
            None => Ok(bytes.iter().map(|&b| b as char).collect()),
        },
        Charset::Binary => Err(converter_not_found(from, to)),
        Charset::Encoded(encoding) => {
            let mut decoder = encoding.new_decoder_without_bom_handling();
            let capacity = decoder
                .max_utf8_buffer_length_without_replacement(bytes.len())
                .ok_or_else(|| MarshalError::encoding_error("string too long to transcode"))?;
            let mut text = String::with_capacity(capacity);
            let (result, read) = decoder.decode_to_string_without_replacement(bytes, &mut text, true);
            match result {
                DecoderResult::InputEmpty => Ok(text),
                DecoderResult::Malformed(bad, after) => {
                    let end = read - after as usize;
                    let start = end - bad as usize;
                    Err(invalid_byte_sequence(&bytes[start..end], from))
                }
                DecoderResult::OutputFull => Err(MarshalError::encoding_error(format!(
                    "output buffer exhausted decoding {}",
                    from
                ))),
            }
        }
    }
}

fn encode(text: &str, to: Charset) -> Result<Vec<u8>> {
    match to {
        Charset::Utf8 | Charset::Binary => Ok(text.as_bytes().to_vec()),
        Charset::UsAscii => match text.chars().find(|c| !c.is_ascii()) {
            Some(c) => Err(undefined_conversion(c, to)),
            None => Ok(text.as_bytes().to_vec()),
        },
        Charset::Encoded(encoding) => {
            // UTF-16 and the replacement encoding have no byte encoder
            if encoding.output_encoding() != encoding {
                return Err(converter_not_found(Charset::Utf8, to));
            }
            let mut encoder = encoding.new_encoder();
            let capacity = encoder
                .max_buffer_length_from_utf8_without_replacement(text.len())
                .ok_or_else(|| MarshalError::encoding_error("string too long to transcode"))?;
            let mut out = Vec::with_capacity(capacity);
            let (result, _) = encoder.encode_from_utf8_to_vec_without_replacement(text, &mut out, true);
            match result {
                EncoderResult::InputEmpty => Ok(out),
                EncoderResult::Unmappable(c) => Err(undefined_conversion(c, to)),
                EncoderResult::OutputFull => Err(MarshalError::encoding_error(format!(
                    "output buffer exhausted encoding {}",
                    to
                ))),
            }
        }
    }
}

fn invalid_byte_sequence(bad: &[u8], charset: Charset) -> MarshalError {
    let escaped: String = bad.iter().map(|b| format!("\\x{:02X}", b)).collect();
    MarshalError::encoding_error(format!("\"{}\" on {}", escaped, charset))
}

fn undefined_conversion(c: char, to: Charset) -> MarshalError {
    MarshalError::encoding_error(format!("U+{:04X} from UTF-8 to {}", c as u32, to))
}

fn converter_not_found(from: Charset, to: Charset) -> MarshalError {
    MarshalError::encoding_error(format!("code converter not found ({} to {})", from, to))
}
