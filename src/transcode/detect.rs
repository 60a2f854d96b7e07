//! Filename charset detection
//!
//! Follows the platform convention for filename encodings:
//! - Windows filenames are always UTF-8
//! - `G_FILENAME_ENCODING` names the charset (first comma-separated entry;
//!   `@locale` means the locale codeset)
//! - otherwise `G_BROKEN_FILENAMES` selects the locale codeset
//! - otherwise UTF-8
//!
//! Detection runs once at startup; the resulting `FilenameCodec` is held by
//! the `Marshaller` and never changes afterward.

use super::Charset;
use crate::logging;

const FILENAME_ENCODING_VAR: &str = "G_FILENAME_ENCODING";
const BROKEN_FILENAMES_VAR: &str = "G_BROKEN_FILENAMES";
const LOCALE_VARS: [&str; 3] = ["LC_ALL", "LC_CTYPE", "LANG"];
const LOCALE_MARKER: &str = "@locale";
const POSIX_CODESET: &str = "ANSI_X3.4-1968";

/// Resolved filename charset
///
/// External mode (transcoding filenames) is active only when the charset is
/// known and is neither UTF-8 nor binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilenameCodec {
    /// Name the platform reported, before lookup
    reported: &'static str,
    external: Option<Charset>,
}

impl FilenameCodec {
    /// Filenames are UTF-8; no transcoding
    pub const fn utf8() -> Self {
        Self {
            reported: "UTF-8",
            external: None,
        }
    }

    /// Codec for an already-resolved charset
    pub fn with_charset(charset: Charset) -> Self {
        let external = match charset {
            Charset::Utf8 | Charset::Binary => None,
            other => Some(other),
        };
        Self {
            reported: charset.name(),
            external,
        }
    }

    /// Codec for a charset name; unknown names disable transcoding
    pub fn from_name(name: &str) -> Self {
        match Charset::lookup(name) {
            Some(charset) => Self::with_charset(charset),
            None => {
                logging::log_unknown_charset(name);
                Self {
                    reported: "unknown",
                    external: None,
                }
            }
        }
    }

    /// Detect from the process environment
    pub fn detect() -> Self {
        Self::detect_with(|name| std::env::var(name).ok())
    }

    /// Detect using `lookup` for environment variables
    pub fn detect_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if cfg!(windows) {
            return Self::utf8();
        }

        let requested = lookup(FILENAME_ENCODING_VAR)
            .and_then(|value| value.split(',').next().map(|s| s.trim().to_owned()))
            .filter(|first| !first.is_empty());

        let codec = match requested {
            Some(first) if first == LOCALE_MARKER => Self::from_name(&locale_codeset(&lookup)),
            Some(first) => Self::from_name(&first),
            None if lookup(BROKEN_FILENAMES_VAR).is_some() => {
                Self::from_name(&locale_codeset(&lookup))
            }
            None => Self::utf8(),
        };
        logging::log_charset_detected(codec.reported, codec.external.map(Charset::name));
        codec
    }

    /// Charset filenames are transcoded into, if any
    #[inline]
    pub fn external(&self) -> Option<Charset> {
        self.external
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.external.is_some()
    }

    /// Charset name as detected
    pub fn reported(&self) -> &'static str {
        self.reported
    }
}

impl Default for FilenameCodec {
    fn default() -> Self {
        Self::utf8()
    }
}

/// Locale codeset from `LC_ALL`, `LC_CTYPE`, `LANG` (first non-empty wins)
///
/// `ja_JP.EUC-JP@cjk` yields `EUC-JP`; `C`, `POSIX` and locales without a
/// codeset yield the POSIX portable charset.
pub fn locale_codeset<F>(lookup: &F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let locale = LOCALE_VARS
        .iter()
        .filter_map(|var| lookup(var))
        .find(|value| !value.is_empty());

    locale
        .as_deref()
        .and_then(|locale| locale.split_once('.'))
        .map(|(_, rest)| rest.split('@').next().unwrap_or(rest))
        .filter(|codeset| !codeset.is_empty())
        .unwrap_or(POSIX_CODESET)
        .to_owned()
}
