//! Text and filename conversions
//!
//! Runtime strings that name files carry the filename charset when external
//! mode is active, so later file operations see the bytes the filesystem
//! expects. Native code always exchanges UTF-8 with `to_external` and
//! `from_external`; the `filename_*` functions exchange bytes in the
//! filename charset itself.

use super::{transcode, Charset};
use crate::error::Result;
use crate::marshal::Marshaller;
use crate::native::{NativeAllocator, NativeStr, StringList};
use crate::value::{RString, Value};

impl<A: NativeAllocator> Marshaller<A> {
    /// UTF-8 bytes as a runtime string, moved into the filename charset when
    /// external mode is active
    pub fn to_external(&self, utf8: &[u8]) -> Result<Value> {
        let value = RString::from_bytes(utf8, Charset::Utf8);
        match self.filenames().external() {
            Some(charset) => Ok(Value::Str(value.export_to(charset)?)),
            None => Ok(Value::Str(value)),
        }
    }

    /// Runtime string as a native UTF-8 string
    pub fn from_external(&self, value: &Value) -> Result<NativeStr<A>> {
        let utf8 = value.string_value()?.to_utf8()?;
        NativeStr::from_bytes(utf8.as_bytes(), self.allocator().clone())
    }

    /// Filename bytes (in the filename charset) as a runtime string; `None`
    /// is `nil`
    pub fn filename_to_value(&self, filename: Option<&[u8]>) -> Result<Value> {
        let Some(filename) = filename else {
            return Ok(Value::Nil);
        };
        match self.filenames().external() {
            Some(charset) => {
                let utf8 = transcode(filename, charset, Charset::Utf8)?;
                self.to_external(&utf8)
            }
            None => Ok(Value::Str(RString::from_bytes(filename, Charset::Utf8))),
        }
    }

    /// As `filename_to_value`, releasing the native filename on every path
    pub fn filename_to_value_free(&self, filename: Option<NativeStr<A>>) -> Result<Value> {
        let converted = self.filename_to_value(filename.as_ref().map(NativeStr::as_bytes));
        drop(filename);
        converted
    }

    /// Runtime string as filename bytes in native memory
    pub fn filename_from_value(&self, value: &Value) -> Result<NativeStr<A>> {
        let utf8 = value.string_value()?.to_utf8()?;
        match self.filenames().external() {
            Some(charset) => {
                let bytes = transcode(utf8.as_bytes(), Charset::Utf8, charset)?;
                NativeStr::from_bytes(&bytes, self.allocator().clone())
            }
            None => NativeStr::from_bytes(utf8.as_bytes(), self.allocator().clone()),
        }
    }

    /// List of filenames as an array of strings, releasing the list and
    /// every string in it
    pub fn filename_list_to_value_free(&self, list: StringList<A>) -> Result<Value> {
        let converted = list
            .iter()
            .map(|name| self.filename_to_value(Some(name.to_bytes())))
            .collect::<Result<Vec<_>>>();
        drop(list);
        converted.map(Value::from)
    }
}
