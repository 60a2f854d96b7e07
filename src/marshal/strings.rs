//! C strings and NULL-terminated string vectors

use super::{guarded_convert, Marshaller};
use crate::error::{MarshalError, Result};
use crate::native::{NativeAllocator, NativeBuffer, OwnedCStr, SystemAllocator};
use crate::value::Value;
use std::ffi::{CStr, CString};
use std::fmt;
use std::os::raw::c_char;

fn to_cstring(bytes: Vec<u8>) -> Result<CString> {
    CString::new(bytes).map_err(|_| MarshalError::argument_error("string contains null byte"))
}

/// String value as a UTF-8 C string
///
/// Strings in other charsets are exported to UTF-8 first.
pub fn value_to_cstr(value: &Value) -> Result<CString> {
    let utf8 = value.string_value()?.to_utf8()?;
    to_cstring(utf8.into_bytes())
}

/// As `value_to_cstr`; `nil` gives `None`
pub fn value_to_cstr_accept_nil(value: &Value) -> Result<Option<CString>> {
    if value.is_nil() {
        return Ok(None);
    }
    value_to_cstr(value).map(Some)
}

/// As `value_to_cstr`, also taking a symbol's name
pub fn value_to_cstr_accept_symbol(value: &Value) -> Result<CString> {
    match value {
        Value::Symbol(name) => to_cstring(name.clone().into_bytes()),
        other => value_to_cstr(other),
    }
}

pub fn value_to_cstr_accept_symbol_accept_nil(value: &Value) -> Result<Option<CString>> {
    if value.is_nil() {
        return Ok(None);
    }
    value_to_cstr_accept_symbol(value).map(Some)
}

/// `inspect` output as a C string
pub fn inspect_cstr(value: &Value) -> Result<CString> {
    to_cstring(value.inspect().into_bytes())
}

/// NULL-terminated vector of borrowed string pointers
///
/// The pointers refer to UTF-8 copies held by the `Strv` itself, so they stay
/// valid for as long as it lives.
pub struct Strv<A: NativeAllocator = SystemAllocator> {
    buffer: NativeBuffer<*const c_char, A>,
    strings: Vec<CString>,
}

impl<A: NativeAllocator> Strv<A> {
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// `const gchar **` view, NULL-terminated
    pub fn as_ptr(&self) -> *const *const c_char {
        self.buffer.as_ptr()
    }

    pub fn buffer(&self) -> &NativeBuffer<*const c_char, A> {
        &self.buffer
    }

    pub fn iter(&self) -> impl Iterator<Item = &CStr> {
        self.strings.iter().map(CString::as_c_str)
    }
}

impl<A: NativeAllocator> fmt::Debug for Strv<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<A: NativeAllocator> Marshaller<A> {
    /// Array of strings as a NULL-terminated pointer vector
    pub fn strv(&self, value: &Value) -> Result<Strv<A>> {
        let mut strings = Vec::new();
        let buffer = guarded_convert(value, &self.allocator, |item| {
            let string = value_to_cstr(item)?;
            let ptr = string.as_ptr();
            strings.push(string);
            Ok(ptr)
        })?;
        Ok(Strv { buffer, strings })
    }

    pub fn strv_accept_nil(&self, value: &Value) -> Result<Option<Strv<A>>> {
        if value.is_nil() {
            return Ok(None);
        }
        self.strv(value).map(Some)
    }

    /// Array of strings as a NULL-terminated vector of native copies
    /// (`gchar **` the caller frees with `g_strfreev` semantics)
    pub fn strv_dup(&self, value: &Value) -> Result<NativeBuffer<OwnedCStr, A>> {
        self.array(value)
    }

    /// As `strv_dup`; `nil` skips conversion and yields `None`
    pub fn strv_dup_accept_nil(&self, value: &Value) -> Result<Option<NativeBuffer<OwnedCStr, A>>> {
        self.array_accept_nil(value)
    }
}
