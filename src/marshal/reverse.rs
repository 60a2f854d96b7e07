//! Native data back into runtime values
//!
//! The `_free` variants take ownership of their native input and drop it
//! once the value is built. Building the value cannot fail here, but the
//! input is still held by its owner type across the body so the release
//! happens on every path.

use super::element::IntoValue;
use crate::error::{MarshalError, Result};
use crate::native::{NativeAllocator, NativeBuffer, NativeStr, OwnedCStr};
use crate::transcode::Charset;
use crate::value::{RString, Value};
use std::ffi::CStr;
use std::os::raw::c_char;

/// C string as a UTF-8 string value; `None` is `nil`
pub fn cstr_to_value(s: Option<&CStr>) -> Value {
    cstr_len_to_value(s.map(CStr::to_bytes))
}

/// Byte string of known length as a UTF-8 string value; `None` is `nil`
pub fn cstr_len_to_value(bytes: Option<&[u8]>) -> Value {
    match bytes {
        Some(bytes) => Value::Str(RString::from_bytes(bytes, Charset::Utf8)),
        None => Value::Nil,
    }
}

/// As `cstr_to_value`, releasing the native string
pub fn cstr_to_value_free<A: NativeAllocator>(s: Option<NativeStr<A>>) -> Value {
    match s {
        Some(s) => cstr_len_to_value(Some(s.as_bytes())),
        None => Value::Nil,
    }
}

/// First `len` bytes of a native string, releasing all of it
pub fn cstr_len_to_value_free<A: NativeAllocator>(s: Option<NativeStr<A>>, len: usize) -> Value {
    match s {
        Some(s) => {
            let bytes = s.as_bytes();
            cstr_len_to_value(Some(&bytes[..len.min(bytes.len())]))
        }
        None => Value::Nil,
    }
}

/// Byte string tagged with a named charset (UTF-8 when unnamed)
pub fn cstr_to_value_with_encoding(bytes: Option<&[u8]>, encoding: Option<&str>) -> Result<Value> {
    let Some(bytes) = bytes else {
        return Ok(Value::Nil);
    };
    let charset = match encoding {
        Some(name) => Charset::lookup(name).ok_or_else(|| {
            MarshalError::argument_error(format!("unknown encoding name - {}", name))
        })?,
        None => Charset::Utf8,
    };
    Ok(Value::Str(RString::from_bytes(bytes, charset)))
}

/// NULL-terminated `const gchar **` as an array of strings; null is `nil`
///
/// # Safety
/// `strings` must be null or point to a NULL-terminated array of valid C
/// strings.
pub unsafe fn strv_ptr_to_value(strings: *const *const c_char) -> Value {
    if strings.is_null() {
        return Value::Nil;
    }
    let mut items = Vec::new();
    let mut cursor = strings;
    while !(*cursor).is_null() {
        items.push(cstr_to_value(Some(CStr::from_ptr(*cursor))));
        cursor = cursor.add(1);
    }
    Value::from(items)
}

/// Owned string vector as an array of strings
pub fn strv_to_value<A: NativeAllocator>(strings: &NativeBuffer<OwnedCStr, A>) -> Value {
    let items = strings
        .iter()
        .map(|s| cstr_to_value(Some(unsafe { CStr::from_ptr(s.as_ptr()) })))
        .collect::<Vec<_>>();
    Value::from(items)
}

/// As `strv_to_value`, releasing the vector and every string in it
pub fn strv_to_value_free<A: NativeAllocator>(strings: Option<NativeBuffer<OwnedCStr, A>>) -> Value {
    match strings {
        Some(strings) => strv_to_value(&strings),
        None => Value::Nil,
    }
}

/// Native elements as an array
pub fn slice_to_value<T: IntoValue>(items: &[T]) -> Value {
    Value::from(items.iter().map(|&item| item.into_value()).collect::<Vec<_>>())
}

/// As `slice_to_value`, releasing the buffer
pub fn slice_to_value_free<T: IntoValue, A: NativeAllocator>(items: NativeBuffer<T, A>) -> Value {
    slice_to_value(items.as_slice())
}

/// `gint` array as an array of integers
pub fn ints_to_value(ints: &[i32]) -> Value {
    slice_to_value(ints)
}

pub fn ints_to_value_free<A: NativeAllocator>(ints: NativeBuffer<i32, A>) -> Value {
    slice_to_value_free(ints)
}
