//! Marshalling between runtime values and native buffers
//!
//! Architecture:
//! - `mod.rs` - `Marshaller` context and the guarded conversion core
//! - `element.rs` - per-element coercions (`FromValue`, `IntoValue`)
//! - `strings.rs` - C strings and string vectors
//! - `reverse.rs` - native data back into runtime values
//!
//! Every sequence conversion runs the same protocol: coerce the input to an
//! array, take a shallow duplicate, allocate the native buffer, fill it
//! element by element under a `FillGuard`, and hand it over only once every
//! element converted. The first coercion error is returned as-is after the
//! guard has released the partial buffer.

mod element;
mod reverse;
mod strings;

#[cfg(test)]
mod tests;

pub use element::{FromValue, IntoValue};
pub use reverse::{
    cstr_len_to_value, cstr_len_to_value_free, cstr_to_value, cstr_to_value_free,
    cstr_to_value_with_encoding, ints_to_value, ints_to_value_free, slice_to_value,
    slice_to_value_free, strv_ptr_to_value, strv_to_value, strv_to_value_free,
};
pub use strings::{
    inspect_cstr, value_to_cstr, value_to_cstr_accept_nil, value_to_cstr_accept_symbol,
    value_to_cstr_accept_symbol_accept_nil, Strv,
};

use crate::error::Result;
use crate::logging;
use crate::native::{
    FillGuard, GBoolean, NativeAllocator, NativeBuffer, NativeElement, SystemAllocator,
};
use crate::transcode::FilenameCodec;
use crate::value::Value;

/// Conversion context: the allocator native blocks come from and the
/// filename codec resolved at startup
#[derive(Debug, Clone)]
pub struct Marshaller<A: NativeAllocator = SystemAllocator> {
    allocator: A,
    filenames: FilenameCodec,
}

impl Marshaller<SystemAllocator> {
    pub fn new(filenames: FilenameCodec) -> Self {
        Self::with_allocator(SystemAllocator, filenames)
    }
}

impl Default for Marshaller<SystemAllocator> {
    fn default() -> Self {
        Self::new(FilenameCodec::utf8())
    }
}

impl<A: NativeAllocator> Marshaller<A> {
    pub fn with_allocator(allocator: A, filenames: FilenameCodec) -> Self {
        Self { allocator, filenames }
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    pub fn filenames(&self) -> &FilenameCodec {
        &self.filenames
    }

    /// Convert a sequence into a buffer of `T`
    pub fn array<T: FromValue>(&self, value: &Value) -> Result<NativeBuffer<T, A>> {
        guarded_convert(value, &self.allocator, |item| T::from_value(item, &self.allocator))
    }

    /// As `array`, but `nil` yields `None` without allocating
    pub fn array_accept_nil<T: FromValue>(&self, value: &Value) -> Result<Option<NativeBuffer<T, A>>> {
        if value.is_nil() {
            return Ok(None);
        }
        self.array(value).map(Some)
    }

    pub fn booleans(&self, value: &Value) -> Result<NativeBuffer<GBoolean, A>> {
        self.array(value)
    }

    pub fn int8s(&self, value: &Value) -> Result<NativeBuffer<i8, A>> {
        self.array(value)
    }

    pub fn uint8s(&self, value: &Value) -> Result<NativeBuffer<u8, A>> {
        self.array(value)
    }

    pub fn int16s(&self, value: &Value) -> Result<NativeBuffer<i16, A>> {
        self.array(value)
    }

    pub fn uint16s(&self, value: &Value) -> Result<NativeBuffer<u16, A>> {
        self.array(value)
    }

    /// `gint` array
    pub fn ints(&self, value: &Value) -> Result<NativeBuffer<i32, A>> {
        self.array(value)
    }

    pub fn uint32s(&self, value: &Value) -> Result<NativeBuffer<u32, A>> {
        self.array(value)
    }

    pub fn int64s(&self, value: &Value) -> Result<NativeBuffer<i64, A>> {
        self.array(value)
    }

    pub fn uint64s(&self, value: &Value) -> Result<NativeBuffer<u64, A>> {
        self.array(value)
    }

    pub fn doubles(&self, value: &Value) -> Result<NativeBuffer<f64, A>> {
        self.array(value)
    }
}

/// The guarded conversion core
///
/// `convert` sees the elements of a private duplicate of the input, in
/// order. Its first error ends the conversion: the guard releases every
/// element written so far plus the block, and the error is returned
/// unchanged.
pub(crate) fn guarded_convert<T, A, F>(
    value: &Value,
    allocator: &A,
    mut convert: F,
) -> Result<NativeBuffer<T, A>>
where
    T: NativeElement,
    A: NativeAllocator,
    F: FnMut(&Value) -> Result<T>,
{
    let items = value.to_ary()?.to_vec();
    let mut guard = FillGuard::<T, A>::allocate(items.len(), allocator.clone());
    for (index, item) in items.iter().enumerate() {
        match convert(item) {
            Ok(element) => guard.push(element),
            Err(err) => {
                logging::log_conversion_failed(T::NATIVE_TYPE.c_name(), index, &err);
                return Err(err);
            }
        }
    }
    Ok(guard.finish())
}
