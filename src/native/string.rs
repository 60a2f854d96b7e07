//! Owned native strings

use super::alloc::{NativeAllocator, SystemAllocator};
use super::types::OwnedCStr;
use crate::error::{MarshalError, Result};
use std::alloc::Layout;
use std::ffi::CStr;
use std::fmt;
use std::mem::ManuallyDrop;
use std::os::raw::c_char;
use std::ptr::NonNull;
use std::slice;

/// NUL-terminated byte string in native memory
pub struct NativeStr<A: NativeAllocator = SystemAllocator> {
    ptr: NonNull<u8>,
    /// Bytes before the terminator
    len: usize,
    allocator: A,
}

#[inline]
fn layout_for(len: usize) -> Layout {
    match Layout::array::<u8>(len + 1) {
        Ok(layout) => layout,
        Err(_) => panic!("capacity overflow"),
    }
}

impl<A: NativeAllocator> NativeStr<A> {
    /// Copy `bytes` into native memory and terminate them
    ///
    /// Embedded NUL bytes cannot be represented and are rejected.
    pub fn from_bytes(bytes: &[u8], allocator: A) -> Result<Self> {
        if bytes.contains(&0) {
            return Err(MarshalError::argument_error("string contains null byte"));
        }
        let ptr = allocator.allocate(layout_for(bytes.len()));
        unsafe {
            ptr.as_ptr().copy_from_nonoverlapping(bytes.as_ptr(), bytes.len());
            ptr.as_ptr().add(bytes.len()).write(0);
        }
        Ok(Self {
            ptr,
            len: bytes.len(),
            allocator,
        })
    }

    /// Adopt a string produced by `into_raw`; `None` for null
    ///
    /// # Safety
    /// `ptr` must be a NUL-terminated block from this allocator sized exactly
    /// `strlen + 1`, not owned by anything else.
    pub unsafe fn from_raw(ptr: *mut c_char, allocator: A) -> Option<Self> {
        let ptr = NonNull::new(ptr.cast::<u8>())?;
        let len = CStr::from_ptr(ptr.as_ptr().cast()).to_bytes().len();
        Some(Self { ptr, len, allocator })
    }

    /// Hand the string to native code
    pub fn into_raw(self) -> *mut c_char {
        let this = ManuallyDrop::new(self);
        unsafe { drop(std::ptr::read(&this.allocator)) };
        this.ptr.as_ptr().cast()
    }

    /// Hand the string to a buffer that releases it
    pub(crate) fn into_owned(self) -> OwnedCStr {
        OwnedCStr(self.into_raw())
    }

    #[inline]
    pub fn as_ptr(&self) -> *const c_char {
        self.ptr.as_ptr().cast()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_c_str(&self) -> &CStr {
        unsafe { CStr::from_bytes_with_nul_unchecked(slice::from_raw_parts(self.ptr.as_ptr(), self.len + 1)) }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<A: NativeAllocator> Drop for NativeStr<A> {
    fn drop(&mut self) {
        unsafe { self.allocator.release(self.ptr, layout_for(self.len)) };
    }
}

impl<A: NativeAllocator> fmt::Debug for NativeStr<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_c_str(), f)
    }
}
