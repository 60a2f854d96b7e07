//! Native buffers and the fill guard
//!
//! A buffer is born through `FillGuard`: allocated up front, filled one
//! element at a time, then either handed over with `finish` or released by
//! the guard's `Drop` on any early exit. `NativeBuffer` itself owns the
//! block until `into_raw` passes it to native code.

use super::alloc::{NativeAllocator, SystemAllocator};
use super::types::{sentinel_slots, NativeElement};
use crate::logging;
use std::alloc::Layout;
use std::fmt;
use std::mem::ManuallyDrop;
use std::ptr::NonNull;
use std::slice;

/// Slots to allocate for `len` elements; never zero so a block always exists
#[inline]
fn capacity_for<T: NativeElement>(len: usize) -> usize {
    (len + sentinel_slots::<T>()).max(1)
}

fn layout_for<T: NativeElement>(len: usize) -> Layout {
    match Layout::array::<T>(capacity_for::<T>(len)) {
        Ok(layout) => layout,
        Err(_) => panic!("capacity overflow"),
    }
}

/// Contiguous native array plus its authoritative length
pub struct NativeBuffer<T: NativeElement, A: NativeAllocator = SystemAllocator> {
    ptr: NonNull<T>,
    len: usize,
    allocator: A,
}

impl<T: NativeElement, A: NativeAllocator> NativeBuffer<T, A> {
    /// Logical element count (sentinel excluded)
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Elements followed by the sentinel, for sentinel-terminated types
    pub fn as_terminated_slice(&self) -> Option<&[T]> {
        T::SENTINEL?;
        Some(unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len + 1) })
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Slots actually allocated
    #[inline]
    pub fn capacity(&self) -> usize {
        capacity_for::<T>(self.len)
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Hand the block to native code
    ///
    /// The caller now owns the pointer and must free it through the same
    /// allocator, or re-adopt it with `from_raw_parts`.
    pub fn into_raw(self) -> (*mut T, usize) {
        let this = ManuallyDrop::new(self);
        // allocator handle is dropped here; the block stays alive
        unsafe { drop(std::ptr::read(&this.allocator)) };
        (this.ptr.as_ptr(), this.len)
    }

    /// Adopt a block produced by `into_raw`; `None` for null
    ///
    /// # Safety
    /// `ptr` must come from this allocator with a capacity of
    /// `max(len + sentinel, 1)` slots, all `len` elements initialized.
    pub unsafe fn from_raw_parts(ptr: *mut T, len: usize, allocator: A) -> Option<Self> {
        Some(Self {
            ptr: NonNull::new(ptr)?,
            len,
            allocator,
        })
    }

    /// Adopt a sentinel-terminated block, counting elements up to the sentinel
    ///
    /// # Safety
    /// As `from_raw_parts`; the block must hold a sentinel after its elements.
    pub unsafe fn from_raw_terminated(ptr: *mut T, allocator: A) -> Option<Self>
    where
        T: PartialEq,
    {
        let sentinel = T::SENTINEL?;
        let ptr = NonNull::new(ptr)?;
        let mut len = 0;
        while *ptr.as_ptr().add(len) != sentinel {
            len += 1;
        }
        Some(Self { ptr, len, allocator })
    }
}

impl<T: NativeElement, A: NativeAllocator> Drop for NativeBuffer<T, A> {
    fn drop(&mut self) {
        unsafe {
            for i in 0..self.len {
                self.ptr.as_ptr().add(i).read().release(&self.allocator);
            }
            self.allocator
                .release(self.ptr.cast(), layout_for::<T>(self.len));
        }
        logging::log_buffer_release(T::NATIVE_TYPE.c_name(), self.len);
    }
}

impl<T: NativeElement + fmt::Debug, A: NativeAllocator> fmt::Debug for NativeBuffer<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

/// Scope guard over a buffer being filled
///
/// Dropping an unfinished guard releases the elements written so far and
/// the block, exactly once.
pub struct FillGuard<T: NativeElement, A: NativeAllocator = SystemAllocator> {
    ptr: NonNull<T>,
    filled: usize,
    expected: usize,
    allocator: A,
}

impl<T: NativeElement, A: NativeAllocator> FillGuard<T, A> {
    /// Allocate room for `expected` elements (plus sentinel)
    pub fn allocate(expected: usize, allocator: A) -> Self {
        let layout = layout_for::<T>(expected);
        let ptr = allocator.allocate(layout).cast::<T>();
        logging::log_buffer_alloc(T::NATIVE_TYPE.c_name(), expected, capacity_for::<T>(expected));
        Self {
            ptr,
            filled: 0,
            expected,
            allocator,
        }
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Elements written so far
    #[inline]
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Write the next element
    pub fn push(&mut self, element: T) {
        assert!(self.filled < self.expected, "fill guard overrun");
        unsafe { self.ptr.as_ptr().add(self.filled).write(element) };
        self.filled += 1;
    }

    /// Terminate and transfer ownership to a `NativeBuffer`
    pub fn finish(self) -> NativeBuffer<T, A> {
        assert_eq!(self.filled, self.expected, "fill guard finished early");
        let this = ManuallyDrop::new(self);
        if let Some(sentinel) = T::SENTINEL {
            unsafe { this.ptr.as_ptr().add(this.filled).write(sentinel) };
        }
        NativeBuffer {
            ptr: this.ptr,
            len: this.filled,
            allocator: unsafe { std::ptr::read(&this.allocator) },
        }
    }
}

impl<T: NativeElement, A: NativeAllocator> Drop for FillGuard<T, A> {
    fn drop(&mut self) {
        logging::log_fill_unwound(T::NATIVE_TYPE.c_name(), self.filled, self.expected);
        unsafe {
            for i in 0..self.filled {
                self.ptr.as_ptr().add(i).read().release(&self.allocator);
            }
            self.allocator
                .release(self.ptr.cast(), layout_for::<T>(self.expected));
        }
    }
}
