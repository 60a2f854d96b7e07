//! Singly-linked native string lists (`GSList` of `gchar*`)

use super::alloc::{NativeAllocator, SystemAllocator};
use super::string::NativeStr;
use crate::error::Result;
use std::alloc::Layout;
use std::ffi::CStr;
use std::mem::ManuallyDrop;
use std::os::raw::c_char;
use std::ptr::{self, NonNull};

/// List node with the C layout of `GSList`
#[repr(C)]
#[derive(Debug)]
pub struct SListNode {
    pub data: *mut c_char,
    pub next: *mut SListNode,
}

/// Owned list of owned strings; nodes and strings are released on drop
pub struct StringList<A: NativeAllocator = SystemAllocator> {
    head: *mut SListNode,
    allocator: A,
}

impl<A: NativeAllocator> StringList<A> {
    pub fn new(allocator: A) -> Self {
        Self {
            head: ptr::null_mut(),
            allocator,
        }
    }

    /// Build a list holding copies of `items`, in order
    pub fn from_items<'a, I>(items: I, allocator: A) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut list = Self::new(allocator);
        let mut tail: *mut *mut SListNode = &mut list.head;
        for item in items {
            let data = NativeStr::from_bytes(item, list.allocator.clone())?.into_raw();
            let node = list.allocator.allocate(Layout::new::<SListNode>()).cast::<SListNode>();
            unsafe {
                node.as_ptr().write(SListNode {
                    data,
                    next: ptr::null_mut(),
                });
                *tail = node.as_ptr();
                tail = &mut (*node.as_ptr()).next;
            }
        }
        Ok(list)
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_null()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Strings in list order; null payloads are skipped
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            node: self.head,
            _list: std::marker::PhantomData,
        }
    }

    /// Hand the list to native code
    pub fn into_raw(self) -> *mut SListNode {
        let this = ManuallyDrop::new(self);
        unsafe { drop(ptr::read(&this.allocator)) };
        this.head
    }

    /// Adopt a list produced by `into_raw`
    ///
    /// # Safety
    /// Every node and every string must come from this allocator and be owned
    /// by the list alone.
    pub unsafe fn from_raw(head: *mut SListNode, allocator: A) -> Self {
        Self { head, allocator }
    }
}

impl<A: NativeAllocator> Drop for StringList<A> {
    fn drop(&mut self) {
        let mut node = self.head;
        while let Some(current) = NonNull::new(node) {
            unsafe {
                let SListNode { data, next } = current.as_ptr().read();
                drop(NativeStr::from_raw(data, self.allocator.clone()));
                self.allocator
                    .release(current.cast(), Layout::new::<SListNode>());
                node = next;
            }
        }
        self.head = ptr::null_mut();
    }
}

/// Iterator over list payloads
pub struct Iter<'a> {
    node: *mut SListNode,
    _list: std::marker::PhantomData<&'a SListNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a CStr;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let node = NonNull::new(self.node)?;
            let SListNode { data, next } = unsafe { node.as_ptr().read() };
            self.node = next;
            if !data.is_null() {
                return Some(unsafe { CStr::from_ptr(data) });
            }
        }
    }
}
