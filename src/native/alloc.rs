//! Native allocators
//!
//! Every native block (buffers, duplicated strings, list nodes) comes from a
//! `NativeAllocator` and goes back to the same one. `TrackingAllocator` is
//! the test double: it records each live block and rejects double and
//! foreign releases.

use crate::logging;
use parking_lot::Mutex;
use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};
use std::collections::HashMap;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Source of native memory
///
/// Handles are cheap to clone; every clone refers to the same allocator.
pub trait NativeAllocator: Clone {
    /// Allocate a block; aborts on exhaustion like `g_malloc`
    fn allocate(&self, layout: Layout) -> NonNull<u8>;

    /// Return a block
    ///
    /// # Safety
    /// `ptr` must come from `allocate` on this allocator with the same
    /// `layout`, and must not be released twice.
    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout);
}

/// Global allocator
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAllocator;

impl NativeAllocator for SystemAllocator {
    fn allocate(&self, layout: Layout) -> NonNull<u8> {
        debug_assert!(layout.size() > 0, "zero-sized native allocation");
        let ptr = unsafe { alloc(layout) };
        match NonNull::new(ptr) {
            Some(ptr) => {
                logging::log_allocation(layout.size(), ptr.as_ptr());
                ptr
            }
            None => handle_alloc_error(layout),
        }
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        logging::log_deallocation(ptr.as_ptr());
        dealloc(ptr.as_ptr(), layout);
    }
}

/// Allocation-tracking allocator for leak checks
#[derive(Debug, Clone, Default)]
pub struct TrackingAllocator {
    state: Arc<TrackingState>,
}

#[derive(Debug, Default)]
struct TrackingState {
    live: Mutex<HashMap<usize, Layout>>,
    allocations: AtomicUsize,
    releases: AtomicUsize,
}

impl TrackingAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks allocated and not yet released
    pub fn live_blocks(&self) -> usize {
        self.state.live.lock().len()
    }

    pub fn live_bytes(&self) -> usize {
        self.state.live.lock().values().map(Layout::size).sum()
    }

    /// Total allocations made
    pub fn allocations(&self) -> usize {
        self.state.allocations.load(Ordering::Relaxed)
    }

    /// Total releases made
    pub fn releases(&self) -> usize {
        self.state.releases.load(Ordering::Relaxed)
    }

    /// Whether `ptr` is a live block from this allocator
    pub fn is_live(&self, ptr: *const u8) -> bool {
        self.state.live.lock().contains_key(&(ptr as usize))
    }
}

impl NativeAllocator for TrackingAllocator {
    fn allocate(&self, layout: Layout) -> NonNull<u8> {
        let ptr = SystemAllocator.allocate(layout);
        self.state.live.lock().insert(ptr.as_ptr() as usize, layout);
        self.state.allocations.fetch_add(1, Ordering::Relaxed);
        ptr
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        let recorded = self.state.live.lock().remove(&(ptr.as_ptr() as usize));
        match recorded {
            Some(recorded) => {
                assert_eq!(recorded, layout, "block {:p} released with a different layout", ptr);
            }
            None => panic!("release of block {:p} that is not live", ptr),
        }
        self.state.releases.fetch_add(1, Ordering::Relaxed);
        SystemAllocator.release(ptr, layout);
    }
}
