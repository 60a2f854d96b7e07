//! Native layer tests
//!
//! Test suite organized by component:
//! - Types: descriptors and element metadata
//! - Tracking allocator: live-block accounting
//! - Fill guard: release on early exit, sentinel on finish
//! - Buffers: ownership transfer and re-adoption
//! - Strings and lists

use super::*;
use super::types::sentinel_slots;
use std::alloc::Layout;
use std::ffi::CStr;
use std::os::raw::c_char;

// ===== Type Tests =====

#[test]
fn test_native_type_sizes() {
    assert_eq!(NativeType::Int8.size(), 1);
    assert_eq!(NativeType::UInt16.size(), 2);
    assert_eq!(NativeType::Boolean.size(), 4);
    assert_eq!(NativeType::Int32.size(), 4);
    assert_eq!(NativeType::Double.size(), 8);
    assert_eq!(NativeType::StringPtr.size(), std::mem::size_of::<usize>());
}

#[test]
fn test_native_type_classification() {
    assert!(NativeType::UInt64.is_integral());
    assert!(!NativeType::UInt64.is_signed());
    assert!(NativeType::Int8.is_signed());
    assert!(NativeType::Double.is_float());
    assert!(!NativeType::Boolean.is_integral());
    assert_eq!(NativeType::Int32.c_name(), "gint");
    assert_eq!(NativeType::UInt8.runtime_class(), "Integer");
}

#[test]
fn test_only_string_pointers_carry_a_sentinel() {
    assert_eq!(sentinel_slots::<u8>(), 0);
    assert_eq!(sentinel_slots::<f64>(), 0);
    assert_eq!(sentinel_slots::<GBoolean>(), 0);
    assert_eq!(sentinel_slots::<*const c_char>(), 1);
    assert_eq!(sentinel_slots::<OwnedCStr>(), 1);
}

#[test]
fn test_gboolean_from_bool() {
    assert_eq!(GBoolean::from(true), GBoolean::TRUE);
    assert_eq!(GBoolean::from(false).0, 0);
    assert!(GBoolean(5).is_true());
}

// ===== Tracking Allocator Tests =====

#[test]
fn test_tracking_counts_blocks() {
    let allocator = TrackingAllocator::new();
    let layout = Layout::array::<u32>(4).unwrap();
    let ptr = allocator.allocate(layout);
    assert_eq!(allocator.live_blocks(), 1);
    assert_eq!(allocator.live_bytes(), 16);
    assert!(allocator.is_live(ptr.as_ptr()));

    unsafe { allocator.release(ptr, layout) };
    assert_eq!(allocator.live_blocks(), 0);
    assert_eq!(allocator.allocations(), 1);
    assert_eq!(allocator.releases(), 1);
}

#[test]
#[should_panic(expected = "not live")]
fn test_tracking_rejects_double_release() {
    let allocator = TrackingAllocator::new();
    let layout = Layout::new::<u64>();
    let ptr = allocator.allocate(layout);
    unsafe {
        allocator.release(ptr, layout);
        allocator.release(ptr, layout);
    }
}

#[test]
fn test_tracking_clones_share_state() {
    let allocator = TrackingAllocator::new();
    let handle = allocator.clone();
    let layout = Layout::new::<u8>();
    let ptr = handle.allocate(layout);
    assert_eq!(allocator.live_blocks(), 1);
    unsafe { allocator.release(ptr, layout) };
    assert_eq!(handle.live_blocks(), 0);
}

// ===== Fill Guard Tests =====

#[test]
fn test_finished_guard_becomes_buffer() {
    let allocator = TrackingAllocator::new();
    let mut guard = FillGuard::<i32, _>::allocate(3, allocator.clone());
    for n in [10, 20, 30] {
        guard.push(n);
    }
    let buffer = guard.finish();
    assert_eq!(buffer.as_slice(), &[10, 20, 30]);
    assert_eq!(buffer.capacity(), 3);
    assert_eq!(allocator.live_blocks(), 1);

    drop(buffer);
    assert_eq!(allocator.live_blocks(), 0);
}

#[test]
fn test_dropped_guard_releases_block() {
    let allocator = TrackingAllocator::new();
    {
        let mut guard = FillGuard::<u16, _>::allocate(4, allocator.clone());
        guard.push(1);
        guard.push(2);
        assert_eq!(guard.filled(), 2);
        assert_eq!(allocator.live_blocks(), 1);
    }
    assert_eq!(allocator.live_blocks(), 0);
    assert_eq!(allocator.releases(), 1);
}

#[test]
fn test_dropped_guard_releases_owned_elements() {
    let allocator = TrackingAllocator::new();
    {
        let mut guard = FillGuard::<OwnedCStr, _>::allocate(3, allocator.clone());
        for s in [&b"one"[..], b"two"] {
            let owned = NativeStr::from_bytes(s, allocator.clone()).unwrap().into_owned();
            guard.push(owned);
        }
        // block + two strings
        assert_eq!(allocator.live_blocks(), 3);
    }
    assert_eq!(allocator.live_blocks(), 0);
}

#[test]
fn test_sentinel_written_on_finish() {
    let allocator = TrackingAllocator::new();
    let guard = FillGuard::<*const c_char, _>::allocate(0, allocator.clone());
    let buffer = guard.finish();
    assert_eq!(buffer.len(), 0);
    assert_eq!(buffer.capacity(), 1);
    let terminated = buffer.as_terminated_slice().unwrap();
    assert_eq!(terminated.len(), 1);
    assert!(terminated[0].is_null());
}

#[test]
fn test_empty_plain_buffer_still_allocates() {
    let allocator = TrackingAllocator::new();
    let buffer = FillGuard::<f64, _>::allocate(0, allocator.clone()).finish();
    assert!(buffer.is_empty());
    assert!(!buffer.as_ptr().is_null());
    assert!(buffer.as_terminated_slice().is_none());
    assert_eq!(allocator.live_blocks(), 1);
}

#[test]
#[should_panic(expected = "overrun")]
fn test_guard_rejects_overrun() {
    let mut guard = FillGuard::<u8, SystemAllocator>::allocate(1, SystemAllocator);
    guard.push(1);
    guard.push(2);
}

// ===== Buffer Ownership Tests =====

#[test]
fn test_into_raw_and_back() {
    let allocator = TrackingAllocator::new();
    let mut guard = FillGuard::<u32, _>::allocate(2, allocator.clone());
    guard.push(7);
    guard.push(8);
    let (ptr, len) = guard.finish().into_raw();
    assert_eq!(allocator.live_blocks(), 1);

    let buffer = unsafe { NativeBuffer::from_raw_parts(ptr, len, allocator.clone()) }.unwrap();
    assert_eq!(buffer.as_slice(), &[7, 8]);
    drop(buffer);
    assert_eq!(allocator.live_blocks(), 0);
}

#[test]
fn test_from_raw_parts_rejects_null() {
    let adopted = unsafe { NativeBuffer::<i64, _>::from_raw_parts(std::ptr::null_mut(), 0, SystemAllocator) };
    assert!(adopted.is_none());
}

#[test]
fn test_from_raw_terminated_counts_to_sentinel() {
    let allocator = TrackingAllocator::new();
    let mut guard = FillGuard::<OwnedCStr, _>::allocate(2, allocator.clone());
    for s in [&b"a"[..], b"b"] {
        guard.push(NativeStr::from_bytes(s, allocator.clone()).unwrap().into_owned());
    }
    let (ptr, _) = guard.finish().into_raw();

    let buffer = unsafe { NativeBuffer::from_raw_terminated(ptr, allocator.clone()) }.unwrap();
    assert_eq!(buffer.len(), 2);
    drop(buffer);
    assert_eq!(allocator.live_blocks(), 0);
}

// ===== String Tests =====

#[test]
fn test_native_str_is_terminated() {
    let s = NativeStr::from_bytes(b"hello", SystemAllocator).unwrap();
    assert_eq!(s.len(), 5);
    assert_eq!(s.as_c_str().to_bytes_with_nul(), b"hello\0");
    assert_eq!(unsafe { CStr::from_ptr(s.as_ptr()) }.to_bytes(), b"hello");
}

#[test]
fn test_native_str_rejects_interior_nul() {
    let allocator = TrackingAllocator::new();
    let err = NativeStr::from_bytes(b"a\0b", allocator.clone()).unwrap_err();
    assert_eq!(err.message(), "string contains null byte");
    assert_eq!(allocator.allocations(), 0);
}

#[test]
fn test_native_str_raw_round_trip() {
    let allocator = TrackingAllocator::new();
    let raw = NativeStr::from_bytes(b"", allocator.clone()).unwrap().into_raw();
    assert_eq!(allocator.live_blocks(), 1);
    let s = unsafe { NativeStr::from_raw(raw, allocator.clone()) }.unwrap();
    assert!(s.is_empty());
    drop(s);
    assert_eq!(allocator.live_blocks(), 0);
}

// ===== List Tests =====

#[test]
fn test_string_list_preserves_order() {
    let allocator = TrackingAllocator::new();
    let list = StringList::from_items([&b"x"[..], b"yy", b"zzz"], allocator.clone()).unwrap();
    let items: Vec<&[u8]> = list.iter().map(CStr::to_bytes).collect();
    assert_eq!(items, vec![&b"x"[..], b"yy", b"zzz"]);
    assert_eq!(list.len(), 3);
    // three nodes, three strings
    assert_eq!(allocator.live_blocks(), 6);

    drop(list);
    assert_eq!(allocator.live_blocks(), 0);
}

#[test]
fn test_string_list_failure_releases_partial_list() {
    let allocator = TrackingAllocator::new();
    let result = StringList::from_items([&b"ok"[..], b"bad\0"], allocator.clone());
    assert!(result.is_err());
    assert_eq!(allocator.live_blocks(), 0);
}

#[test]
fn test_string_list_raw_round_trip() {
    let allocator = TrackingAllocator::new();
    let head = StringList::from_items([&b"a"[..]], allocator.clone()).unwrap().into_raw();
    assert!(!head.is_null());
    let list = unsafe { StringList::from_raw(head, allocator.clone()) };
    assert!(!list.is_empty());
    drop(list);
    assert_eq!(allocator.live_blocks(), 0);
}
