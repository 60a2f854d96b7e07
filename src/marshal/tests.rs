//! Marshalling tests
//!
//! Test suite organized by component:
//! - Guarded core: duplication, failure position, leak freedom
//! - Element coercions per native type
//! - Nil-accepting entry points
//! - String vectors
//! - C string helpers
//! - Reverse conversions

use super::*;
use crate::error::{ErrorKind, MarshalError};
use crate::native::{NativeStr, OwnedCStr, TrackingAllocator};
use crate::transcode::{Charset, FilenameCodec};
use crate::value::{Array, RString, Value};
use std::ffi::CStr;

fn tracked() -> (Marshaller<TrackingAllocator>, TrackingAllocator) {
    let allocator = TrackingAllocator::new();
    let marshaller = Marshaller::with_allocator(allocator.clone(), FilenameCodec::utf8());
    (marshaller, allocator)
}

fn ints(values: &[i64]) -> Value {
    Value::array(values.iter().map(|&n| Value::Int(n)))
}

// ===== Guarded Core Tests =====

#[test]
fn test_converts_in_order() {
    let (m, allocator) = tracked();
    let buffer = m.ints(&ints(&[3, 1, 2])).unwrap();
    assert_eq!(buffer.as_slice(), &[3, 1, 2]);
    assert_eq!(buffer.len(), 3);
    assert_eq!(allocator.live_blocks(), 1);
    drop(buffer);
    assert_eq!(allocator.live_blocks(), 0);
}

#[test]
fn test_non_sequence_input_fails_without_allocating() {
    let (m, allocator) = tracked();
    let err = m.ints(&Value::Int(5)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
    assert_eq!(err.message(), "no implicit conversion of Integer into Array");
    assert_eq!(allocator.allocations(), 0);
}

#[test]
fn test_failure_releases_partial_buffer() {
    let (m, allocator) = tracked();
    let input = Value::array([Value::Int(1), Value::Int(2), Value::str("three")]);
    let err = m.int64s(&input).unwrap_err();
    assert_eq!(err, MarshalError::type_error("no implicit conversion of String into Integer"));
    assert_eq!(allocator.allocations(), 1);
    assert_eq!(allocator.live_blocks(), 0);
}

#[test]
fn test_first_failure_wins() {
    let (m, _) = tracked();
    let input = Value::array([Value::Int(1), Value::Int(-1), Value::Int(999)]);
    let err = m.uint8s(&input).unwrap_err();
    assert_eq!(err.message(), "integer -1 too small to convert to 'guint8'");
}

#[test]
fn test_conversion_uses_a_snapshot() {
    let (m, _) = tracked();
    let array = Array::from(vec![Value::Int(1), Value::Int(2)]);
    let input = Value::Array(array.clone());

    let mut calls = 0;
    let buffer = guarded_convert(&input, m.allocator(), |item| {
        calls += 1;
        // growing the caller's array mid-conversion must not be observed
        array.push(Value::Int(99));
        i32::from_value(item, m.allocator())
    })
    .unwrap();

    assert_eq!(calls, 2);
    assert_eq!(buffer.as_slice(), &[1, 2]);
    assert_eq!(array.len(), 4);
}

#[test]
fn test_empty_input_allocates_empty_buffer() {
    let (m, allocator) = tracked();
    let buffer = m.doubles(&Value::array([])).unwrap();
    assert!(buffer.is_empty());
    assert!(!buffer.as_ptr().is_null());
    assert_eq!(allocator.live_blocks(), 1);
}

// ===== Element Coercion Tests =====

#[test]
fn test_booleans_follow_truthiness() {
    let (m, _) = tracked();
    let input = Value::array([
        Value::Nil,
        Value::Bool(false),
        Value::Bool(true),
        Value::Int(0),
        Value::str(""),
    ]);
    let buffer = m.booleans(&input).unwrap();
    let flags: Vec<i32> = buffer.iter().map(|b| b.0).collect();
    assert_eq!(flags, vec![0, 0, 1, 1, 1]);
}

#[test]
fn test_integer_widths_are_range_checked() {
    let (m, _) = tracked();

    assert_eq!(m.int8s(&ints(&[-128, 127])).unwrap().as_slice(), &[-128, 127]);
    assert_eq!(
        m.int8s(&ints(&[128])).unwrap_err().message(),
        "integer 128 too big to convert to 'gint8'"
    );

    assert_eq!(m.uint16s(&ints(&[65535])).unwrap().as_slice(), &[65535]);
    assert_eq!(
        m.uint16s(&ints(&[65536])).unwrap_err().message(),
        "integer 65536 too big to convert to 'guint16'"
    );

    assert_eq!(
        m.int16s(&ints(&[-32769])).unwrap_err().message(),
        "integer -32769 too small to convert to 'gint16'"
    );

    assert_eq!(
        m.ints(&ints(&[i64::from(i32::MAX) + 1])).unwrap_err().message(),
        "integer 2147483648 too big to convert to 'gint'"
    );

    assert_eq!(m.uint32s(&ints(&[4_294_967_295])).unwrap().as_slice(), &[u32::MAX]);
    assert_eq!(
        m.uint64s(&ints(&[-1])).unwrap_err().kind(),
        ErrorKind::Range
    );
    assert_eq!(m.int64s(&ints(&[i64::MIN])).unwrap().as_slice(), &[i64::MIN]);
}

#[test]
fn test_integers_accept_floats_by_truncation() {
    let (m, _) = tracked();
    let input = Value::array([Value::Float(1.9), Value::Float(-0.5)]);
    assert_eq!(m.ints(&input).unwrap().as_slice(), &[1, 0]);
}

#[test]
fn test_uint64s_take_floats_beyond_i64() {
    let (m, _) = tracked();
    let input = Value::array([Value::Float(1e19), Value::Int(i64::MAX)]);
    assert_eq!(
        m.uint64s(&input).unwrap().as_slice(),
        &[10_000_000_000_000_000_000u64, i64::MAX as u64]
    );

    let err = m.uint64s(&Value::array([Value::Float(2e19)])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Range);
    assert_eq!(err.message(), "float 2e+19 out of range of integer");

    let err = m.uint64s(&Value::array([Value::Float(-1.5)])).unwrap_err();
    assert_eq!(err.message(), "integer -1 too small to convert to 'guint64'");
}

#[test]
fn test_floats_out_of_target_range_report_the_integer() {
    let (m, _) = tracked();
    let err = m.uint8s(&Value::array([Value::Float(300.7)])).unwrap_err();
    assert_eq!(err.message(), "integer 300 too big to convert to 'guint8'");
}

#[test]
fn test_integers_reject_nil() {
    let (m, allocator) = tracked();
    let err = m.ints(&Value::array([Value::Int(1), Value::Nil])).unwrap_err();
    assert_eq!(err.message(), "no implicit conversion from nil to integer");
    assert_eq!(allocator.live_blocks(), 0);
}

#[test]
fn test_doubles_accept_integers_and_reject_strings() {
    let (m, allocator) = tracked();
    let buffer = m.doubles(&Value::array([Value::Int(2), Value::Float(0.25)])).unwrap();
    assert_eq!(buffer.as_slice(), &[2.0, 0.25]);

    let err = m.doubles(&Value::array([Value::Float(1.0), Value::str("x")])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
    assert_eq!(err.message(), "no implicit conversion to float from string");
    drop(buffer);
    assert_eq!(allocator.live_blocks(), 0);
}

#[test]
fn test_generic_array_matches_named_entry_point() {
    let (m, _) = tracked();
    let input = ints(&[4, 5]);
    let generic = m.array::<u8>(&input).unwrap();
    let named = m.uint8s(&input).unwrap();
    assert_eq!(generic.as_slice(), named.as_slice());
}

// ===== Nil-Accepting Tests =====

#[test]
fn test_accept_nil_skips_allocation() {
    let (m, allocator) = tracked();
    assert!(m.array_accept_nil::<i32>(&Value::Nil).unwrap().is_none());
    assert!(m.strv_accept_nil(&Value::Nil).unwrap().is_none());
    assert!(m.strv_dup_accept_nil(&Value::Nil).unwrap().is_none());
    assert_eq!(allocator.allocations(), 0);
}

#[test]
fn test_accept_nil_still_converts_values() {
    let (m, allocator) = tracked();
    let buffer = m
        .strv_dup_accept_nil(&Value::array([Value::str("a")]))
        .unwrap()
        .unwrap();
    assert_eq!(buffer.len(), 1);
    drop(buffer);
    assert_eq!(allocator.live_blocks(), 0);

    let err = m.array_accept_nil::<u8>(&ints(&[256])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Range);
}

// ===== String Vector Tests =====

#[test]
fn test_strv_is_null_terminated() {
    let (m, _) = tracked();
    let strv = m.strv(&Value::array([Value::str("a"), Value::str("bc")])).unwrap();
    assert_eq!(strv.len(), 2);

    let terminated = strv.buffer().as_terminated_slice().unwrap();
    assert_eq!(terminated.len(), 3);
    assert!(terminated[2].is_null());
    let first = unsafe { CStr::from_ptr(terminated[0]) };
    assert_eq!(first.to_bytes(), b"a");

    let collected: Vec<&[u8]> = strv.iter().map(CStr::to_bytes).collect();
    assert_eq!(collected, vec![&b"a"[..], b"bc"]);
}

#[test]
fn test_empty_strv_holds_only_the_terminator() {
    let (m, allocator) = tracked();
    let strv = m.strv(&Value::array([])).unwrap();
    assert_eq!(strv.len(), 0);
    let terminated = strv.buffer().as_terminated_slice().unwrap();
    assert_eq!(terminated.len(), 1);
    assert!(terminated[0].is_null());
    assert_eq!(allocator.live_blocks(), 1);
}

#[test]
fn test_strv_exports_to_utf8() {
    let (m, _) = tracked();
    let latin = Charset::lookup("ISO-8859-2").unwrap();
    let input = Value::array([Value::Str(RString::from_bytes(vec![0xE9], latin))]);
    let strv = m.strv(&input).unwrap();
    let first = strv.iter().next().unwrap();
    assert_eq!(first.to_str().unwrap(), "é");
}

#[test]
fn test_strv_debug_lists_strings() {
    let (m, _) = tracked();
    let strv = m.strv(&Value::array([Value::str("a"), Value::str("bc")])).unwrap();
    assert_eq!(format!("{:?}", strv), r#"["a", "bc"]"#);
}

#[test]
fn test_strv_rejects_invalid_utf8() {
    let (m, allocator) = tracked();
    let bad = Value::Str(RString::from_bytes(vec![b'o', b'k', 0xFF], Charset::Utf8));
    let err = m.strv(&Value::array([Value::str("fine"), bad])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Encoding);
    assert_eq!(err.message(), "\"\\xFF\" on UTF-8");
    assert_eq!(allocator.live_blocks(), 0);
}

#[test]
fn test_strv_rejects_non_strings() {
    let (m, allocator) = tracked();
    let err = m.strv(&Value::array([Value::str("a"), Value::Int(1)])).unwrap_err();
    assert_eq!(err.message(), "no implicit conversion of Integer into String");
    assert_eq!(allocator.live_blocks(), 0);
}

#[test]
fn test_strv_dup_owns_each_string() {
    let (m, allocator) = tracked();
    let buffer = m.strv_dup(&Value::array([Value::str("x"), Value::str("y")])).unwrap();
    // vector plus two strings
    assert_eq!(allocator.live_blocks(), 3);
    assert!(buffer.as_terminated_slice().unwrap()[2].is_null());
    drop(buffer);
    assert_eq!(allocator.live_blocks(), 0);
}

#[test]
fn test_strv_dup_failure_releases_copied_strings() {
    let (m, allocator) = tracked();
    let input = Value::array([Value::str("x"), Value::str("y"), Value::symbol("z")]);
    let err = m.strv_dup(&input).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Type);
    assert_eq!(allocator.allocations(), 3);
    assert_eq!(allocator.live_blocks(), 0);
}

#[test]
fn test_strv_dup_rejects_embedded_nul() {
    let (m, allocator) = tracked();
    let err = m.strv_dup(&Value::array([Value::str("a\0b")])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Argument);
    assert_eq!(allocator.live_blocks(), 0);
}

// ===== C String Helper Tests =====

#[test]
fn test_value_to_cstr_variants() {
    assert_eq!(value_to_cstr(&Value::str("hi")).unwrap().as_bytes(), b"hi");
    assert!(value_to_cstr(&Value::symbol("hi")).is_err());
    assert_eq!(
        value_to_cstr_accept_symbol(&Value::symbol("hi")).unwrap().as_bytes(),
        b"hi"
    );
    assert!(value_to_cstr_accept_nil(&Value::Nil).unwrap().is_none());
    assert!(value_to_cstr_accept_symbol_accept_nil(&Value::Nil).unwrap().is_none());
    assert_eq!(
        value_to_cstr_accept_symbol_accept_nil(&Value::str("s"))
            .unwrap()
            .unwrap()
            .as_bytes(),
        b"s"
    );
}

#[test]
fn test_value_to_cstr_reports_invalid_source_bytes() {
    let euc = Charset::lookup("EUC-JP").unwrap();
    let err = value_to_cstr(&Value::Str(RString::from_bytes(vec![0xA4], euc))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Encoding);
}

#[test]
fn test_value_to_cstr_rejects_invalid_utf8() {
    let value = Value::Str(RString::from_bytes(vec![0xC3, 0x28], Charset::Utf8));
    let err = value_to_cstr(&value).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Encoding);
    assert_eq!(err.message(), "\"\\xC3\" on UTF-8");
}

#[test]
fn test_inspect_cstr_handles_self_containing_array() {
    let array = Array::from(vec![Value::Int(1)]);
    array.push(Value::Array(array.clone()));
    assert_eq!(inspect_cstr(&Value::Array(array)).unwrap().as_bytes(), b"[1, [...]]");
}

#[test]
fn test_inspect_cstr_renders_value() {
    let value = Value::array([Value::symbol("a"), Value::str("b")]);
    assert_eq!(inspect_cstr(&value).unwrap().as_bytes(), b"[:a, \"b\"]");
}

// ===== Reverse Conversion Tests =====

#[test]
fn test_cstr_to_value_handles_null() {
    assert_eq!(cstr_to_value(None), Value::Nil);
    let s = CStr::from_bytes_with_nul(b"abc\0").unwrap();
    assert_eq!(cstr_to_value(Some(s)), Value::str("abc"));
    assert_eq!(cstr_len_to_value(Some(&b"ab"[..])), Value::str("ab"));
}

#[test]
fn test_cstr_free_variants_release_once() {
    let allocator = TrackingAllocator::new();
    let s = NativeStr::from_bytes(b"hello", allocator.clone()).unwrap();
    assert_eq!(cstr_to_value_free(Some(s)), Value::str("hello"));
    assert_eq!(allocator.live_blocks(), 0);

    let s = NativeStr::from_bytes(b"hello", allocator.clone()).unwrap();
    assert_eq!(cstr_len_to_value_free(Some(s), 4), Value::str("hell"));
    assert_eq!(allocator.live_blocks(), 0);
    assert_eq!(allocator.releases(), 2);

    assert_eq!(cstr_to_value_free::<TrackingAllocator>(None), Value::Nil);
}

#[test]
fn test_cstr_with_encoding_tags_string() {
    let value = cstr_to_value_with_encoding(Some(&b"\xA4\xA2"[..]), Some("EUC-JP")).unwrap();
    match &value {
        Value::Str(s) => {
            assert_eq!(s.charset(), Charset::lookup("EUC-JP").unwrap());
            assert_eq!(s.to_utf8().unwrap().to_str(), Some("あ"));
        }
        other => panic!("expected string, got {:?}", other),
    }

    let plain = cstr_to_value_with_encoding(Some(&b"x"[..]), None).unwrap();
    assert_eq!(plain, Value::str("x"));

    let err = cstr_to_value_with_encoding(Some(&b"x"[..]), Some("KLINGON")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Argument);
    assert_eq!(err.message(), "unknown encoding name - KLINGON");
}

#[test]
fn test_strv_round_trip_through_native() {
    let (m, allocator) = tracked();
    let input = Value::array([Value::str("one"), Value::str("two")]);
    let buffer = m.strv_dup(&input).unwrap();
    assert_eq!(strv_to_value(&buffer), input);

    let (ptr, _) = buffer.into_raw();
    let raw_view = unsafe { strv_ptr_to_value(ptr as *const *const std::os::raw::c_char) };
    assert_eq!(raw_view, input);

    let adopted = unsafe { crate::native::NativeBuffer::<OwnedCStr, _>::from_raw_terminated(ptr, allocator.clone()) };
    assert_eq!(strv_to_value_free(adopted), input);
    assert_eq!(allocator.live_blocks(), 0);
}

#[test]
fn test_strv_ptr_null_is_nil() {
    assert_eq!(unsafe { strv_ptr_to_value(std::ptr::null()) }, Value::Nil);
}

#[test]
fn test_ints_round_trip() {
    let (m, allocator) = tracked();
    let input = ints(&[-1, 0, 42]);
    let buffer = m.ints(&input).unwrap();
    assert_eq!(ints_to_value(buffer.as_slice()), input);
    assert_eq!(ints_to_value_free(buffer), input);
    assert_eq!(allocator.live_blocks(), 0);
}

#[test]
fn test_integer_elements_widen_into_values() {
    assert_eq!(slice_to_value(&[-3i8, 4]), ints(&[-3, 4]));
    assert_eq!(slice_to_value(&[u8::MAX]), ints(&[255]));
    assert_eq!(slice_to_value(&[u16::MAX]), ints(&[65535]));
    assert_eq!(slice_to_value(&[u32::MAX]), ints(&[4_294_967_295]));
    assert_eq!(slice_to_value(&[i64::MIN]), ints(&[i64::MIN]));
    assert_eq!(i16::MIN.into_value(), Value::Int(-32768));
}

#[test]
fn test_slice_to_value_for_other_types() {
    assert_eq!(
        slice_to_value(&[crate::native::GBoolean::TRUE, crate::native::GBoolean::FALSE]),
        Value::array([Value::Bool(true), Value::Bool(false)])
    );
    assert_eq!(slice_to_value(&[0.5f64]), Value::array([Value::Float(0.5)]));
    assert_eq!(slice_to_value(&[200u8]), Value::array([Value::Int(200)]));
}
