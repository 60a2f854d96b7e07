//! Native element types
//!
//! Describes the C types native buffers hold and what each element owns.

use super::alloc::NativeAllocator;
use super::string::NativeStr;
use std::os::raw::c_char;
use std::ptr;

/// C type descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NativeType {
    Boolean,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Double,
    StringPtr,
}

impl NativeType {
    /// Name of the C type
    pub const fn c_name(self) -> &'static str {
        match self {
            Self::Boolean => "gboolean",
            Self::Int8 => "gint8",
            Self::UInt8 => "guint8",
            Self::Int16 => "gint16",
            Self::UInt16 => "guint16",
            Self::Int32 => "gint",
            Self::UInt32 => "guint32",
            Self::Int64 => "gint64",
            Self::UInt64 => "guint64",
            Self::Double => "gdouble",
            Self::StringPtr => "gchar*",
        }
    }

    /// Size of type in bytes
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Boolean | Self::Int32 | Self::UInt32 => 4,
            Self::Int64 | Self::UInt64 | Self::Double => 8,
            Self::StringPtr => std::mem::size_of::<*const c_char>(),
        }
    }

    #[inline]
    pub const fn align(self) -> usize {
        self.size()
    }

    #[inline]
    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::UInt8
                | Self::UInt16
                | Self::UInt32
                | Self::UInt64
        )
    }

    #[inline]
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64 | Self::Double)
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Double)
    }

    /// Runtime class expected on input (for error messages)
    pub const fn runtime_class(self) -> &'static str {
        match self {
            Self::Boolean => "true/false",
            Self::Double => "Float",
            Self::StringPtr => "String",
            _ => "Integer",
        }
    }
}

/// An element a `NativeBuffer` can hold
///
/// `SENTINEL`, when set, is written one past the last element; such buffers
/// are allocated with one extra slot.
pub trait NativeElement: Copy + 'static {
    const NATIVE_TYPE: NativeType;
    const SENTINEL: Option<Self> = None;

    /// Release whatever this element owns
    ///
    /// # Safety
    /// Called at most once per element, with the allocator that produced it.
    unsafe fn release<A: NativeAllocator>(self, _allocator: &A) {}
}

/// Number of trailing sentinel slots for `T`
#[inline]
pub(crate) fn sentinel_slots<T: NativeElement>() -> usize {
    usize::from(T::SENTINEL.is_some())
}

/// C `gboolean`: an `int` holding 0 or 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct GBoolean(pub i32);

impl GBoolean {
    pub const FALSE: Self = Self(0);
    pub const TRUE: Self = Self(1);

    #[inline]
    pub fn is_true(self) -> bool {
        self.0 != 0
    }
}

impl From<bool> for GBoolean {
    fn from(b: bool) -> Self {
        if b {
            Self::TRUE
        } else {
            Self::FALSE
        }
    }
}

/// String pointer owned by the buffer holding it (a `g_strdup` result)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct OwnedCStr(pub(crate) *mut c_char);

impl OwnedCStr {
    #[inline]
    pub fn as_ptr(self) -> *const c_char {
        self.0
    }

    #[inline]
    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

macro_rules! impl_plain_element {
    ($($ty:ty => $native:ident),* $(,)?) => {
        $(
            impl NativeElement for $ty {
                const NATIVE_TYPE: NativeType = NativeType::$native;
            }
        )*
    };
}

impl_plain_element! {
    GBoolean => Boolean,
    i8 => Int8,
    u8 => UInt8,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f64 => Double,
}

/// Borrowed string pointer; the strings live elsewhere
impl NativeElement for *const c_char {
    const NATIVE_TYPE: NativeType = NativeType::StringPtr;
    const SENTINEL: Option<Self> = Some(ptr::null());
}

impl NativeElement for OwnedCStr {
    const NATIVE_TYPE: NativeType = NativeType::StringPtr;
    const SENTINEL: Option<Self> = Some(OwnedCStr(ptr::null_mut()));

    unsafe fn release<A: NativeAllocator>(self, allocator: &A) {
        drop(NativeStr::from_raw(self.0, allocator.clone()));
    }
}
