//! Per-element coercion from runtime values

use crate::error::{MarshalError, Result};
use crate::native::{GBoolean, NativeAllocator, NativeElement, NativeStr, OwnedCStr};
use crate::value::Value;
use num_traits::NumCast;

/// A native element that can be produced from one runtime value
pub trait FromValue: NativeElement {
    fn from_value<A: NativeAllocator>(value: &Value, allocator: &A) -> Result<Self>;
}

impl FromValue for GBoolean {
    #[inline]
    fn from_value<A: NativeAllocator>(value: &Value, _allocator: &A) -> Result<Self> {
        Ok(GBoolean::from(value.truthy()))
    }
}

impl FromValue for f64 {
    #[inline]
    fn from_value<A: NativeAllocator>(value: &Value, _allocator: &A) -> Result<Self> {
        value.to_f64()
    }
}

/// Integer coercion with a range check against the target width
///
/// Integers are `i64`, so a float is the only way to reach the top half of
/// `guint64`; one whose truncation fits the target is taken as is.
fn checked_integer<T>(value: &Value) -> Result<T>
where
    T: NativeElement + NumCast,
{
    if let Value::Float(f) = value {
        if let Some(n) = <T as NumCast>::from(f.trunc()) {
            return Ok(n);
        }
    }
    let n = value.to_i64()?;
    <T as NumCast>::from(n).ok_or_else(|| {
        let direction = if n < 0 { "small" } else { "big" };
        MarshalError::range_error(format!(
            "integer {} too {} to convert to '{}'",
            n,
            direction,
            T::NATIVE_TYPE.c_name()
        ))
    })
}

macro_rules! impl_integer_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromValue for $ty {
                #[inline]
                fn from_value<A: NativeAllocator>(value: &Value, _allocator: &A) -> Result<Self> {
                    checked_integer::<$ty>(value)
                }
            }
        )*
    };
}

impl_integer_from_value!(i8, u8, i16, u16, i32, u32, i64, u64);

/// Duplicates the string (as UTF-8) into native memory
impl FromValue for OwnedCStr {
    fn from_value<A: NativeAllocator>(value: &Value, allocator: &A) -> Result<Self> {
        let utf8 = value.string_value()?.to_utf8()?;
        Ok(NativeStr::from_bytes(utf8.as_bytes(), allocator.clone())?.into_owned())
    }
}

/// A native element that can be turned back into a runtime value
pub trait IntoValue: NativeElement {
    fn into_value(self) -> Value;
}

impl IntoValue for GBoolean {
    fn into_value(self) -> Value {
        Value::Bool(self.is_true())
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

macro_rules! impl_integer_into_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoValue for $ty {
                #[inline]
                fn into_value(self) -> Value {
                    Value::Int(<i64 as From<$ty>>::from(self))
                }
            }
        )*
    };
}

impl_integer_into_value!(i8, u8, i16, u16, i32, u32, i64);
