//! Runtime values - the slice of the scripting runtime's object model that
//! marshalling depends on
//!
//! Design: `Value` is a small enum; arrays and hashes are shared mutable
//! handles so that aliasing behaves as it does in the runtime (a caller can
//! keep pushing to an array it handed us). Coercions follow the runtime's
//! implicit conversion rules and produce its error messages.

mod array;
mod hash;
mod string;


pub use array::Array;
pub use hash::Hash;
pub use string::RString;

use crate::error::{MarshalError, Result};
use std::fmt::Write as _;

/// Runtime class of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Nil,
    True,
    False,
    Integer,
    Float,
    String,
    Symbol,
    Array,
    Hash,
}

impl ValueType {
    /// Class name as the runtime prints it
    pub const fn class_name(self) -> &'static str {
        match self {
            Self::Nil => "NilClass",
            Self::True => "TrueClass",
            Self::False => "FalseClass",
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::String => "String",
            Self::Symbol => "Symbol",
            Self::Array => "Array",
            Self::Hash => "Hash",
        }
    }

    /// Name used in "no implicit conversion of X into Y" messages
    ///
    /// Singletons are spelled as literals, everything else by class.
    pub const fn conversion_name(self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::True => "true",
            Self::False => "false",
            other => other.class_name(),
        }
    }
}

/// A runtime value
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(RString),
    Symbol(String),
    Array(Array),
    Hash(Hash),
}

impl Value {
    pub fn str(s: &str) -> Self {
        Self::Str(RString::new(s))
    }

    pub fn symbol(name: &str) -> Self {
        Self::Symbol(name.to_owned())
    }

    pub fn array<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Self::Array(items.into_iter().collect())
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Nil => ValueType::Nil,
            Self::Bool(true) => ValueType::True,
            Self::Bool(false) => ValueType::False,
            Self::Int(_) => ValueType::Integer,
            Self::Float(_) => ValueType::Float,
            Self::Str(_) => ValueType::String,
            Self::Symbol(_) => ValueType::Symbol,
            Self::Array(_) => ValueType::Array,
            Self::Hash(_) => ValueType::Hash,
        }
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Only `nil` and `false` are falsy
    #[inline]
    pub fn truthy(&self) -> bool {
        !matches!(self, Self::Nil | Self::Bool(false))
    }

    /// Implicit conversion to an array handle
    pub fn to_ary(&self) -> Result<Array> {
        match self {
            Self::Array(array) => Ok(array.clone()),
            other => Err(no_implicit_conversion(other, "Array")),
        }
    }

    /// Implicit conversion to a hash handle
    pub fn to_hash(&self) -> Result<Hash> {
        match self {
            Self::Hash(hash) => Ok(hash.clone()),
            other => Err(no_implicit_conversion(other, "Hash")),
        }
    }

    /// Implicit conversion to a string
    pub fn string_value(&self) -> Result<&RString> {
        match self {
            Self::Str(s) => Ok(s),
            other => Err(no_implicit_conversion(other, "String")),
        }
    }

    /// Integer coercion; floats truncate toward zero
    pub fn to_i64(&self) -> Result<i64> {
        match self {
            Self::Int(n) => Ok(*n),
            Self::Float(f) => {
                // i64::MAX as f64 rounds up to 2^63, which is already out of range
                if f.is_finite() && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                    Ok(f.trunc() as i64)
                } else {
                    Err(MarshalError::range_error(format!(
                        "float {} out of range of integer",
                        format_float_g(*f)
                    )))
                }
            }
            Self::Nil => Err(MarshalError::type_error(
                "no implicit conversion from nil to integer",
            )),
            other => Err(no_implicit_conversion(other, "Integer")),
        }
    }

    /// Float coercion
    pub fn to_f64(&self) -> Result<f64> {
        match self {
            Self::Int(n) => Ok(*n as f64),
            Self::Float(f) => Ok(*f),
            Self::Str(_) => Err(MarshalError::type_error(
                "no implicit conversion to float from string",
            )),
            other => Err(MarshalError::type_error(format!(
                "can't convert {} into Float",
                other.value_type().conversion_name()
            ))),
        }
    }

    /// Human-readable representation, as the runtime's `inspect`
    ///
    /// A collection that contains itself prints as `[...]` or `{...}`.
    pub fn inspect(&self) -> String {
        let mut out = String::new();
        self.write_inspect(&mut out, &mut Vec::new());
        out
    }

    fn write_inspect(&self, out: &mut String, seen: &mut Vec<*const ()>) {
        match self {
            Self::Nil => out.push_str("nil"),
            Self::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Self::Int(n) => {
                let _ = write!(out, "{}", n);
            }
            Self::Float(f) => out.push_str(&format_float(*f)),
            Self::Str(s) => s.write_inspect(out),
            Self::Symbol(name) => write_symbol(name, out),
            Self::Array(array) => {
                let id = array.as_ptr();
                if seen.contains(&id) {
                    out.push_str("[...]");
                    return;
                }
                seen.push(id);
                out.push('[');
                for (i, item) in array.to_vec().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.write_inspect(out, seen);
                }
                out.push(']');
                seen.pop();
            }
            Self::Hash(hash) => {
                let id = hash.as_ptr();
                if seen.contains(&id) {
                    out.push_str("{...}");
                    return;
                }
                seen.push(id);
                out.push('{');
                for (i, (key, value)) in hash.pairs().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    key.write_inspect(out, seen);
                    out.push_str("=>");
                    value.write_inspect(out, seen);
                }
                out.push('}');
                seen.pop();
            }
        }
    }

    /// Equality that treats a pair of collections already being compared
    /// further up as equal, so self-containing values terminate
    fn eq_guarded(&self, other: &Self, seen: &mut Vec<(*const (), *const ())>) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a.as_bytes() == b.as_bytes(),
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => {
                if a.ptr_eq(b) {
                    return true;
                }
                let pair = (a.as_ptr(), b.as_ptr());
                if seen.contains(&pair) {
                    return true;
                }
                let (left, right) = (a.to_vec(), b.to_vec());
                if left.len() != right.len() {
                    return false;
                }
                seen.push(pair);
                let equal = left.iter().zip(&right).all(|(x, y)| x.eq_guarded(y, seen));
                seen.pop();
                equal
            }
            (Self::Hash(a), Self::Hash(b)) => {
                if a.ptr_eq(b) {
                    return true;
                }
                let pair = (a.as_ptr(), b.as_ptr());
                if seen.contains(&pair) {
                    return true;
                }
                let (left, right) = (a.pairs(), b.pairs());
                if left.len() != right.len() {
                    return false;
                }
                seen.push(pair);
                let equal = left.iter().all(|(key, value)| {
                    right
                        .iter()
                        .any(|(k, v)| key.eq_guarded(k, seen) && value.eq_guarded(v, seen))
                });
                seen.pop();
                equal
            }
            _ => false,
        }
    }
}

/// Structural equality with the runtime's `eql?` semantics (`1` is not `1.0`)
///
/// Hashes compare without regard to insertion order.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.eq_guarded(other, &mut Vec::new())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::str(s)
    }
}

impl From<RString> for Value {
    fn from(s: RString) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(Array::from(items))
    }
}

impl From<Hash> for Value {
    fn from(hash: Hash) -> Self {
        Self::Hash(hash)
    }
}

fn no_implicit_conversion(value: &Value, target: &str) -> MarshalError {
    MarshalError::type_error(format!(
        "no implicit conversion of {} into {}",
        value.value_type().conversion_name(),
        target
    ))
}

/// Float rendering as the runtime prints it: `1.0`, `1.5`, `1.0e+20`, `Infinity`
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_owned();
    }
    if f.is_infinite() {
        return if f > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }

    let exponent = if f == 0.0 { 0 } else { f.abs().log10().floor() as i32 };
    if (-4..16).contains(&exponent) {
        let s = format!("{}", f);
        if s.contains('.') {
            s
        } else {
            format!("{}.0", s)
        }
    } else {
        let s = format!("{:e}", f);
        let (mantissa, exp) = s.split_once('e').unwrap_or((s.as_str(), "0"));
        let mantissa = if mantissa.contains('.') {
            mantissa.to_owned()
        } else {
            format!("{}.0", mantissa)
        };
        let (sign, digits) = match exp.strip_prefix('-') {
            Some(digits) => ('-', digits),
            None => ('+', exp),
        };
        format!("{}e{}{:0>2}", mantissa, sign, digits)
    }
}

/// Float as C's `%.10g` renders it, as range error messages print it:
/// `1e+20`, `-9.223372037e+18`, `nan`, `inf`
pub(crate) fn format_float_g(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_owned();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_owned();
    }

    // ten significant digits; the exponent is taken after rounding
    let scientific = format!("{:.9e}", f);
    let (mantissa, exp) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exp.parse().unwrap_or(0);

    if (-4..10).contains(&exponent) {
        let decimals = (9 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, f)).to_owned()
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

fn write_symbol(name: &str, out: &mut String) {
    if is_plain_symbol(name) {
        out.push(':');
        out.push_str(name);
    } else {
        out.push(':');
        RString::new(name).write_inspect(out);
    }
}

fn is_plain_symbol(name: &str) -> bool {
    let body = name
        .strip_suffix(|c| c == '?' || c == '!' || c == '=')
        .unwrap_or(name);
    let mut chars = body.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
