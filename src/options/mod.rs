//! Option hash extraction
//!
//! A binding method taking `**options` declares the keys it understands as
//! an ordered list of `OptionSlot`s. Each recognized key is moved out of a
//! private duplicate of the hash; anything left over is an error listing
//! both the strays and the accepted keys.


use crate::error::{MarshalError, Result};
use crate::logging;
use crate::value::{Hash, Value};
use smallvec::SmallVec;

/// A recognized key and where its value goes
#[derive(Debug)]
pub struct OptionSlot<'a> {
    key: &'a str,
    destination: &'a mut Value,
}

impl<'a> OptionSlot<'a> {
    pub fn new(key: &'a str, destination: &'a mut Value) -> Self {
        Self { key, destination }
    }

    pub fn key(&self) -> &str {
        self.key
    }
}

/// Extract recognized options into their slots
///
/// `nil` is an empty hash. Missing keys leave `nil` in their slot. Slots are
/// written only when the whole hash is accepted.
pub fn scan_options(options: &Value, slots: &mut [OptionSlot<'_>]) -> Result<()> {
    let working = match options {
        Value::Nil => Hash::new(),
        other => other.to_hash()?.dup(),
    };

    let mut extracted: SmallVec<[Value; 8]> = SmallVec::with_capacity(slots.len());
    let mut available: SmallVec<[Value; 8]> = SmallVec::with_capacity(slots.len());
    for slot in slots.iter() {
        let key = Value::symbol(slot.key);
        extracted.push(working.delete(&key).unwrap_or_default());
        available.push(key);
    }

    if !working.is_empty() {
        let unexpected = Value::from(working.keys()).inspect();
        let available = Value::from(available.into_vec()).inspect();
        logging::log_options_rejected(&unexpected, &available);
        return Err(MarshalError::argument_error(format!(
            "unexpected key(s) exist: {}: available keys: {}",
            unexpected, available
        )));
    }

    for (slot, value) in slots.iter_mut().zip(extracted) {
        *slot.destination = value;
    }
    Ok(())
}

/// Extract `keys` from `options`, returning values in key order
pub fn extract_options<const N: usize>(options: &Value, keys: [&str; N]) -> Result<[Value; N]> {
    let mut values: [Value; N] = std::array::from_fn(|_| Value::Nil);
    let mut slots: SmallVec<[OptionSlot<'_>; 8]> = keys
        .iter()
        .copied()
        .zip(values.iter_mut())
        .map(|(key, destination)| OptionSlot::new(key, destination))
        .collect();
    scan_options(options, &mut slots)?;
    drop(slots);
    Ok(values)
}
