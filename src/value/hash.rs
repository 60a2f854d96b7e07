//! Insertion-ordered hash handle
//!
//! Keys are compared with `eql?` semantics. Option hashes hold a handful of
//! entries, so lookups scan linearly.

use super::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Hash handle; clones alias the same storage
#[derive(Clone, Default)]
pub struct Hash(Rc<RefCell<Vec<(Value, Value)>>>);

impl Hash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace, keeping the original position of an existing key
    pub fn insert(&self, key: Value, value: Value) {
        let mut entries = self.0.borrow_mut();
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &Value) -> Option<Value> {
        self.0
            .borrow()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// Remove `key`, returning its value
    pub fn delete(&self, key: &Value) -> Option<Value> {
        let mut entries = self.0.borrow_mut();
        let index = entries.iter().position(|(k, _)| k == key)?;
        Some(entries.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn keys(&self) -> Vec<Value> {
        self.0.borrow().iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn pairs(&self) -> Vec<(Value, Value)> {
        self.0.borrow().clone()
    }

    /// Shallow duplicate with its own storage
    pub fn dup(&self) -> Self {
        Self(Rc::new(RefCell::new(self.pairs())))
    }

    /// Identity of the shared storage
    pub(crate) fn as_ptr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }

    /// Whether both handles alias the same storage
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl FromIterator<(Value, Value)> for Hash {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let hash = Self::new();
        for (key, value) in iter {
            hash.insert(key, value);
        }
        hash
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", Value::Hash(self.clone()).inspect())
    }
}
