//! Rose plain objects.
//!
//! An [`Object`] is an insertion-ordered list of `(key, value)` entries with
//! unique keys.  Lookup is a linear scan; objects in Rose programs are small
//! and iteration order must match insertion order.

use std::rc::Rc;

use smallvec::SmallVec;

use crate::objects::value::Value;

/// Number of entries stored inline before spilling to the heap.
const INLINE_ENTRIES: usize = 4;

/// An ordered string-keyed map.
#[derive(Debug, Clone, Default)]
pub struct Object {
    entries: SmallVec<[(Rc<str>, Value); INLINE_ENTRIES]>,
}

impl Object {
    /// Creates an empty object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v)
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Stores `value` under `key`, replacing an existing entry in place or
    /// appending a new one.
    pub fn set(&mut self, key: impl Into<Rc<str>>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Removes `key`, returning its value.  Later entries keep their order.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let idx = self.entries.iter().position(|(k, _)| k.as_ref() == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the object has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Rc<str>, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number;

    #[test]
    fn test_set_appends_and_replaces_in_place() {
        let mut obj = Object::new();
        obj.set("a", Value::Bool(true));
        obj.set("b", Value::Null);
        obj.set("a", Value::Number(number::from(2)));
        let keys: Vec<&str> = obj.iter().map(|(k, _)| k.as_ref()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert!(matches!(obj.get("a"), Some(Value::Number(_))));
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut obj = Object::new();
        for key in ["x", "y", "z", "w", "v"] {
            obj.set(key, Value::Undefined);
        }
        assert!(obj.remove("y").is_some());
        assert!(obj.remove("missing").is_none());
        let keys: Vec<&str> = obj.iter().map(|(k, _)| k.as_ref()).collect();
        assert_eq!(keys, vec!["x", "z", "w", "v"]);
        assert_eq!(obj.len(), 4);
        assert!(!obj.contains_key("y"));
    }
}
