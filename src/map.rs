//! Ordered map storage for object values.
//!
//! [`ValueMap`] keeps its members in a single `Vec` sorted by byte-wise key
//! order: lookups are `O(log n)` binary searches, inserts and removals shift
//! the tail (`O(n)` worst case), and iteration walks contiguous storage in
//! ascending key order. That ordering is a contract, not an accident — it is
//! what makes serialized output byte-stable for a given key set.
//!
//! Keys are shared [`Arc<str>`] handles so an interning pool can hand the map
//! the same allocation it keeps for itself.
//!
//! The map also carries a modification counter, bumped on every structural or
//! value change, for cheap external change detection.

use crate::value::Value;
use std::sync::Arc;

/// A map from string keys to [`Value`]s, enumerated in ascending key order.
///
/// Duplicate keys cannot exist: [`ValueMap::update`] on a present key returns
/// the existing slot rather than adding a second entry.
///
/// # Examples
///
/// ```rust
/// use valon::{Value, ValueMap};
///
/// let mut map = ValueMap::new();
/// map.insert("b", Value::from(2));
/// map.insert("a", Value::from(1));
///
/// // Enumeration is key-ordered regardless of insertion order.
/// let names: Vec<_> = map.iter().map(|(k, _)| k).collect();
/// assert_eq!(names, ["a", "b"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ValueMap {
    entries: Vec<(Arc<str>, Value)>,
    mod_count: u32,
}

impl ValueMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        ValueMap::default()
    }

    /// Creates an empty map with room for `capacity` members.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        ValueMap {
            entries: Vec::with_capacity(capacity),
            mod_count: 0,
        }
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn search(&self, key: &str) -> std::result::Result<usize, usize> {
        self.entries
            .binary_search_by(|(name, _)| name.as_ref().cmp(key))
    }

    /// Index of the member with the given key, if present.
    #[must_use]
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.search(key).ok()
    }

    /// Returns the member for `key` if it exists.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.search(key).ok().map(|i| &self.entries[i].1)
    }

    /// Returns the member for `key` for writing, if it exists.
    ///
    /// Counts as a modification when the key is found.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        match self.search(key) {
            Ok(i) => {
                self.mod_count = self.mod_count.wrapping_add(1);
                Some(&mut self.entries[i].1)
            }
            Err(_) => None,
        }
    }

    /// Returns `true` if the map has a member named `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.search(key).is_ok()
    }

    /// Find-or-insert: returns the member for `key`, inserting a null value
    /// first if the key is absent.
    pub fn update(&mut self, key: &str) -> &mut Value {
        self.mod_count = self.mod_count.wrapping_add(1);
        let index = match self.search(key) {
            Ok(i) => i,
            Err(i) => {
                self.entries.insert(i, (Arc::from(key), Value::Null));
                i
            }
        };
        &mut self.entries[index].1
    }

    /// Find-or-insert variant that shares `key`'s allocation on insertion,
    /// used by the reader when keys come from an interning pool.
    pub fn update_interned(&mut self, key: Arc<str>) -> &mut Value {
        self.mod_count = self.mod_count.wrapping_add(1);
        let index = match self.search(&key) {
            Ok(i) => i,
            Err(i) => {
                self.entries.insert(i, (key, Value::Null));
                i
            }
        };
        &mut self.entries[index].1
    }

    /// Sets the member for `key`, replacing any existing value.
    pub fn insert(&mut self, key: &str, value: Value) {
        *self.update(key) = value;
    }

    /// Removes the member for `key`. Returns `false` if it doesn't exist.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.search(key) {
            Ok(i) => {
                self.entries.remove(i);
                self.mod_count = self.mod_count.wrapping_add(1);
                true
            }
            Err(_) => false,
        }
    }

    /// Removes all members.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.mod_count = self.mod_count.wrapping_add(1);
        }
    }

    /// Name of the `i`'th member in key order.
    #[must_use]
    pub fn name(&self, i: usize) -> &str {
        &self.entries[i].0
    }

    /// Shared key handle of the `i`'th member in key order.
    #[must_use]
    pub fn key(&self, i: usize) -> &Arc<str> {
        &self.entries[i].0
    }

    /// Value of the `i`'th member in key order.
    #[must_use]
    pub fn value(&self, i: usize) -> &Value {
        &self.entries[i].1
    }

    /// Value of the `i`'th member in key order, for writing.
    pub fn value_mut(&mut self, i: usize) -> &mut Value {
        &mut self.entries[i].1
    }

    /// Iterates members as `(name, value)` pairs in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_ref(), v))
    }

    /// Iterates members for writing, in ascending key order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Value)> {
        self.entries.iter_mut().map(|(k, v)| (&**k, v))
    }

    /// Merges `overrides` into this map: a null override removes the key, a
    /// non-null override recursively merges into (or creates) it.
    pub fn merge(&mut self, overrides: &ValueMap) {
        for (name, value) in overrides.iter() {
            if value.is_null() {
                self.remove(name);
            } else {
                self.update(name).merge(value);
            }
        }
    }

    /// Exchanges the contents of two maps. Both modification counters are
    /// bumped rather than swapped.
    pub fn swap(&mut self, other: &mut ValueMap) {
        std::mem::swap(&mut self.entries, &mut other.entries);
        self.mod_count = self.mod_count.wrapping_add(1);
        other.mod_count = other.mod_count.wrapping_add(1);
    }

    /// Modification counter: incremented on every structural or value
    /// change made through the map API. Wraps on overflow.
    #[must_use]
    pub fn mod_count(&self) -> u32 {
        self.mod_count
    }
}

impl PartialEq for ValueMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|((ka, va), (kb, vb))| ka == kb && va == vb)
    }
}

impl FromIterator<(String, Value)> for ValueMap {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut map = ValueMap::new();
        for (key, value) in iter {
            map.insert(&key, value);
        }
        map
    }
}

impl<'a> FromIterator<(&'a str, Value)> for ValueMap {
    fn from_iter<T: IntoIterator<Item = (&'a str, Value)>>(iter: T) -> Self {
        let mut map = ValueMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumeration_is_key_ordered() {
        let mut map = ValueMap::new();
        map.insert("zebra", Value::from(1));
        map.insert("apple", Value::from(2));
        map.insert("mango", Value::from(3));

        let names: Vec<_> = map.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(names, ["apple", "mango", "zebra"]);
        assert_eq!(map.name(0), "apple");
        assert_eq!(map.value(2), &Value::from(1));
    }

    #[test]
    fn update_returns_existing_slot() {
        let mut map = ValueMap::new();
        *map.update("k") = Value::from(1);
        *map.update("k") = Value::from(2);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("k"), Some(&Value::from(2)));
    }

    #[test]
    fn iter_mut_edits_values_in_place() {
        let mut map = ValueMap::new();
        map.insert("a", Value::from(1));
        map.insert("b", Value::from(2));

        for (name, value) in map.iter_mut() {
            if name == "b" {
                *value = Value::from(20);
            }
        }

        assert_eq!(map.get("a"), Some(&Value::from(1)));
        assert_eq!(map.get("b"), Some(&Value::from(20)));
    }

    #[test]
    fn remove_and_contains() {
        let mut map = ValueMap::new();
        map.insert("a", Value::from(1));
        assert!(map.contains_key("a"));
        assert!(map.remove("a"));
        assert!(!map.remove("a"));
        assert!(map.is_empty());
    }

    #[test]
    fn mod_count_tracks_changes() {
        let mut map = ValueMap::new();
        let start = map.mod_count();
        map.insert("a", Value::from(1));
        assert_ne!(map.mod_count(), start);

        let after_insert = map.mod_count();
        map.remove("a");
        assert_ne!(map.mod_count(), after_insert);
    }

    #[test]
    fn equality_ignores_mod_count() {
        let mut a = ValueMap::new();
        let mut b = ValueMap::new();
        a.insert("x", Value::from(1));
        b.insert("x", Value::from(1));
        b.insert("y", Value::from(2));
        b.remove("y");
        assert_eq!(a, b);
        assert_ne!(a.mod_count(), b.mod_count());
    }
}
