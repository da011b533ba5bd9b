//! String interning for repeated keys and values.
//!
//! Documents of any size repeat the same member names over and over; a
//! [`StringTable`] collapses those repeats into shared [`Arc<str>`] handles so
//! each distinct string is allocated once. The reader routes object keys (and
//! optionally string scalars) through a table when given one.

use ahash::RandomState;
use std::collections::HashSet;
use std::sync::Arc;

/// A deduplicating pool of shared strings.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use valon::StringTable;
///
/// let mut table = StringTable::new();
/// let a = table.intern("host");
/// let b = table.intern("host");
/// assert!(Arc::ptr_eq(&a, &b));
/// assert_eq!(table.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct StringTable {
    entries: HashSet<Arc<str>, RandomState>,
}

impl StringTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        StringTable::default()
    }

    /// Returns the shared handle for `s`, allocating it on first sight.
    pub fn intern(&mut self, s: &str) -> Arc<str> {
        match self.entries.get(s) {
            Some(existing) => Arc::clone(existing),
            None => {
                let handle: Arc<str> = Arc::from(s);
                self.entries.insert(Arc::clone(&handle));
                handle
            }
        }
    }

    /// Drops every entry no longer referenced outside the table.
    ///
    /// Call between documents to let strings from discarded trees go while
    /// keeping the working set warm.
    pub fn flush(&mut self) {
        self.entries.retain(|s| Arc::strong_count(s) > 1);
    }

    /// Drops all entries. Handles already handed out stay valid.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of distinct strings held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table holds no strings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_deduplicates() {
        let mut table = StringTable::new();
        let a = table.intern("key");
        let b = table.intern("key");
        let c = table.intern("other");

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn flush_keeps_live_entries() {
        let mut table = StringTable::new();
        let live = table.intern("live");
        let _ = table.intern("dead");
        assert_eq!(table.len(), 2);

        table.flush();
        assert_eq!(table.len(), 1);
        assert!(Arc::ptr_eq(&table.intern("live"), &live));
    }

    #[test]
    fn clear_leaves_handles_valid() {
        let mut table = StringTable::new();
        let handle = table.intern("still-here");
        table.clear();
        assert!(table.is_empty());
        assert_eq!(handle.as_ref(), "still-here");
    }
}
