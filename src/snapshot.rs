use alloc::vec::Vec;
use core::ops::Deref;

use crate::error::Error;
use crate::error::Result;

/// A detached, indexable copy of part of a table's contents.
///
/// A `Snapshot` owns its elements and never aliases the slot array it was
/// taken from, so it stays valid across any later insert, removal or resize of
/// that table. Each call that produces a snapshot walks the table again.
///
/// The order of elements follows the slot array and carries no meaning: it
/// depends on insertion history and on every rehash the table went through.
///
/// # Examples
///
/// ```rust
/// use cellar_hash::IntHashMap;
///
/// let mut map = IntHashMap::new();
/// map.insert(1, "one").unwrap();
/// map.insert(2, "two").unwrap();
///
/// let keys = map.snapshot_keys();
/// map.clear();
///
/// assert_eq!(keys.len(), 2);
/// assert!(keys.item(2).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<T> {
    items: Vec<T>,
}

impl<T> Snapshot<T> {
    /// Returns the number of elements in the snapshot.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the snapshot holds no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the element at `index`.
    ///
    /// Fails with [`Error::OutOfRange`] when `index >= self.len()`.
    pub fn item(&self, index: usize) -> Result<&T> {
        self.items.get(index).ok_or(Error::OutOfRange {
            index,
            len: self.items.len(),
        })
    }

    /// Returns an iterator over the elements.
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Returns the elements as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Consumes the snapshot, returning the underlying vector.
    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Deref for Snapshot<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items
    }
}

impl<T> FromIterator<T> for Snapshot<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for Snapshot<T> {
    type IntoIter = alloc::vec::IntoIter<T>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Snapshot<T> {
    type IntoIter = core::slice::Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
