use alloc::string::String;
use core::borrow::Borrow;
use core::fmt::Debug;

use crate::error::Result;
use crate::hash_map;
use crate::hash_map::HashMap;
#[cfg(feature = "foldhash")]
use crate::key_hash::FoldHash;
use crate::key_hash::Djb2;
use crate::key_hash::IdentityHash;
use crate::key_hash::KeyHasher;
use crate::snapshot::Snapshot;

/// A set of strings hashed by [`Djb2`].
pub type StrHashSet = HashSet<String, Djb2>;

/// A set of `i32` values hashed by [`IdentityHash`].
pub type IntHashSet = HashSet<i32, IdentityHash>;

/// A set of any `Hash + Eq` type, hashed by [`FoldHash`].
#[cfg(feature = "foldhash")]
pub type FoldHashSet<T> = HashSet<T, FoldHash>;

/// A hash set: a [`HashMap`] whose values carry no payload.
///
/// # Examples
///
/// ```rust
/// use cellar_hash::StrHashSet;
///
/// let mut up = StrHashSet::new();
/// assert_eq!(up.insert("eth0".to_string()), Ok(true));
/// assert_eq!(up.insert("eth0".to_string()), Ok(false));
/// assert!(up.contains("eth0"));
///
/// up.remove("eth0").unwrap();
/// assert!(up.is_empty());
/// ```
#[derive(Clone)]
pub struct HashSet<T, H> {
    map: HashMap<T, (), H>,
}

impl<T, H> PartialEq for HashSet<T, H>
where
    H: KeyHasher<T>,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|v| other.contains(v))
    }
}

impl<T, H> Eq for HashSet<T, H> where H: KeyHasher<T> {}

impl<T, H> Debug for HashSet<T, H>
where
    T: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, H> HashSet<T, H> {
    /// Creates an empty set using the given key policy.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::HashSet;
    /// # use cellar_hash::key_hash::IdentityHash;
    /// #
    /// let set: HashSet<u16, _> = HashSet::with_hasher(IdentityHash);
    /// assert!(set.is_empty());
    /// ```
    pub fn with_hasher(key_hasher: H) -> Self {
        Self {
            map: HashMap::with_hasher(key_hasher),
        }
    }

    /// Creates an empty set with at least `capacity` slots, using the given
    /// key policy.
    pub fn with_capacity_and_hasher(capacity: usize, key_hasher: H) -> Self {
        Self {
            map: HashMap::with_capacity_and_hasher(capacity, key_hasher),
        }
    }

    /// Returns the number of elements in the set.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the set contains no elements.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the slot count of the underlying table.
    pub fn capacity(&self) -> usize {
        self.map.capacity()
    }

    /// Removes all elements, returning the table to its default size.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Returns an iterator over the elements. Order is unspecified.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.map.keys(),
        }
    }

    /// Removes every element and returns them as an iterator.
    pub fn drain(&mut self) -> Drain<'_, T> {
        Drain {
            inner: self.map.drain(),
        }
    }

    /// Copies every element into a detached [`Snapshot`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::IntHashSet;
    /// #
    /// let mut set = IntHashSet::new();
    /// set.insert(4).unwrap();
    /// let items = set.items();
    /// set.clear();
    /// assert_eq!(items.item(0), Ok(&4));
    /// ```
    pub fn items(&self) -> Snapshot<T>
    where
        T: Clone,
    {
        self.map.snapshot_keys()
    }

    /// Returns occupancy and chain statistics for the underlying table.
    ///
    /// Available in tests and with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn stats(&self) -> crate::hash_table::TableStats {
        self.map.stats()
    }

    /// Returns `true` if the set holds `value`.
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
    {
        self.map.contains_key(value)
    }

    /// Returns the stored element equal to `value`.
    pub fn get<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
    {
        self.map.get_key_value(value).map(|(k, _)| k)
    }

    /// Removes `value` from the set.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NotFound`](crate::Error::NotFound) if it was not
    /// present.
    pub fn remove<Q>(&mut self, value: &Q) -> Result<()>
    where
        T: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
    {
        self.take(value).map(|_| ())
    }

    /// Removes and returns the stored element equal to `value`.
    pub fn take<Q>(&mut self, value: &Q) -> Result<T>
    where
        T: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
    {
        self.map.remove_entry(value).map(|(k, _)| k)
    }
}

impl<T, H> HashSet<T, H>
where
    H: KeyHasher<T>,
{
    /// Adds `value` to the set, returning `true` if it was not already
    /// present. An existing equal element is kept.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Internal`](crate::Error::Internal) only if the
    /// table could not find a slot.
    pub fn insert(&mut self, value: T) -> Result<bool> {
        self.map.insert(value, ()).map(|old| old.is_none())
    }

    /// Returns `true` if the two sets share no element.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::IntHashSet;
    /// #
    /// let a: IntHashSet = [1, 2, 3].into_iter().collect();
    /// let b: IntHashSet = [4, 5].into_iter().collect();
    /// assert!(a.is_disjoint(&b));
    /// ```
    pub fn is_disjoint(&self, other: &HashSet<T, H>) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().all(|v| !large.contains(v))
    }

    /// Returns `true` if every element of `self` is in `other`.
    pub fn is_subset(&self, other: &HashSet<T, H>) -> bool {
        if self.len() > other.len() {
            return false;
        }
        self.iter().all(|v| other.contains(v))
    }

    /// Returns `true` if every element of `other` is in `self`.
    pub fn is_superset(&self, other: &HashSet<T, H>) -> bool {
        other.is_subset(self)
    }
}

impl<T, H> HashSet<T, H>
where
    H: Default,
{
    /// Creates an empty set using the default key policy.
    pub fn new() -> Self {
        Self::with_hasher(H::default())
    }

    /// Creates an empty set with at least `capacity` slots, using the default
    /// key policy.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, H::default())
    }
}

impl<T, H> Default for HashSet<T, H>
where
    H: Default,
{
    fn default() -> Self {
        Self::new()
    }
}

/// An iterator over the elements of a `HashSet`.
pub struct Iter<'a, T> {
    inner: hash_map::Keys<'a, T, ()>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

/// A draining iterator over the elements of a `HashSet`.
pub struct Drain<'a, T> {
    inner: hash_map::Drain<'a, T, ()>,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Drain<'_, T> {}

/// An owning iterator over the elements of a `HashSet`.
pub struct IntoIter<T> {
    inner: hash_map::IntoIter<T, ()>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T, H> IntoIterator for HashSet<T, H> {
    type IntoIter = IntoIter<T>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.map.into_iter(),
        }
    }
}

impl<'a, T, H> IntoIterator for &'a HashSet<T, H> {
    type IntoIter = Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, H> FromIterator<T> for HashSet<T, H>
where
    H: KeyHasher<T> + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<T, H> Extend<T> for HashSet<T, H>
where
    H: KeyHasher<T>,
{
    /// # Panics
    ///
    /// Panics if the table reports [`Error::Internal`](crate::Error::Internal).
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.map.extend(iter.into_iter().map(|v| (v, ())));
    }
}
