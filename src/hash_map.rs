use alloc::string::String;
use core::borrow::Borrow;
use core::fmt::Debug;

use crate::error::Result;
use crate::hash_table::Entry as TableEntry;
use crate::hash_table::HashTable;
#[cfg(feature = "foldhash")]
use crate::key_hash::FoldHash;
use crate::key_hash::Djb2;
use crate::key_hash::IdentityHash;
use crate::key_hash::KeyHasher;
use crate::snapshot::Snapshot;

/// A map with string keys hashed by [`Djb2`].
///
/// Keys are owned copies; lookups take `&str`.
pub type StrHashMap<V> = HashMap<String, V, Djb2>;

/// A map with `i32` keys hashed by [`IdentityHash`].
pub type IntHashMap<V> = HashMap<i32, V, IdentityHash>;

/// A map over any `Hash + Eq` key, hashed by [`FoldHash`].
#[cfg(feature = "foldhash")]
pub type FoldHashMap<K, V> = HashMap<K, V, FoldHash>;

/// A hash map backed by the coalesced [`HashTable`].
///
/// `HashMap<K, V, H>` stores `(K, V)` pairs and uses the key policy `H` to
/// hash and compare keys. Inserting an existing key replaces its value in
/// place; the map never holds two equal keys.
///
/// Operations that may allocate or move elements report failure through
/// [`Result`]: insertion and removal both apply the table's resize policy.
///
/// # Examples
///
/// ```rust
/// use cellar_hash::IntHashMap;
///
/// let mut map = IntHashMap::new();
/// map.insert(0, 3).unwrap();
/// map.insert(1, 4).unwrap();
/// map.insert(2, 5).unwrap();
/// assert_eq!(map.len(), 3);
///
/// assert_eq!(map.remove(&1), Ok(4));
/// assert!(!map.contains_key(&1));
/// assert_eq!(map.get(&0), Some(&3));
/// assert_eq!(map.get(&2), Some(&5));
/// ```
#[derive(Clone)]
pub struct HashMap<K, V, H> {
    table: HashTable<(K, V)>,
    key_hasher: H,
}

impl<K, V, H> Debug for HashMap<K, V, H>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in self.iter() {
            map.entry(k, v);
        }
        map.finish()
    }
}

impl<K, V, H> HashMap<K, V, H> {
    /// Creates an empty map using the given key policy.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::HashMap;
    /// # use cellar_hash::key_hash::IdentityHash;
    /// #
    /// let map: HashMap<u64, String, _> = HashMap::with_hasher(IdentityHash);
    /// assert!(map.is_empty());
    /// ```
    pub fn with_hasher(key_hasher: H) -> Self {
        Self {
            table: HashTable::new(),
            key_hasher,
        }
    }

    /// Creates an empty map with at least `capacity` slots, using the given
    /// key policy.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::HashMap;
    /// # use cellar_hash::key_hash::IdentityHash;
    /// #
    /// let map: HashMap<u64, String, _> = HashMap::with_capacity_and_hasher(100, IdentityHash);
    /// assert_eq!(map.capacity(), 128);
    /// ```
    pub fn with_capacity_and_hasher(capacity: usize, key_hasher: H) -> Self {
        Self {
            table: HashTable::with_capacity(capacity),
            key_hasher,
        }
    }

    /// Returns the key policy.
    pub fn hasher(&self) -> &H {
        &self.key_hasher
    }

    /// Returns the number of entries in the map.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the slot count of the underlying table.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Removes all entries, returning the table to its default size.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::StrHashMap;
    /// #
    /// let mut map = StrHashMap::new();
    /// map.insert("lo".to_string(), 65536).unwrap();
    /// map.clear();
    /// assert!(map.is_empty());
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Returns an iterator over the entries. Order is unspecified.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::IntHashMap;
    /// #
    /// let mut map = IntHashMap::new();
    /// map.insert(1, "a").unwrap();
    /// map.insert(2, "b").unwrap();
    ///
    /// for (key, value) in map.iter() {
    ///     println!("{key}: {value}");
    /// }
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the entries with mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.table.iter_mut(),
        }
    }

    /// Returns an iterator over the keys.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns an iterator over mutable references to the values.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Removes every entry and returns them as an iterator.
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        Drain {
            inner: self.table.drain(),
        }
    }

    /// Copies every key into a detached [`Snapshot`].
    ///
    /// The snapshot stays valid after any later change to the map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::StrHashMap;
    /// #
    /// let mut map = StrHashMap::new();
    /// map.insert("eth0".to_string(), 1500).unwrap();
    /// map.insert("eth1".to_string(), 9000).unwrap();
    ///
    /// let mut names = map.snapshot_keys().into_vec();
    /// names.sort();
    /// assert_eq!(names, ["eth0", "eth1"]);
    /// ```
    pub fn snapshot_keys(&self) -> Snapshot<K>
    where
        K: Clone,
    {
        self.keys().cloned().collect()
    }

    /// Copies every value into a detached [`Snapshot`].
    pub fn snapshot_values(&self) -> Snapshot<V>
    where
        V: Clone,
    {
        self.values().cloned().collect()
    }

    /// Returns occupancy and chain statistics for the underlying table.
    ///
    /// Available in tests and with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn stats(&self) -> crate::hash_table::TableStats {
        self.table.stats()
    }

    /// Returns a reference to the value for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::StrHashMap;
    /// #
    /// let mut map = StrHashMap::new();
    /// map.insert("eth0".to_string(), 1500).unwrap();
    /// assert_eq!(map.get("eth0"), Some(&1500));
    /// assert_eq!(map.get("eth1"), None);
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Returns the stored key and its value.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
    {
        let hash = self.key_hasher.hash_key(key);
        self.table
            .find(hash, |(k, _)| self.key_hasher.key_eq(k.borrow(), key))
            .map(|(k, v)| (k, v))
    }

    /// Returns a mutable reference to the value for `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
    {
        let hash = self.key_hasher.hash_key(key);
        let key_hasher = &self.key_hasher;
        self.table
            .find_mut(hash, |(k, _)| key_hasher.key_eq(k.borrow(), key))
            .map(|(_, v)| v)
    }

    /// Returns `true` if the map holds `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
    {
        let hash = self.key_hasher.hash_key(key);
        self.table
            .contains(hash, |(k, _)| self.key_hasher.key_eq(k.borrow(), key))
    }

    /// Removes `key` and returns its value.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NotFound`](crate::Error::NotFound) if the key is
    /// absent; the map is unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::Error;
    /// # use cellar_hash::IntHashMap;
    /// #
    /// let mut map = IntHashMap::new();
    /// map.insert(1, "a").unwrap();
    /// assert_eq!(map.remove(&1), Ok("a"));
    /// assert_eq!(map.remove(&1), Err(Error::NotFound));
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes `key` and returns the stored key together with its value.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Result<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        H: KeyHasher<Q>,
    {
        let hash = self.key_hasher.hash_key(key);
        let key_hasher = &self.key_hasher;
        self.table
            .remove(hash, |(k, _)| key_hasher.key_eq(k.borrow(), key))
    }
}

impl<K, V, H> HashMap<K, V, H>
where
    H: KeyHasher<K>,
{
    /// Inserts `value` under `key`, returning the previous value if the key
    /// was present.
    ///
    /// A present key keeps its stored key and slot; only the value changes.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Internal`](crate::Error::Internal) only if the
    /// table could not find a slot, which its resize policy rules out.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::IntHashMap;
    /// #
    /// let mut map = IntHashMap::new();
    /// assert_eq!(map.insert(37, "a"), Ok(None));
    /// assert_eq!(map.insert(37, "b"), Ok(Some("a")));
    /// assert_eq!(map.get(&37), Some(&"b"));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        let hash = self.key_hasher.hash_key(&key);
        let key_hasher = &self.key_hasher;
        match self.table.entry(hash, |(k, _)| key_hasher.key_eq(k, &key)) {
            TableEntry::Occupied(mut entry) => {
                let old_value = core::mem::replace(&mut entry.get_mut().1, value);
                Ok(Some(old_value))
            }
            TableEntry::Vacant(entry) => {
                entry.insert((key, value))?;
                Ok(None)
            }
        }
    }

    /// Gets the entry for `key` for in-place manipulation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::StrHashMap;
    /// #
    /// let mut degree = StrHashMap::new();
    /// for node in ["a", "b", "a"] {
    ///     *degree.entry(node.to_string()).or_insert(0).unwrap() += 1;
    /// }
    /// assert_eq!(degree.get("a"), Some(&2));
    /// assert_eq!(degree.get("b"), Some(&1));
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V> {
        let hash = self.key_hasher.hash_key(&key);
        let key_hasher = &self.key_hasher;
        match self.table.entry(hash, |(k, _)| key_hasher.key_eq(k, &key)) {
            TableEntry::Occupied(entry) => Entry::Occupied(OccupiedEntry { entry }),
            TableEntry::Vacant(entry) => Entry::Vacant(VacantEntry { entry, key }),
        }
    }
}

impl<K, V, H> HashMap<K, V, H>
where
    H: Default,
{
    /// Creates an empty map using the default key policy.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::IntHashMap;
    /// #
    /// let map: IntHashMap<String> = IntHashMap::new();
    /// assert_eq!(map.capacity(), 16);
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(H::default())
    }

    /// Creates an empty map with at least `capacity` slots, using the default
    /// key policy.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, H::default())
    }
}

impl<K, V, H> Default for HashMap<K, V, H>
where
    H: Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, H> Extend<(K, V)> for HashMap<K, V, H>
where
    H: KeyHasher<K>,
{
    /// Inserts every pair, later pairs replacing earlier values for equal
    /// keys.
    ///
    /// # Panics
    ///
    /// Panics if the table reports [`Error::Internal`](crate::Error::Internal).
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            if let Err(err) = self.insert(key, value) {
                panic!("{err}");
            }
        }
    }
}

impl<K, V, H> FromIterator<(K, V)> for HashMap<K, V, H>
where
    H: KeyHasher<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K, V, H> IntoIterator for HashMap<K, V, H> {
    type IntoIter = IntoIter<K, V>;
    type Item = (K, V);

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

impl<'a, K, V, H> IntoIterator for &'a HashMap<K, V, H> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, H> IntoIterator for &'a mut HashMap<K, V, H> {
    type IntoIter = IterMut<'a, K, V>;
    type Item = (&'a K, &'a mut V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// A view into a single entry in the map, which may either be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashMap`].
///
/// [`entry`]: HashMap::entry
pub enum Entry<'a, K, V> {
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V>),
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V>),
}

impl<'a, K, V> Entry<'a, K, V> {
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_insert(self, default: V) -> Result<&'a mut V> {
        match self {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant and returns a
    /// mutable reference to the value.
    pub fn or_insert_with<F>(self, default: F) -> Result<&'a mut V>
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns a reference to this entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, K, V> Entry<'a, K, V>
where
    V: Default,
{
    /// Inserts the default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_default(self) -> Result<&'a mut V> {
        self.or_insert_with(Default::default)
    }
}

/// A view into a vacant entry in the map.
pub struct VacantEntry<'a, K, V> {
    entry: crate::hash_table::VacantEntry<'a, (K, V)>,
    key: K,
}

impl<'a, K, V> VacantEntry<'a, K, V> {
    /// Gets a reference to the key that would be used when inserting a value.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Take ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts the value into the map and returns a mutable reference to it.
    pub fn insert(self, value: V) -> Result<&'a mut V> {
        let pair = self.entry.insert((self.key, value))?;
        Ok(&mut pair.1)
    }
}

/// A view into an occupied entry in the map.
pub struct OccupiedEntry<'a, K, V> {
    entry: crate::hash_table::OccupiedEntry<'a, (K, V)>,
}

impl<'a, K, V> OccupiedEntry<'a, K, V> {
    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> &K {
        &self.entry.get().0
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.entry.get().1
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.entry.get_mut().1
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut V {
        &mut self.entry.into_mut().1
    }

    /// Replaces the value and returns the old one.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(&mut self.entry.get_mut().1, value)
    }

    /// Removes the entry from the map and returns the value.
    pub fn remove(self) -> Result<V> {
        self.entry.remove().map(|(_, v)| v)
    }

    /// Removes the entry from the map and returns the key and value.
    pub fn remove_entry(self) -> Result<(K, V)> {
        self.entry.remove()
    }
}

/// An iterator over the entries of a `HashMap`.
pub struct Iter<'a, K, V> {
    inner: crate::hash_table::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// An iterator over the entries of a `HashMap` with mutable values.
pub struct IterMut<'a, K, V> {
    inner: crate::hash_table::IterMut<'a, (K, V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (&*k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

/// An iterator over the keys of a `HashMap`.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

/// An iterator over the values of a `HashMap`.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

/// A mutable iterator over the values of a `HashMap`.
pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

/// A draining iterator over the entries of a `HashMap`.
pub struct Drain<'a, K, V> {
    inner: crate::hash_table::Drain<'a, (K, V)>,
}

impl<K, V> Iterator for Drain<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Drain<'_, K, V> {}

/// An owning iterator over the entries of a `HashMap`.
pub struct IntoIter<K, V> {
    inner: crate::hash_table::IntoIter<(K, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
