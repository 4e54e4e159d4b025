use alloc::vec::Vec;
use core::alloc::Layout;
use core::fmt::Debug;
use core::marker::PhantomData;
use core::mem;
use core::ops::Range;

use tracing::debug;
use tracing::error;
use tracing::trace;

use crate::error::Error;
use crate::error::Result;

cfg_if::cfg_if! {
    if #[cfg(feature = "cellar-eight-percent")] {
        /// Share of the slot array, in percent, reserved as the cellar.
        pub const CELLAR_PERCENT: usize = 8;
    } else if #[cfg(feature = "cellar-twenty-percent")] {
        /// Share of the slot array, in percent, reserved as the cellar.
        pub const CELLAR_PERCENT: usize = 20;
    } else {
        /// Share of the slot array, in percent, reserved as the cellar.
        pub const CELLAR_PERCENT: usize = 14;
    }
}

/// Slot count of a table built with [`HashTable::new`]. Tables never shrink
/// below this size.
pub const DEFAULT_CAPACITY: usize = 16;

/// Smallest slot count [`HashTable::with_capacity`] will allocate.
pub const MIN_CAPACITY: usize = 4;

#[inline(always)]
fn cellar_start(capacity: usize) -> usize {
    capacity - ((capacity as u128 * CELLAR_PERCENT as u128) / 100) as usize
}

#[derive(Clone)]
struct Slot<T> {
    value: Option<T>,
    hash: u64,
    next: Option<usize>,
    prev: Option<usize>,
}

impl<T> Slot<T> {
    fn vacant() -> Self {
        Self {
            value: None,
            hash: 0,
            next: None,
            prev: None,
        }
    }

    #[inline(always)]
    fn is_occupied(&self) -> bool {
        self.value.is_some()
    }

    /// Vacant and not part of any chain.
    #[inline(always)]
    fn is_detached(&self) -> bool {
        self.value.is_none() && self.next.is_none() && self.prev.is_none()
    }
}

fn vacant_slots<T>(capacity: usize) -> Vec<Slot<T>> {
    core::iter::repeat_with(Slot::vacant).take(capacity).collect()
}

/// Occupancy and chain statistics for a [`HashTable`].
///
/// Available in tests and with the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone, PartialEq)]
pub struct TableStats {
    /// Number of elements currently in the table
    pub populated: usize,
    /// Total number of slots
    pub capacity: usize,
    /// Index of the first cellar slot
    pub cellar_start: usize,
    /// Occupied slots in the addressable region
    pub home_occupied: usize,
    /// Occupied slots in the cellar
    pub cellar_occupied: usize,
    /// Elements stored somewhere other than their home slot
    pub displaced: usize,
    /// Vacant slots kept in a chain so later elements stay reachable
    pub pass_through: usize,
    /// Most slots visited by a successful lookup
    pub longest_probe: usize,
    /// populated / capacity
    pub load_factor: f64,
}

#[cfg(any(test, feature = "stats"))]
impl TableStats {
    /// Pretty-print the statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Cellar Table Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.populated,
            self.capacity,
            self.load_factor * 100.0
        );
        println!(
            "Regions: {} addressable slots ({} occupied), {} cellar slots ({} occupied)",
            self.cellar_start,
            self.home_occupied,
            self.capacity - self.cellar_start,
            self.cellar_occupied
        );
        println!(
            "Chains: {} displaced, {} pass-through, longest probe {}",
            self.displaced, self.pass_through, self.longest_probe
        );
    }
}

/// A hash table using coalesced hashing with a cellar.
///
/// `HashTable<T>` stores values of type `T` in a single slot array. The first
/// `cellar_start()` slots are addressable: a value with hash `h` has its home
/// at `h % cellar_start()`. The remaining slots form the cellar, which only
/// ever holds values displaced from an occupied home. Values whose homes
/// collide are threaded into a chain starting at the home slot, and chains
/// from different homes may merge.
///
/// The table never hashes anything itself. Every operation takes the hash of
/// the key and an equality predicate, and [`HashMap`](crate::HashMap) supplies
/// both from its key policy.
///
/// The slot count is always a power of two. The table doubles when an
/// insertion would bring it to half full and halves whenever it drops to a
/// quarter full, but never below [`DEFAULT_CAPACITY`].
///
/// ## Example
///
/// ```rust
/// # use cellar_hash::hash_table::Entry;
/// # use cellar_hash::hash_table::HashTable;
/// # use cellar_hash::key_hash::djb2;
/// #
/// # #[derive(Debug, PartialEq)]
/// # struct Link {
/// #     name: String,
/// #     mtu: u32,
/// # }
/// #
/// let mut table = HashTable::new();
/// let hash = djb2(b"eth0") as u64;
///
/// match table.entry(hash, |l: &Link| l.name == "eth0") {
///     Entry::Vacant(entry) => {
///         entry
///             .insert(Link {
///                 name: "eth0".to_string(),
///                 mtu: 1500,
///             })
///             .unwrap();
///     }
///     Entry::Occupied(_) => unreachable!(),
/// }
///
/// assert_eq!(table.find(hash, |l| l.name == "eth0").map(|l| l.mtu), Some(1500));
/// ```
#[derive(Clone)]
pub struct HashTable<T> {
    slots: Vec<Slot<T>>,
    cellar_start: usize,
    populated: usize,
}

impl<T: Debug> Debug for HashTable<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let chains = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| !slot.is_detached())
            .map(|(index, slot)| match (&slot.value, slot.next) {
                (Some(value), Some(next)) => alloc::format!("{index:>4}: {value:?} -> {next}"),
                (Some(value), None) => alloc::format!("{index:>4}: {value:?}"),
                (None, Some(next)) => alloc::format!("{index:>4}: <vacant> -> {next}"),
                (None, None) => alloc::format!("{index:>4}: <vacant>"),
            })
            .collect::<Vec<_>>();

        f.debug_struct("HashTable")
            .field("populated", &self.populated)
            .field("capacity", &self.slots.len())
            .field("cellar_start", &self.cellar_start)
            .field("chains", &chains)
            .finish()
    }
}

impl<T> Default for HashTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HashTable<T> {
    /// Creates an empty table with [`DEFAULT_CAPACITY`] slots.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<u32> = HashTable::new();
    /// assert_eq!(table.capacity(), 16);
    /// assert_eq!(table.cellar_start(), 14);
    /// ```
    pub fn new() -> Self {
        Self::allocate(DEFAULT_CAPACITY)
    }

    /// Creates an empty table with room for at least `capacity` slots.
    ///
    /// The slot count is rounded up to a power of two, and is at least
    /// [`MIN_CAPACITY`]. The first insertion applies the resize policy, so a
    /// generously sized empty table keeps its size only while it stays at
    /// least a quarter full.
    ///
    /// # Panics
    ///
    /// Panics if the slot array cannot be addressed. See
    /// [`try_with_capacity`](Self::try_with_capacity) for a fallible version.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<String> = HashTable::with_capacity(100);
    /// assert_eq!(table.capacity(), 128);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::try_with_capacity(capacity).expect("allocation size overflow")
    }

    /// Creates an empty table with room for at least `capacity` slots,
    /// failing with [`Error::InvalidArgument`] if that many slots cannot be
    /// addressed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::Error;
    /// # use cellar_hash::hash_table::HashTable;
    /// #
    /// assert!(HashTable::<u64>::try_with_capacity(1000).is_ok());
    /// assert!(matches!(
    ///     HashTable::<u64>::try_with_capacity(usize::MAX),
    ///     Err(Error::InvalidArgument(_))
    /// ));
    /// ```
    pub fn try_with_capacity(capacity: usize) -> Result<Self> {
        let capacity = capacity
            .max(MIN_CAPACITY)
            .checked_next_power_of_two()
            .ok_or(Error::InvalidArgument("capacity overflows usize"))?;
        Layout::array::<Slot<T>>(capacity)
            .map_err(|_| Error::InvalidArgument("capacity exceeds the address space"))?;

        Ok(Self::allocate(capacity))
    }

    fn allocate(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two());
        Self {
            slots: vacant_slots(capacity),
            cellar_start: cellar_start(capacity),
            populated: 0,
        }
    }

    /// Returns the number of elements in the table.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.upsert(7, |&v: &u64| v == 7, 7).unwrap();
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table contains no elements.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the total number of slots, addressable region and cellar
    /// combined.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of addressable slots, which is also the index of
    /// the first cellar slot.
    pub fn cellar_start(&self) -> usize {
        self.cellar_start
    }

    #[inline(always)]
    fn home(&self, hash: u64) -> usize {
        (hash % self.cellar_start as u64) as usize
    }

    /// Walks the chain from the home slot of `hash`. Vacant slots are passed
    /// through.
    fn search(&self, hash: u64, eq: impl Fn(&T) -> bool) -> Option<usize> {
        let mut cursor = Some(self.home(hash));
        while let Some(index) = cursor {
            let slot = &self.slots[index];
            if let Some(value) = &slot.value {
                if slot.hash == hash && eq(value) {
                    return Some(index);
                }
            }
            cursor = slot.next;
        }

        None
    }

    /// Finds a value by hash and equality predicate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.upsert(42, |&v: &u64| v == 42, 42).unwrap();
    ///
    /// assert_eq!(table.find(42, |&v| v == 42), Some(&42));
    /// assert_eq!(table.find(43, |&v| v == 43), None);
    /// ```
    pub fn find(&self, hash: u64, eq: impl Fn(&T) -> bool) -> Option<&T> {
        let index = self.search(hash, eq)?;
        self.slots[index].value.as_ref()
    }

    /// Finds a value by hash and equality predicate, returning a mutable
    /// reference.
    ///
    /// The part of the value that `eq` and `hash` were derived from must not
    /// be changed through this reference.
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&T) -> bool) -> Option<&mut T> {
        let index = self.search(hash, eq)?;
        self.slots[index].value.as_mut()
    }

    /// Returns `true` if a value matching `hash` and `eq` is present.
    pub fn contains(&self, hash: u64, eq: impl Fn(&T) -> bool) -> bool {
        self.search(hash, eq).is_some()
    }

    /// Gets the entry for the given hash and equality predicate.
    ///
    /// Looking up an entry never moves anything; inserting through a
    /// [`VacantEntry`] or removing through an [`OccupiedEntry`] applies the
    /// resize policy.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::hash_table::Entry;
    /// # use cellar_hash::hash_table::HashTable;
    /// # use cellar_hash::key_hash::djb2;
    /// #
    /// let mut table = HashTable::new();
    /// let hash = djb2(b"hello") as u64;
    ///
    /// match table.entry(hash, |s: &String| s == "hello") {
    ///     Entry::Vacant(entry) => {
    ///         entry.insert("hello".to_string()).unwrap();
    ///     }
    ///     Entry::Occupied(_) => unreachable!(),
    /// }
    ///
    /// // Or use the convenience method
    /// table
    ///     .entry(hash, |s: &String| s == "hello")
    ///     .or_insert("ignored".to_string())
    ///     .unwrap();
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn entry(&mut self, hash: u64, eq: impl Fn(&T) -> bool) -> Entry<'_, T> {
        match self.search(hash, eq) {
            Some(index) => Entry::Occupied(OccupiedEntry { table: self, index }),
            None => Entry::Vacant(VacantEntry { table: self, hash }),
        }
    }

    /// Inserts `value`, replacing the value matching `hash` and `eq` if one is
    /// present.
    ///
    /// A replacement keeps the stored position and returns the old value. A
    /// new value may resize the table first.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Internal`] only if no slot could be found for a new
    /// value, which the resize policy rules out.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// assert_eq!(table.upsert(1, |&(k, _): &(u8, u8)| k == 1, (1, 10)), Ok(None));
    /// assert_eq!(table.upsert(1, |&(k, _)| k == 1, (1, 20)), Ok(Some((1, 10))));
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn upsert(&mut self, hash: u64, eq: impl Fn(&T) -> bool, value: T) -> Result<Option<T>> {
        match self.entry(hash, eq) {
            Entry::Occupied(mut entry) => Ok(Some(entry.insert(value))),
            Entry::Vacant(entry) => {
                entry.insert(value)?;
                Ok(None)
            }
        }
    }

    /// Removes and returns the value matching `hash` and `eq`.
    ///
    /// The table may shrink afterwards.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NotFound`] if no value matches. The table is left
    /// untouched in that case.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::Error;
    /// # use cellar_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// table.upsert(42, |&n: &u64| n == 42, 42).unwrap();
    ///
    /// assert_eq!(table.remove(42, |&n| n == 42), Ok(42));
    /// assert_eq!(table.remove(42, |&n| n == 42), Err(Error::NotFound));
    /// assert!(table.is_empty());
    /// ```
    pub fn remove(&mut self, hash: u64, eq: impl Fn(&T) -> bool) -> Result<T> {
        let index = self.search(hash, eq).ok_or(Error::NotFound)?;
        self.remove_at(index)
    }

    /// Removes all elements and returns the table to at most
    /// [`DEFAULT_CAPACITY`] slots.
    pub fn clear(&mut self) {
        let capacity = self.capacity().min(DEFAULT_CAPACITY);
        *self = Self::allocate(capacity);
    }

    /// Returns an iterator over all values, in slot order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// for n in 0..5u64 {
    ///     table.upsert(n, |&v: &u64| v == n, n).unwrap();
    /// }
    ///
    /// let mut values: Vec<u64> = table.iter().copied().collect();
    /// values.sort();
    /// assert_eq!(values, [0, 1, 2, 3, 4]);
    /// ```
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            slots: self.slots.iter(),
            remaining: self.populated,
        }
    }

    /// Returns an iterator over mutable references to all values.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            slots: self.slots.iter_mut(),
            remaining: self.populated,
        }
    }

    /// Removes every value and returns them as an iterator.
    ///
    /// The table is empty, and back to at most [`DEFAULT_CAPACITY`] slots, as
    /// soon as this returns. Values not consumed from the iterator are
    /// dropped with it.
    pub fn drain(&mut self) -> Drain<'_, T> {
        let capacity = self.capacity().min(DEFAULT_CAPACITY);
        let drained = mem::replace(self, Self::allocate(capacity));
        Drain {
            inner: drained.into_iter(),
            _table: PhantomData,
        }
    }

    /// Places a value known to be absent and returns a reference to it.
    fn insert_unique(&mut self, hash: u64, value: T) -> Result<&mut T> {
        let target = self.settled_capacity(self.populated + 1);
        if target != self.capacity() {
            self.rehash(target)?;
        }

        let home = self.home(hash);
        let index = match self.claim(home) {
            Some(index) => index,
            None => {
                debug!(
                    capacity = self.capacity(),
                    populated = self.populated,
                    "no detached slot left, rebuilding chains"
                );
                self.rehash(self.capacity())?;
                let home = self.home(hash);
                self.claim(home)
                    .ok_or_else(|| self.invariant_violation("no free slot after rebuilding chains"))?
            }
        };

        Ok(self.occupy(index, hash, value))
    }

    /// Picks the slot a new value homed at `home` goes into and links it into
    /// the chain. Returns `None` when every vacant slot still belongs to a
    /// chain.
    fn claim(&mut self, home: usize) -> Option<usize> {
        if !self.slots[home].is_occupied() {
            return Some(home);
        }

        let free = match self.first_detached(self.cellar_start..self.capacity()) {
            Some(index) => index,
            None => {
                trace!(
                    home,
                    capacity = self.capacity(),
                    "cellar exhausted, scanning the addressable region"
                );
                self.first_detached(0..self.cellar_start)?
            }
        };

        self.link_after(home, free);
        Some(free)
    }

    fn first_detached(&self, mut range: Range<usize>) -> Option<usize> {
        range.find(|&index| self.slots[index].is_detached())
    }

    fn link_after(&mut self, anchor: usize, index: usize) {
        let next = self.slots[anchor].next;
        if let Some(next) = next {
            self.slots[next].prev = Some(index);
        }

        let slot = &mut self.slots[index];
        slot.prev = Some(anchor);
        slot.next = next;
        self.slots[anchor].next = Some(index);
    }

    fn unlink(&mut self, index: usize) {
        let slot = &mut self.slots[index];
        let prev = slot.prev.take();
        let next = slot.next.take();

        if let Some(prev) = prev {
            self.slots[prev].next = next;
        }
        if let Some(next) = next {
            self.slots[next].prev = prev;
        }
    }

    fn occupy(&mut self, index: usize, hash: u64, value: T) -> &mut T {
        let slot = &mut self.slots[index];
        debug_assert!(!slot.is_occupied());
        slot.hash = hash;
        self.populated += 1;
        slot.value.insert(value)
    }

    /// Takes the value out of `index` and detaches the slot unless it has to
    /// stay in its chain as a pass-through.
    fn vacate(&mut self, index: usize) -> Option<T> {
        let value = self.slots[index].value.take()?;
        self.populated -= 1;

        if index >= self.cellar_start || !self.anchors_successor(index) {
            self.unlink(index);
        }

        Some(value)
    }

    /// Returns `true` if some value later in the chain has its home at
    /// `index`.
    fn anchors_successor(&self, index: usize) -> bool {
        let mut cursor = self.slots[index].next;
        while let Some(next) = cursor {
            let slot = &self.slots[next];
            if slot.is_occupied() && self.home(slot.hash) == index {
                return true;
            }
            cursor = slot.next;
        }

        false
    }

    fn remove_at(&mut self, index: usize) -> Result<T> {
        let value = self.vacate(index).ok_or(Error::NotFound)?;

        let target = self.settled_capacity(self.populated);
        if target != self.capacity() {
            self.rehash(target)?;
        }

        Ok(value)
    }

    /// The slot count the table should have when holding `populated` values.
    fn settled_capacity(&self, populated: usize) -> usize {
        let mut capacity = self.capacity();
        if populated >= capacity / 2 {
            return capacity * 2;
        }

        while capacity > DEFAULT_CAPACITY && populated <= capacity / 4 {
            capacity /= 2;
        }

        capacity
    }

    /// Moves every value into a fresh slot array of `capacity` slots,
    /// re-placing each one from its stored hash.
    fn rehash(&mut self, capacity: usize) -> Result<()> {
        debug!(
            from = self.capacity(),
            to = capacity,
            populated = self.populated,
            "resizing table"
        );

        let old = mem::replace(&mut self.slots, vacant_slots(capacity));
        self.cellar_start = cellar_start(capacity);
        self.populated = 0;

        for slot in old {
            if let Some(value) = slot.value {
                let home = self.home(slot.hash);
                let index = self
                    .claim(home)
                    .ok_or_else(|| self.invariant_violation("no free slot while rehashing"))?;
                self.occupy(index, slot.hash, value);
            }
        }

        Ok(())
    }

    #[cold]
    #[inline(never)]
    fn invariant_violation(&self, what: &'static str) -> Error {
        error!(
            capacity = self.capacity(),
            populated = self.populated,
            cellar_start = self.cellar_start,
            "{what}"
        );
        debug_assert!(false, "{what}");
        Error::Internal(what)
    }

    fn occupied(&self, index: usize) -> &T {
        match &self.slots[index].value {
            Some(value) => value,
            None => unreachable!("entry points at vacant slot {index}"),
        }
    }

    fn occupied_mut(&mut self, index: usize) -> &mut T {
        match &mut self.slots[index].value {
            Some(value) => value,
            None => unreachable!("entry points at vacant slot {index}"),
        }
    }

    /// Returns a histogram of successful-lookup lengths: entry `n` counts the
    /// values found after following `n` links from their home slot.
    ///
    /// Available in tests and with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn probe_histogram(&self) -> Vec<usize> {
        let mut hist = Vec::new();
        for (index, slot) in self.slots.iter().enumerate() {
            if !slot.is_occupied() {
                continue;
            }

            let mut hops = 0;
            let mut cursor = self.home(slot.hash);
            while cursor != index {
                match self.slots[cursor].next {
                    Some(next) => cursor = next,
                    None => break,
                }
                hops += 1;
            }

            if hist.len() <= hops {
                hist.resize(hops + 1, 0);
            }
            hist[hops] += 1;
        }

        hist
    }

    /// Returns occupancy and chain statistics.
    ///
    /// Available in tests and with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn stats(&self) -> TableStats {
        let mut home_occupied = 0;
        let mut cellar_occupied = 0;
        let mut displaced = 0;
        let mut pass_through = 0;

        for (index, slot) in self.slots.iter().enumerate() {
            if slot.is_occupied() {
                if index < self.cellar_start {
                    home_occupied += 1;
                } else {
                    cellar_occupied += 1;
                }
                if self.home(slot.hash) != index {
                    displaced += 1;
                }
            } else if !slot.is_detached() {
                pass_through += 1;
            }
        }

        TableStats {
            populated: self.populated,
            capacity: self.capacity(),
            cellar_start: self.cellar_start,
            home_occupied,
            cellar_occupied,
            displaced,
            pass_through,
            longest_probe: self.probe_histogram().len(),
            load_factor: self.populated as f64 / self.capacity() as f64,
        }
    }

    /// Pretty-prints the probe histogram as a horizontal bar chart.
    ///
    /// Requires the `std` feature, and either tests or the `stats` feature.
    #[cfg(all(any(test, feature = "stats"), feature = "std"))]
    pub fn print_probe_histogram(&self) {
        let hist = self.probe_histogram();
        let max = hist.iter().copied().max().unwrap_or(0);
        if max == 0 {
            println!("probe histogram: empty");
            return;
        }

        const MAX_BAR: usize = 60;
        println!("probe histogram ({} entries):", self.populated);
        for (hops, &count) in hist.iter().enumerate() {
            let width = (count * MAX_BAR).div_ceil(max);
            println!("{hops:>3} | {} ({count})", "#".repeat(width));
        }
    }

    /// Checks every structural invariant of the slot array.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let capacity = self.capacity();
        assert!(capacity.is_power_of_two());
        assert_eq!(self.cellar_start, cellar_start(capacity));
        assert_eq!(
            self.slots.iter().filter(|slot| slot.is_occupied()).count(),
            self.populated
        );

        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(next) = slot.next {
                assert_eq!(self.slots[next].prev, Some(index), "broken back link at {next}");
            }
            if let Some(prev) = slot.prev {
                assert_eq!(self.slots[prev].next, Some(index));
            }
            if index >= self.cellar_start && !slot.is_occupied() {
                assert!(slot.is_detached(), "vacant cellar slot {index} is still linked");
            }
        }

        for (index, slot) in self.slots.iter().enumerate() {
            if !slot.is_occupied() {
                continue;
            }
            let mut cursor = Some(self.home(slot.hash));
            let mut steps = 0;
            while cursor != Some(index) {
                let at = cursor.unwrap_or_else(|| panic!("slot {index} unreachable from its home"));
                cursor = self.slots[at].next;
                steps += 1;
                assert!(steps <= capacity, "cycle in chain through slot {index}");
            }
        }
    }
}

/// A view into a single entry in the table, which may be vacant or occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, T> {
    /// The value is not present in the table
    Vacant(VacantEntry<'a, T>),
    /// The value is present in the table
    Occupied(OccupiedEntry<'a, T>),
}

impl<'a, T> Entry<'a, T> {
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the value in the entry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use cellar_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::new();
    /// *table.entry(5, |&(k, _): &(u64, u32)| k == 5).or_insert((5, 0)).unwrap() = (5, 9);
    /// assert_eq!(table.find(5, |&(k, _)| k == 5), Some(&(5, 9)));
    /// ```
    pub fn or_insert(self, default: T) -> Result<&'a mut T> {
        match self {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant and returns a
    /// mutable reference to the value in the entry.
    pub fn or_insert_with(self, default: impl FnOnce() -> T) -> Result<&'a mut T> {
        match self {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Calls `f` on the value if the entry is occupied, returning the entry
    /// for further chaining.
    pub fn and_modify(self, f: impl FnOnce(&mut T)) -> Self {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Inserts `T::default()` if the entry is vacant.
    pub fn or_default(self) -> Result<&'a mut T>
    where
        T: Default,
    {
        self.or_insert_with(T::default)
    }
}

/// A view into a vacant entry in a [`HashTable`].
///
/// Created by [`HashTable::entry`] when no value matched.
pub struct VacantEntry<'a, T> {
    table: &'a mut HashTable<T>,
    hash: u64,
}

impl<'a, T> VacantEntry<'a, T> {
    /// Inserts the value and returns a mutable reference to it.
    ///
    /// The table is resized first if the new value would bring it to half
    /// full, so the returned reference points at the value's final slot.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Internal`] only if no slot could be found.
    pub fn insert(self, value: T) -> Result<&'a mut T> {
        let Self { table, hash } = self;
        table.insert_unique(hash, value)
    }
}

/// A view into an occupied entry in a [`HashTable`].
///
/// Created by [`HashTable::entry`] when a value matched.
pub struct OccupiedEntry<'a, T> {
    table: &'a mut HashTable<T>,
    index: usize,
}

impl<'a, T> OccupiedEntry<'a, T> {
    /// Returns a reference to the value.
    pub fn get(&self) -> &T {
        self.table.occupied(self.index)
    }

    /// Returns a mutable reference to the value.
    pub fn get_mut(&mut self) -> &mut T {
        self.table.occupied_mut(self.index)
    }

    /// Converts the entry into a mutable reference bound to the table's
    /// lifetime.
    pub fn into_mut(self) -> &'a mut T {
        let Self { table, index } = self;
        table.occupied_mut(index)
    }

    /// Replaces the value in place and returns the old one.
    pub fn insert(&mut self, value: T) -> T {
        mem::replace(self.get_mut(), value)
    }

    /// Removes the value from the table and returns it.
    ///
    /// The table may shrink afterwards.
    pub fn remove(self) -> Result<T> {
        let Self { table, index } = self;
        table.remove_at(index)
    }
}

/// An iterator over the values in a [`HashTable`], in slot order.
pub struct Iter<'a, T> {
    slots: core::slice::Iter<'a, Slot<T>>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Some(value) = &slot.value {
                self.remaining -= 1;
                return Some(value);
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

/// A mutable iterator over the values in a [`HashTable`].
pub struct IterMut<'a, T> {
    slots: core::slice::IterMut<'a, Slot<T>>,
    remaining: usize,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Some(value) = slot.value.as_mut() {
                self.remaining -= 1;
                return Some(value);
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

/// An owning iterator over the values of a [`HashTable`].
pub struct IntoIter<T> {
    slots: alloc::vec::IntoIter<Slot<T>>,
    remaining: usize,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.slots.by_ref() {
            if let Some(value) = slot.value {
                self.remaining -= 1;
                return Some(value);
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

/// A draining iterator over the values of a [`HashTable`].
///
/// This struct is created by the [`drain`] method on [`HashTable`].
///
/// [`drain`]: HashTable::drain
///
/// # Examples
///
/// ```rust
/// # use cellar_hash::hash_table::HashTable;
/// # use cellar_hash::key_hash::djb2;
/// #
/// let mut table = HashTable::new();
/// for s in ["a", "b"] {
///     table
///         .entry(djb2(s.as_bytes()) as u64, |v: &String| v == s)
///         .or_insert(s.to_string())
///         .unwrap();
/// }
///
/// let values: Vec<String> = table.drain().collect();
/// assert!(table.is_empty());
/// assert_eq!(values.len(), 2);
/// ```
pub struct Drain<'a, T> {
    inner: IntoIter<T>,
    _table: PhantomData<&'a mut HashTable<T>>,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Drain<'_, T> {}

impl<T> IntoIterator for HashTable<T> {
    type IntoIter = IntoIter<T>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            slots: self.slots.into_iter(),
            remaining: self.populated,
        }
    }
}

impl<'a, T> IntoIterator for &'a HashTable<T> {
    type IntoIter = Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut HashTable<T> {
    type IntoIter = IterMut<'a, T>;
    type Item = &'a mut T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use core::hash::Hasher;

    use rand::Rng;
    use rand::SeedableRng;
    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use rand::rngs::SmallRng;
    use siphasher::sip::SipHasher;
    use test_log::test;

    use super::*;

    struct HashState {
        k0: u64,
        k1: u64,
    }

    impl HashState {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k0: rng.try_next_u64().unwrap(),
                k1: rng.try_next_u64().unwrap(),
            }
        }

        fn build_hasher(&self) -> SipHasher {
            SipHasher::new_with_keys(self.k0, self.k1)
        }
    }

    #[derive(Debug, PartialEq, Eq, Clone)]
    struct Item {
        key: u64,
        value: i32,
    }

    fn hash_key(state: &HashState, key: u64) -> u64 {
        let mut h = state.build_hasher();
        h.write_u64(key);
        h.finish()
    }

    /// Inserts an item whose hash is chosen by the test.
    fn put(table: &mut HashTable<Item>, hash: u64, key: u64) {
        match table.entry(hash, |v| v.key == key) {
            Entry::Vacant(v) => {
                v.insert(Item {
                    key,
                    value: key as i32,
                })
                .unwrap();
            }
            Entry::Occupied(_) => panic!("{key} already present: {table:#?}"),
        }
    }

    fn slot_of(table: &HashTable<Item>, hash: u64, key: u64) -> usize {
        table
            .search(hash, |v| v.key == key)
            .unwrap_or_else(|| panic!("{key} missing: {table:#?}"))
    }

    #[test]
    fn insert_and_find() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::with_capacity(0);
        for k in 0..32u64 {
            let hash = hash_key(&state, k);
            put(&mut table, hash, k);
            assert_eq!(
                table.find(hash, |v| v.key == k),
                Some(&Item {
                    key: k,
                    value: k as i32
                }),
                "{table:#?}"
            );
        }
        assert_eq!(table.len(), 32);
        for k in 0..32u64 {
            let hash = hash_key(&state, k);
            assert!(table.contains(hash, |v| v.key == k), "{table:#?}");
        }

        let miss_hash = hash_key(&state, 999);
        assert!(table.find(miss_hash, |v| v.key == 999).is_none());
        table.assert_invariants();
    }

    #[test]
    fn upsert_replaces_in_place() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::new();
        let hash = hash_key(&state, 42);

        let first = table.upsert(hash, |v| v.key == 42, Item { key: 42, value: 7 });
        assert_eq!(first, Ok(None));
        let before = slot_of(&table, hash, 42);

        let second = table.upsert(hash, |v| v.key == 42, Item { key: 42, value: 11 });
        assert_eq!(second, Ok(Some(Item { key: 42, value: 7 })));
        assert_eq!(slot_of(&table, hash, 42), before);
        assert_eq!(table.len(), 1);
        assert_eq!(table.find(hash, |v| v.key == 42).map(|v| v.value), Some(11));
    }

    #[test]
    fn find_mut_modifies() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::new();
        for k in 0..10u64 {
            put(&mut table, hash_key(&state, k), k);
        }

        let hash = hash_key(&state, 3);
        table.find_mut(hash, |v| v.key == 3).unwrap().value = 300;
        assert_eq!(table.find(hash, |v| v.key == 3).unwrap().value, 300);
        assert!(table.find_mut(hash_key(&state, 77), |v| v.key == 77).is_none());
    }

    #[test]
    fn remove_items() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::new();
        for k in 0..100u64 {
            put(&mut table, hash_key(&state, k), k);
        }

        for k in (0..100u64).step_by(2) {
            let removed = table.remove(hash_key(&state, k), |v| v.key == k);
            assert_eq!(removed.map(|v| v.key), Ok(k));
            table.assert_invariants();
        }
        assert_eq!(table.len(), 50);

        for k in 0..100u64 {
            let found = table.contains(hash_key(&state, k), |v| v.key == k);
            assert_eq!(found, k % 2 == 1, "{k}: {table:#?}");
        }
    }

    #[test]
    fn remove_missing_leaves_table_untouched() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::new();
        for k in 0..5u64 {
            put(&mut table, hash_key(&state, k), k);
        }
        let before = table.stats();

        assert_eq!(
            table.remove(hash_key(&state, 5), |v| v.key == 5),
            Err(Error::NotFound)
        );
        assert_eq!(table.stats(), before);
    }

    #[test]
    fn colliding_values_go_to_the_cellar() {
        let mut table: HashTable<Item> = HashTable::new();
        assert_eq!(table.cellar_start(), 14);

        // 0, 14 and 28 all have their home at slot 0.
        put(&mut table, 0, 0);
        put(&mut table, 14, 14);
        put(&mut table, 28, 28);

        assert_eq!(slot_of(&table, 0, 0), 0);
        assert_eq!(slot_of(&table, 14, 14), 14);
        assert_eq!(slot_of(&table, 28, 28), 15);

        // The newest displaced value is spliced in right after its home.
        assert_eq!(table.slots[0].next, Some(15));
        assert_eq!(table.slots[15].next, Some(14));
        assert_eq!(table.slots[14].next, None);
        table.assert_invariants();
    }

    #[test]
    fn exhausted_cellar_falls_back_to_addressable_slots() {
        let mut table: HashTable<Item> = HashTable::new();
        for key in [0, 14, 28, 42] {
            put(&mut table, key, key);
        }

        // Cellar slots 14 and 15 are taken, so 42 lands in the first
        // unchained addressable slot.
        assert_eq!(slot_of(&table, 42, 42), 1);

        // 1 is homed at slot 1, now occupied by 42, and the two chains merge.
        put(&mut table, 1, 1);
        assert_eq!(slot_of(&table, 1, 1), 2);
        for key in [0, 14, 28, 42, 1] {
            assert!(table.contains(key, |v| v.key == key));
        }
        table.assert_invariants();
        assert_eq!(table.stats().displaced, 4);
    }

    #[test]
    fn vacated_home_keeps_dependents_reachable() {
        let mut table: HashTable<Item> = HashTable::new();
        for key in [0, 14, 28, 42, 1] {
            put(&mut table, key, key);
        }

        // Slot 1 holds 42 and is also the home of 1, which sits further down
        // the chain. It must stay linked once 42 leaves.
        assert_eq!(table.remove(42, |v| v.key == 42).map(|v| v.key), Ok(42));
        assert!(!table.slots[1].is_occupied());
        assert!(!table.slots[1].is_detached());
        assert_eq!(table.stats().pass_through, 1);
        assert!(table.contains(1, |v| v.key == 1), "{table:#?}");
        assert!(table.contains(28, |v| v.key == 28), "{table:#?}");
        table.assert_invariants();

        // 15 is homed at slot 1 and reclaims it in place.
        put(&mut table, 15, 15);
        assert_eq!(slot_of(&table, 15, 15), 1);
        assert_eq!(table.stats().pass_through, 0);
        table.assert_invariants();
    }

    #[test]
    fn removed_cellar_slot_is_unlinked() {
        let mut table: HashTable<Item> = HashTable::new();
        put(&mut table, 0, 0);
        put(&mut table, 14, 14);

        assert_eq!(table.remove(0, |v| v.key == 0).map(|v| v.key), Ok(0));
        // 14 still depends on slot 0.
        assert!(!table.slots[0].is_detached());
        assert!(table.contains(14, |v| v.key == 14));

        assert_eq!(table.remove(14, |v| v.key == 14).map(|v| v.key), Ok(14));
        assert!(table.slots.iter().all(Slot::is_detached), "{table:#?}");
        table.assert_invariants();
    }

    #[test]
    fn rebuild_detaches_pass_through_slots() {
        let mut table: HashTable<Item> = HashTable::new();
        for key in [0, 14, 28, 42, 1] {
            put(&mut table, key, key);
        }
        table.remove(42, |v| v.key == 42).unwrap();
        assert_eq!(table.stats().pass_through, 1);

        table.rehash(table.capacity()).unwrap();
        assert_eq!(table.capacity(), 16);
        assert_eq!(table.stats().pass_through, 0);
        for key in [0, 14, 28, 1] {
            assert!(table.contains(key, |v| v.key == key));
        }
        table.assert_invariants();
    }

    #[test]
    fn single_home_saturation() {
        // Every value hashes to the same home, forcing every placement past
        // the cellar into the addressable region.
        let mut table: HashTable<u64> = HashTable::new();
        for key in 0..1000u64 {
            table.upsert(0, |&v| v == key, key).unwrap();
        }
        assert_eq!(table.len(), 1000);
        table.assert_invariants();

        for key in (0..1000u64).filter(|k| k % 3 == 0) {
            assert_eq!(table.remove(0, |&v| v == key), Ok(key));
        }
        table.assert_invariants();
        for key in 0..1000u64 {
            assert_eq!(table.contains(0, |&v| v == key), key % 3 != 0);
        }
    }

    #[test]
    fn grows_and_shrinks_with_load() {
        let mut table: HashTable<u64> = HashTable::with_capacity(4);
        assert_eq!(table.capacity(), 4);
        assert_eq!(table.cellar_start(), 4);

        for key in 0..50_000u64 {
            table.upsert(key, |&v| v == key, key).unwrap();
        }
        assert_eq!(table.len(), 50_000);
        assert_eq!(table.capacity(), 131_072);
        table.assert_invariants();

        for key in 0..50_000u64 {
            assert!(table.contains(key, |&v| v == key));
        }

        for key in 0..49_988u64 {
            assert_eq!(table.remove(key, |&v| v == key), Ok(key));
        }
        assert_eq!(table.len(), 12);
        assert_eq!(table.capacity(), 32);
        table.assert_invariants();

        for key in 49_988..50_000u64 {
            assert!(table.contains(key, |&v| v == key));
        }
    }

    #[test]
    fn never_shrinks_below_default() {
        let mut table: HashTable<u64> = HashTable::new();
        for key in 0..8u64 {
            table.upsert(key, |&v| v == key, key).unwrap();
        }
        assert_eq!(table.capacity(), 32);

        for key in 0..8u64 {
            table.remove(key, |&v| v == key).unwrap();
        }
        assert!(table.is_empty());
        assert_eq!(table.capacity(), DEFAULT_CAPACITY);
    }

    #[test]
    fn load_stays_in_bounds_under_random_ops() {
        let mut rng = SmallRng::seed_from_u64(0x5eed);
        let mut table: HashTable<u64> = HashTable::new();
        let mut model = vec![false; 512];

        for _ in 0..20_000 {
            let key = rng.random_range(0..512u64);
            // Few distinct hashes so chains merge and the cellar overflows.
            let hash = key % 37;
            if rng.random_bool(0.55) {
                let replaced = table.upsert(hash, |&v| v == key, key).unwrap();
                assert_eq!(replaced.is_some(), model[key as usize]);
                model[key as usize] = true;
            } else {
                let removed = table.remove(hash, |&v| v == key);
                assert_eq!(removed.is_ok(), model[key as usize]);
                model[key as usize] = false;
            }

            let capacity = table.capacity();
            assert!(table.len() <= capacity / 2, "{} in {capacity}", table.len());
            assert!(capacity <= DEFAULT_CAPACITY || table.len() >= capacity / 4);
        }

        table.assert_invariants();
        assert_eq!(table.len(), model.iter().filter(|&&present| present).count());
    }

    #[test]
    fn entry_api() {
        let mut table: HashTable<(u64, u32)> = HashTable::new();

        *table.entry(1, |e| e.0 == 1).or_insert((1, 0)).unwrap() = (1, 5);
        table
            .entry(1, |e| e.0 == 1)
            .and_modify(|e| e.1 += 1)
            .or_insert((1, 100))
            .unwrap();
        assert_eq!(table.find(1, |e| e.0 == 1), Some(&(1, 6)));

        let value = table.entry(2, |e| e.0 == 2).or_insert_with(|| (2, 7)).unwrap();
        assert_eq!(*value, (2, 7));

        match table.entry(2, |e| e.0 == 2) {
            Entry::Occupied(entry) => assert_eq!(entry.remove(), Ok((2, 7))),
            Entry::Vacant(_) => unreachable!("{table:#?}"),
        }
        assert_eq!(table.len(), 1);

        let defaulted = table.entry(3, |e| e.0 == 3).or_default().unwrap();
        assert_eq!(*defaulted, (0, 0));
    }

    #[test]
    fn occupied_entry_accessors() {
        let mut table: HashTable<String> = HashTable::new();
        table.upsert(9, |s| s == "key", "key".to_string()).unwrap();

        let value_ref = match table.entry(9, |s| s == "key") {
            Entry::Occupied(mut entry) => {
                assert_eq!(entry.get(), "key");
                entry.get_mut().push('!');
                assert_eq!(entry.insert("key".to_string()), "key!");
                entry.into_mut()
            }
            Entry::Vacant(_) => unreachable!(),
        };
        value_ref.push('?');
        assert_eq!(table.find(9, |s| s == "key?"), Some(&"key?".to_string()));
    }

    #[test]
    fn iterators_visit_every_value() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::new();
        for k in 0..200u64 {
            put(&mut table, hash_key(&state, k), k);
        }

        let iter = table.iter();
        assert_eq!(iter.len(), 200);
        let mut keys: Vec<u64> = iter.map(|v| v.key).collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..200).collect::<Vec<_>>());

        for item in table.iter_mut() {
            item.value = -1;
        }
        assert!((&table).into_iter().all(|v| v.value == -1));

        let owned: Vec<Item> = table.into_iter().collect();
        assert_eq!(owned.len(), 200);
    }

    #[test]
    fn drain_empties_and_resets() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::new();
        for k in 0..500u64 {
            put(&mut table, hash_key(&state, k), k);
        }
        assert!(table.capacity() > DEFAULT_CAPACITY);

        let drained = table.drain();
        assert_eq!(drained.len(), 500);
        let mut keys: Vec<u64> = drained.map(|v| v.key).collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..500).collect::<Vec<_>>());

        assert!(table.is_empty());
        assert_eq!(table.capacity(), DEFAULT_CAPACITY);

        // Dropping a partially consumed drain drops the rest.
        for k in 0..10u64 {
            put(&mut table, hash_key(&state, k), k);
        }
        let mut partial = table.drain();
        assert!(partial.next().is_some());
        drop(partial);
        assert!(table.is_empty());
    }

    #[test]
    fn clear_resets_capacity() {
        let mut table: HashTable<u64> = HashTable::new();
        for key in 0..100u64 {
            table.upsert(key, |&v| v == key, key).unwrap();
        }
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.capacity(), DEFAULT_CAPACITY);
        assert!(!table.contains(5, |&v| v == 5));

        let mut small: HashTable<u64> = HashTable::with_capacity(4);
        small.clear();
        assert_eq!(small.capacity(), 4);
    }

    #[test]
    fn capacity_rounding() {
        assert_eq!(HashTable::<u8>::with_capacity(0).capacity(), MIN_CAPACITY);
        assert_eq!(HashTable::<u8>::with_capacity(16).capacity(), 16);
        assert_eq!(HashTable::<u8>::with_capacity(17).capacity(), 32);
        assert_eq!(
            HashTable::<u8>::with_capacity(1024).cellar_start(),
            1024 - 1024 * CELLAR_PERCENT / 100
        );
        assert!(matches!(
            HashTable::<u8>::try_with_capacity(usize::MAX),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            HashTable::<[u8; 64]>::try_with_capacity(usize::MAX / 2),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_clone() {
        let mut original: HashTable<(String, i32)> = HashTable::new();
        let words = ["hello", "world", "rust", "clone", "test"];
        for (value, word) in words.iter().enumerate() {
            let hash = crate::key_hash::djb2(word.as_bytes()) as u64;
            original
                .upsert(hash, |e| e.0 == *word, (word.to_string(), value as i32))
                .unwrap();
        }

        let cloned = original.clone();
        assert_eq!(cloned.len(), words.len());

        let hash = crate::key_hash::djb2(b"hello") as u64;
        original.find_mut(hash, |e| e.0 == "hello").unwrap().1 = 999;
        assert_eq!(original.find(hash, |e| e.0 == "hello").unwrap().1, 999);
        assert_eq!(cloned.find(hash, |e| e.0 == "hello").unwrap().1, 0);
    }

    #[test]
    fn debug_lists_chains() {
        let mut table: HashTable<u64> = HashTable::new();
        table.upsert(0, |&v| v == 0, 0).unwrap();
        table.upsert(14, |&v| v == 14, 14).unwrap();

        let rendered = format!("{table:?}");
        assert!(rendered.starts_with("HashTable"), "{rendered}");
        assert!(rendered.contains("0: 0 -> 14"), "{rendered}");
        assert!(rendered.contains("14: 14"), "{rendered}");
    }

    #[test]
    fn probe_histogram_counts_hops() {
        let mut table: HashTable<Item> = HashTable::new();
        for key in [0, 14, 28, 3] {
            put(&mut table, key, key);
        }

        // 0 and 3 are at home, 28 is one hop away and 14 two.
        assert_eq!(table.probe_histogram(), vec![2, 1, 1]);
        let stats = table.stats();
        assert_eq!(stats.longest_probe, 3);
        assert_eq!(stats.cellar_occupied, 2);
        assert_eq!(stats.home_occupied, 2);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    #[cfg(feature = "std")]
    fn histogram_output() {
        let state = HashState::default();
        let mut table: HashTable<Item> = HashTable::new();
        for k in 0..10_000u64 {
            put(&mut table, hash_key(&state, k), k);
        }

        table.print_probe_histogram();
        table.stats().print();
    }
}
