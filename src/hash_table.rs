//! The core coalesced hash table, addressed by precomputed hash values and
//! caller-supplied equality predicates.

use alloc::vec::Vec;
use core::fmt::Debug;
use core::mem;

/// Index of the sentinel slot. The sentinel anchors the occupied list and
/// never stores data, so `0` doubles as the null link for the free list.
const NIL: usize = 0;

/// Smallest slot store the table will allocate: three usable slots plus the
/// sentinel. Growth doubles the store, so all later sizes are `4 * 2^n`.
const MIN_SLOTS: usize = 4;

/// Error returned when the table needs a larger slot store and the allocator
/// cannot provide one.
///
/// The table that produced this error is untouched: no entry was inserted,
/// moved, or dropped, and every invariant still holds. The failed operation
/// can be retried after freeing memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityError;

impl core::fmt::Display for CapacityError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("failed to allocate a larger slot store")
    }
}

impl core::error::Error for CapacityError {}

#[derive(Clone)]
struct OccupiedSlot<T> {
    /// Full hash of the stored item, cached so growth and anchor repair never
    /// re-hash user keys.
    hash: u64,
    /// True iff this slot terminates its bucket's collision chain.
    last: bool,
    item: T,
}

/// One cell of the slot store. The `prev`/`next` links thread whichever
/// intrusive list the slot is currently on: the free list while `entry` is
/// `None`, the occupied list otherwise.
#[derive(Clone)]
struct Slot<T> {
    prev: usize,
    next: usize,
    entry: Option<OccupiedSlot<T>>,
}

/// A hash table using coalesced hashing over a flat slot arena.
///
/// `HashTable<T>` stores values of type `T` and requires the caller to
/// provide the hash value and an equality predicate for each operation.
/// Collision chains are runs of a single doubly-linked list embedded directly
/// in the slot array rather than separate per-bucket storage; the same list,
/// threaded through a reserved sentinel slot, carries the global iteration
/// order. Chains from different buckets may interleave and coalesce, which
/// keeps the layout flat at the cost of occasionally probing entries that
/// belong to a neighboring bucket.
///
/// Two properties follow from the layout:
///
/// - **O(1) negative lookups**: a key whose home slot is free is known to be
///   absent without probing anything else.
/// - **Tombstone-free deletion**: removing an entry relinks the lists and, if
///   necessary, relocates a chain member so that a non-empty bucket always
///   keeps an occupant at its home index. No deleted markers accumulate, and
///   lookup cost never degrades from past deletions.
///
/// Iteration order is unspecified but deterministic: it is an artifact of the
/// order in which slots were spliced into the occupied list.
///
/// # Example
///
/// ```rust
/// use coalesced_hash::hash_table::HashTable;
///
/// let mut table: HashTable<(u64, &str)> = HashTable::new();
/// table.insert(7, (7, "seven"), |&(id, _)| id == 7).unwrap();
///
/// assert_eq!(table.find(7, |&(id, _)| id == 7), Some(&(7, "seven")));
/// assert_eq!(table.find(9, |&(id, _)| id == 9), None);
/// ```
#[derive(Clone)]
pub struct HashTable<T> {
    slots: Vec<Slot<T>>,
    /// Head of the free list, `NIL` when every usable slot is occupied.
    free_head: usize,
    len: usize,
}

impl<T> Default for HashTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Debug> Debug for HashTable<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> HashTable<T> {
    /// Creates an empty table with the minimum capacity of three usable
    /// slots.
    pub fn new() -> Self {
        Self::with_capacity(MIN_SLOTS - 1)
    }

    /// Creates an empty table with at least `capacity` usable slots.
    ///
    /// The store always reserves one extra cell for the sentinel and never
    /// starts below the minimum size.
    pub fn with_capacity(capacity: usize) -> Self {
        let slot_count = capacity.saturating_add(1).max(MIN_SLOTS);
        Self::from_empty_storage(Vec::with_capacity(slot_count), slot_count)
    }

    /// Builds the sentinel and threads every other slot onto the free list.
    /// `slots` must be empty with room for `slot_count` cells.
    fn from_empty_storage(mut slots: Vec<Slot<T>>, slot_count: usize) -> Self {
        debug_assert!(slots.is_empty());
        debug_assert!(slots.capacity() >= slot_count);

        slots.push(Slot {
            prev: NIL,
            next: NIL,
            entry: None,
        });
        for index in 1..slot_count {
            slots.push(Slot {
                prev: if index == 1 { NIL } else { index - 1 },
                next: if index + 1 == slot_count { NIL } else { index + 1 },
                entry: None,
            });
        }

        HashTable {
            slots,
            free_head: 1,
            len: 0,
        }
    }

    /// Returns the number of elements in the table.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the table contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of usable slots, excluding the sentinel. The table
    /// holds exactly this many elements before it has to grow.
    pub fn capacity(&self) -> usize {
        self.slots.len() - 1
    }

    /// Maps a hash to its home index. Slot 0 is the sentinel, so data slots
    /// live in `1..=capacity`.
    fn home(&self, hash: u64) -> usize {
        1 + (hash % self.capacity() as u64) as usize
    }

    fn occupied(&self, index: usize) -> &OccupiedSlot<T> {
        match self.slots[index].entry.as_ref() {
            Some(occupied) => occupied,
            None => unreachable!("slot {index} is on the occupied list but holds no entry"),
        }
    }

    fn occupied_mut(&mut self, index: usize) -> &mut OccupiedSlot<T> {
        match self.slots[index].entry.as_mut() {
            Some(occupied) => occupied,
            None => unreachable!("slot {index} is on the occupied list but holds no entry"),
        }
    }

    /// Detaches `index` from the free list.
    fn unlink_free(&mut self, index: usize) {
        let (prev, next) = (self.slots[index].prev, self.slots[index].next);
        if prev == NIL {
            self.free_head = next;
        } else {
            self.slots[prev].next = next;
        }
        if next != NIL {
            self.slots[next].prev = prev;
        }
    }

    /// Pushes `index` onto the head of the free list.
    fn push_free(&mut self, index: usize) {
        let head = self.free_head;
        self.slots[index].prev = NIL;
        self.slots[index].next = head;
        if head != NIL {
            self.slots[head].prev = index;
        }
        self.free_head = index;
    }

    /// Splices `index` into the occupied list directly after `after`, which
    /// may be the sentinel.
    fn link_after(&mut self, after: usize, index: usize) {
        let next = self.slots[after].next;
        self.slots[index].prev = after;
        self.slots[index].next = next;
        self.slots[next].prev = index;
        self.slots[after].next = index;
    }

    /// Detaches `index` from the occupied list.
    fn unlink_occupied(&mut self, index: usize) {
        let (prev, next) = (self.slots[index].prev, self.slots[index].next);
        self.slots[prev].next = next;
        self.slots[next].prev = prev;
    }

    /// Walks the collision chain for `hash` and returns the index of the
    /// matching slot, if any. A free home slot is an immediate miss.
    fn find_index(&self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> Option<usize> {
        let mut index = self.home(hash);
        self.slots[index].entry.as_ref()?;

        loop {
            let occupied = self.occupied(index);
            if occupied.hash == hash && eq(&occupied.item) {
                return Some(index);
            }
            if occupied.last {
                return None;
            }
            index = self.slots[index].next;
        }
    }

    /// Returns a reference to the value matching the hash and predicate.
    ///
    /// # Example
    ///
    /// ```rust
    /// use coalesced_hash::hash_table::HashTable;
    ///
    /// let mut table: HashTable<u64> = HashTable::new();
    /// table.insert(42, 42, |&n| n == 42).unwrap();
    ///
    /// assert_eq!(table.find(42, |&n| n == 42), Some(&42));
    /// assert_eq!(table.find(99, |&n| n == 99), None);
    /// ```
    pub fn find(&self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<&T> {
        let index = self.find_index(hash, eq)?;
        Some(&self.occupied(index).item)
    }

    /// Returns a mutable reference to the value matching the hash and
    /// predicate.
    pub fn find_mut(&mut self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<&mut T> {
        let index = self.find_index(hash, eq)?;
        Some(&mut self.occupied_mut(index).item)
    }

    /// Places an item known to be absent, preserving the anchor property
    /// that a non-empty bucket always occupies its home slot. Returns the
    /// index the item landed in (always the home index).
    ///
    /// When the home slot is occupied the caller must guarantee a non-empty
    /// free list.
    fn insert_unique(&mut self, hash: u64, item: T) -> usize {
        let home = self.home(hash);
        if self.slots[home].entry.is_none() {
            self.unlink_free(home);
            self.link_after(NIL, home);
            self.slots[home].entry = Some(OccupiedSlot {
                hash,
                last: true,
                item,
            });
        } else {
            // The current occupant moves to a spare slot spliced in right
            // after home, and the new item takes the home slot itself. The
            // displaced entry keeps its hash and terminator flag.
            let spare = self.free_head;
            debug_assert_ne!(spare, NIL, "placement requires a free slot");
            self.unlink_free(spare);
            let displaced = self.slots[home].entry.take();
            self.slots[spare].entry = displaced;
            self.link_after(home, spare);
            self.slots[home].entry = Some(OccupiedSlot {
                hash,
                last: false,
                item,
            });
        }
        self.len += 1;
        home
    }

    /// Inserts an item, growing the table if necessary.
    ///
    /// Returns `Ok(None)` if the item was newly inserted, or `Ok(Some(old))`
    /// with the replaced item if an entry already matched the hash and
    /// predicate. Overwriting never grows the table; growth happens only when
    /// a new entry needs a slot and none is free.
    ///
    /// # Errors
    ///
    /// [`CapacityError`] if a larger slot store could not be allocated. The
    /// table is unchanged in that case.
    ///
    /// # Example
    ///
    /// ```rust
    /// use coalesced_hash::hash_table::HashTable;
    ///
    /// let mut table: HashTable<(u64, i32)> = HashTable::new();
    ///
    /// let previous = table.insert(1, (1, 10), |&(k, _)| k == 1).unwrap();
    /// assert_eq!(previous, None);
    ///
    /// let previous = table.insert(1, (1, 20), |&(k, _)| k == 1).unwrap();
    /// assert_eq!(previous, Some((1, 10)));
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn insert(
        &mut self,
        hash: u64,
        item: T,
        mut eq: impl FnMut(&T) -> bool,
    ) -> Result<Option<T>, CapacityError> {
        let home = self.home(hash);
        if self.slots[home].entry.is_some() {
            if let Some(index) = self.find_index(hash, &mut eq) {
                let occupied = self.occupied_mut(index);
                return Ok(Some(mem::replace(&mut occupied.item, item)));
            }
            if self.free_head == NIL {
                self.grow()?;
            }
        }
        self.insert_unique(hash, item);
        Ok(None)
    }

    /// Gets a view of the entry matching the hash and predicate, for in-place
    /// inspection or insertion.
    ///
    /// If the entry is vacant, any growth needed to guarantee the insertion a
    /// slot happens here, so [`VacantEntry::insert`] itself cannot fail.
    ///
    /// # Errors
    ///
    /// [`CapacityError`] if the entry is vacant, the table is full, and a
    /// larger slot store could not be allocated.
    ///
    /// # Example
    ///
    /// ```rust
    /// use coalesced_hash::hash_table::Entry;
    /// use coalesced_hash::hash_table::HashTable;
    ///
    /// let mut table: HashTable<(u64, &str)> = HashTable::new();
    ///
    /// match table.entry(3, |&(id, _)| id == 3).unwrap() {
    ///     Entry::Vacant(entry) => {
    ///         entry.insert((3, "three"));
    ///     }
    ///     Entry::Occupied(_) => unreachable!(),
    /// }
    ///
    /// assert_eq!(table.find(3, |&(id, _)| id == 3), Some(&(3, "three")));
    /// ```
    pub fn entry(
        &mut self,
        hash: u64,
        mut eq: impl FnMut(&T) -> bool,
    ) -> Result<Entry<'_, T>, CapacityError> {
        if let Some(index) = self.find_index(hash, &mut eq) {
            return Ok(Entry::Occupied(OccupiedEntry { table: self, index }));
        }
        let home = self.home(hash);
        if self.slots[home].entry.is_some() && self.free_head == NIL {
            self.grow()?;
        }
        Ok(Entry::Vacant(VacantEntry { table: self, hash }))
    }

    /// Removes and returns the value matching the hash and predicate, or
    /// `None` if no entry matches.
    ///
    /// # Example
    ///
    /// ```rust
    /// use coalesced_hash::hash_table::HashTable;
    ///
    /// let mut table: HashTable<u64> = HashTable::new();
    /// table.insert(42, 42, |&n| n == 42).unwrap();
    ///
    /// assert_eq!(table.remove(42, |&n| n == 42), Some(42));
    /// assert_eq!(table.remove(42, |&n| n == 42), None);
    /// ```
    pub fn remove(&mut self, hash: u64, eq: impl FnMut(&T) -> bool) -> Option<T> {
        let index = self.find_index(hash, eq)?;
        Some(self.remove_at(index))
    }

    /// Removes and returns the first value, in iteration order, for which the
    /// predicate returns `true`.
    ///
    /// This is a linear scan of the occupied list; the table keeps no index
    /// over values.
    pub fn remove_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> Option<T> {
        let mut index = self.slots[NIL].next;
        while index != NIL {
            if pred(&self.occupied(index).item) {
                return Some(self.remove_at(index));
            }
            index = self.slots[index].next;
        }
        None
    }

    /// Removes the entry at `index` and returns its item, repairing the
    /// bucket anchor when the entry sits at its own home slot.
    fn remove_at(&mut self, index: usize) -> T {
        let (hash, last) = {
            let occupied = self.occupied(index);
            (occupied.hash, occupied.last)
        };
        let home = self.home(hash);

        let mut target = index;
        let mut target_last = last;
        let mut removed = None;

        if index == home && !last {
            // The bucket anchored here has further chain members. Vacating
            // the home slot would strand any of them that hash to it, since
            // lookup probes the home index first. Pull the next member of
            // this same bucket forward into the anchor and delete its old
            // slot instead. Chain members coalesced from other buckets
            // re-home elsewhere and are not eligible.
            let mut cursor = self.slots[index].next;
            while cursor != NIL {
                let (cursor_hash, cursor_last) = {
                    let occupied = self.occupied(cursor);
                    (occupied.hash, occupied.last)
                };
                if self.home(cursor_hash) == home {
                    let moved = self.slots[cursor].entry.take();
                    removed = mem::replace(&mut self.slots[home].entry, moved);
                    target = cursor;
                    target_last = cursor_last;
                    break;
                }
                if cursor_last {
                    break;
                }
                cursor = self.slots[cursor].next;
            }
        }

        let removed = match removed {
            Some(occupied) => occupied,
            None => match self.slots[target].entry.take() {
                Some(occupied) => occupied,
                None => unreachable!("removal target {target} holds no entry"),
            },
        };

        // If the removed slot terminated its chain, its predecessor becomes
        // the new terminator. The predecessor may belong to another bucket
        // whose chain coalesced with this one; the extra flag only shortens
        // its probe walk. The sentinel has no entry and is skipped outright.
        if target_last {
            let prev = self.slots[target].prev;
            if let Some(previous) = self.slots[prev].entry.as_mut() {
                previous.last = true;
            }
        }

        self.unlink_occupied(target);
        self.push_free(target);
        self.len -= 1;
        removed.item
    }

    /// Doubles the slot store and reinserts every entry.
    ///
    /// The new store is fully built before the old one is released, so a
    /// failed allocation leaves the table exactly as it was. Reinsertion uses
    /// the cached hashes, never user code, and the doubled arena cannot run
    /// out of free slots mid-rehash.
    fn grow(&mut self) -> Result<(), CapacityError> {
        let slot_count = self.slots.len().checked_mul(2).ok_or(CapacityError)?;
        let mut storage = Vec::new();
        storage
            .try_reserve_exact(slot_count)
            .map_err(|_| CapacityError)?;
        let mut grown = Self::from_empty_storage(storage, slot_count);

        let mut cursor = self.slots[NIL].next;
        while cursor != NIL {
            let next = self.slots[cursor].next;
            let occupied = match self.slots[cursor].entry.take() {
                Some(occupied) => occupied,
                None => unreachable!("slot {cursor} is on the occupied list but holds no entry"),
            };
            grown.insert_unique(occupied.hash, occupied.item);
            cursor = next;
        }

        *self = grown;
        Ok(())
    }

    /// Drops every entry and rethreads all slots back onto the free list,
    /// keeping the current allocation.
    fn reset(&mut self) {
        let slot_count = self.slots.len();
        self.slots[NIL].prev = NIL;
        self.slots[NIL].next = NIL;
        for index in 1..slot_count {
            let slot = &mut self.slots[index];
            slot.entry = None;
            slot.prev = if index == 1 { NIL } else { index - 1 };
            slot.next = if index + 1 == slot_count { NIL } else { index + 1 };
        }
        self.free_head = 1;
        self.len = 0;
    }

    /// Removes all elements from the table, preserving its capacity.
    pub fn clear(&mut self) {
        self.reset();
    }

    /// Returns an iterator over all values in the table.
    ///
    /// Each call starts a fresh traversal of the occupied list, so iteration
    /// is restartable. The order is unspecified but deterministic for a given
    /// history of operations.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            table: self,
            cursor: self.slots[NIL].next,
        }
    }

    /// Returns an iterator that removes and yields every value. The table is
    /// empty afterwards, even if the iterator is dropped mid-way.
    pub fn drain(&mut self) -> Drain<'_, T> {
        let cursor = self.slots[NIL].next;
        Drain {
            table: self,
            cursor,
        }
    }
}

impl<T> IntoIterator for HashTable<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        let cursor = self.slots[NIL].next;
        IntoIter {
            table: self,
            cursor,
        }
    }
}

/// A view into a single entry in the table, which may be vacant or occupied.
///
/// Constructed from [`HashTable::entry`].
pub enum Entry<'a, T> {
    /// An entry matching the probe exists.
    Occupied(OccupiedEntry<'a, T>),
    /// No entry matched the probe.
    Vacant(VacantEntry<'a, T>),
}

impl<'a, T> Entry<'a, T> {
    /// Inserts `item` if the entry is vacant and returns a mutable reference
    /// to the stored value.
    pub fn or_insert(self, item: T) -> &'a mut T {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(item),
        }
    }

    /// Inserts the result of `default` if the entry is vacant and returns a
    /// mutable reference to the stored value.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut T
    where
        F: FnOnce() -> T,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }
}

/// A view into an occupied entry in the table.
pub struct OccupiedEntry<'a, T> {
    table: &'a mut HashTable<T>,
    index: usize,
}

impl<'a, T> OccupiedEntry<'a, T> {
    /// Gets a reference to the stored value.
    pub fn get(&self) -> &T {
        &self.table.occupied(self.index).item
    }

    /// Gets a mutable reference to the stored value.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.table.occupied_mut(self.index).item
    }

    /// Converts the entry into a mutable reference tied to the table borrow.
    pub fn into_mut(self) -> &'a mut T {
        let OccupiedEntry { table, index } = self;
        &mut table.occupied_mut(index).item
    }

    /// Replaces the stored value, returning the old one. The slot keeps its
    /// place in both the chain and the iteration order.
    pub fn replace(&mut self, item: T) -> T {
        mem::replace(&mut self.table.occupied_mut(self.index).item, item)
    }

    /// Removes the entry from the table and returns its value.
    pub fn remove(self) -> T {
        self.table.remove_at(self.index)
    }
}

/// A view into a vacant entry in the table.
///
/// The table is guaranteed to have room for the insertion; any growth already
/// happened in [`HashTable::entry`].
pub struct VacantEntry<'a, T> {
    table: &'a mut HashTable<T>,
    hash: u64,
}

impl<'a, T> VacantEntry<'a, T> {
    /// Inserts `item` into the table and returns a mutable reference to it.
    pub fn insert(self, item: T) -> &'a mut T {
        let VacantEntry { table, hash } = self;
        let index = table.insert_unique(hash, item);
        &mut table.occupied_mut(index).item
    }
}

/// An iterator over the values of a `HashTable`.
pub struct Iter<'a, T> {
    table: &'a HashTable<T>,
    cursor: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let table = self.table;
        let index = self.cursor;
        self.cursor = table.slots[index].next;
        match table.slots[index].entry.as_ref() {
            Some(occupied) => Some(&occupied.item),
            None => unreachable!("slot {index} is on the occupied list but holds no entry"),
        }
    }
}

/// A draining iterator over the values of a `HashTable`.
pub struct Drain<'a, T> {
    table: &'a mut HashTable<T>,
    cursor: usize,
}

impl<T> Iterator for Drain<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let index = self.cursor;
        self.cursor = self.table.slots[index].next;
        match self.table.slots[index].entry.take() {
            Some(occupied) => Some(occupied.item),
            None => unreachable!("slot {index} is on the occupied list but holds no entry"),
        }
    }
}

impl<T> Drop for Drain<'_, T> {
    fn drop(&mut self) {
        for _ in &mut *self {}
        self.table.reset();
    }
}

/// An owning iterator over the values of a `HashTable`.
pub struct IntoIter<T> {
    table: HashTable<T>,
    cursor: usize,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor == NIL {
            return None;
        }
        let index = self.cursor;
        self.cursor = self.table.slots[index].next;
        match self.table.slots[index].entry.take() {
            Some(occupied) => Some(occupied.item),
            None => unreachable!("slot {index} is on the occupied list but holds no entry"),
        }
    }
}

#[cfg(test)]
impl<T> HashTable<T> {
    /// Asserts every structural property of the table:
    ///
    /// - the free and occupied lists partition the non-sentinel slots, with
    ///   consistent back links;
    /// - `len` matches the occupied list;
    /// - every entry's bucket is anchored at its home index and the entry is
    ///   reachable from there before the chain terminator.
    fn check_invariants(&self) {
        let mut seen = alloc::vec![false; self.slots.len()];
        seen[NIL] = true;

        let mut occupied_count = 0;
        let mut prev = NIL;
        let mut cursor = self.slots[NIL].next;
        while cursor != NIL {
            assert!(!seen[cursor], "slot {cursor} linked twice");
            seen[cursor] = true;
            assert!(
                self.slots[cursor].entry.is_some(),
                "free slot {cursor} on the occupied list"
            );
            assert_eq!(self.slots[cursor].prev, prev, "broken prev link at {cursor}");
            prev = cursor;
            occupied_count += 1;
            cursor = self.slots[cursor].next;
        }
        assert_eq!(self.slots[NIL].prev, prev, "occupied list is not circular");
        assert_eq!(occupied_count, self.len, "len out of sync");

        let mut free_count = 0;
        let mut prev = NIL;
        let mut cursor = self.free_head;
        while cursor != NIL {
            assert!(!seen[cursor], "slot {cursor} on both lists");
            seen[cursor] = true;
            assert!(
                self.slots[cursor].entry.is_none(),
                "occupied slot {cursor} on the free list"
            );
            assert_eq!(self.slots[cursor].prev, prev, "broken free prev at {cursor}");
            prev = cursor;
            free_count += 1;
            cursor = self.slots[cursor].next;
        }
        assert_eq!(
            occupied_count + free_count + 1,
            self.slots.len(),
            "slot missing from both lists"
        );

        for index in 1..self.slots.len() {
            let Some(occupied) = self.slots[index].entry.as_ref() else {
                continue;
            };
            let home = self.home(occupied.hash);
            assert!(
                self.slots[home].entry.is_some(),
                "home slot {home} vacant while its bucket is non-empty"
            );
            let mut cursor = home;
            while cursor != index {
                let current = self.slots[cursor]
                    .entry
                    .as_ref()
                    .expect("chain walked onto a free slot");
                assert!(
                    !current.last,
                    "entry at {index} unreachable from home {home}"
                );
                cursor = self.slots[cursor].next;
                assert_ne!(cursor, NIL, "chain from {home} reached the sentinel");
            }
        }
    }
}
