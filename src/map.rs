//! RobinMap: single-value Robin Hood map with bounded probe lengths.

use crate::hash::DefaultHashBuilder;
use crate::index::{fold_hash, BucketMapper};
use crate::probe;
use crate::slot::{Slot, SlotStore};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::ops::Index;

pub(crate) const MIN_CAPACITY: usize = 16;
pub(crate) const DEFAULT_LOAD_FACTOR: f64 = 0.5;

/// Open-addressing map resolving collisions by Robin Hood displacement.
///
/// Each entry lives directly in the slot array together with its probe
/// sequence length (distance from home bucket) and its folded 32-bit hash.
/// Insertion evicts occupants that are closer to home than the incoming
/// candidate, which keeps PSL values non-decreasing along every probe run
/// and bounds lookups; removal backward-shifts the displaced successors so
/// no tombstones exist. When a candidate's PSL reaches the bound derived
/// from capacity and load factor, the table grows and rehashes in full.
///
/// Single-threaded by design; duplicate inserts are rejected.
pub struct RobinMap<K, V, S = DefaultHashBuilder> {
    store: SlotStore<K, V>,
    mapper: BucketMapper,
    hasher: S,
    count: usize,
    capacity: usize,
    load_factor: f64,
    max_psl: u32,
    /// `floor(capacity * load_factor)`; insertion grows the table first
    /// once `count` reaches this.
    resize_at: usize,
    /// Running maximum PSL ever placed in the current table. Bounds the
    /// lookup scan: a miss cannot exist past this offset.
    longest_psl: u32,
}

impl<K, V> RobinMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_capacity(MIN_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }

    /// `load_factor` must lie in `(0, 1]`. Values above one half trade
    /// longer worst-case probes for fewer resizes.
    pub fn with_load_factor(capacity: usize, load_factor: f64) -> Self {
        Self::with_parts(capacity, load_factor, Default::default())
    }
}

impl<K, V> Default for RobinMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> RobinMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(MIN_CAPACITY, hasher)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self::with_parts(capacity, DEFAULT_LOAD_FACTOR, hasher)
    }

    fn with_parts(capacity: usize, load_factor: f64, hasher: S) -> Self {
        assert!(
            load_factor > 0.0 && load_factor <= 1.0,
            "load factor must lie in (0, 1]"
        );
        let capacity = capacity.max(MIN_CAPACITY).next_power_of_two();
        let max_psl = probe::max_psl(capacity, load_factor);
        Self {
            store: SlotStore::new(capacity, max_psl),
            mapper: BucketMapper::new(capacity),
            hasher,
            count: 0,
            capacity,
            load_factor,
            max_psl,
            resize_at: (capacity as f64 * load_factor) as usize,
            longest_psl: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Nominal capacity (power of two), excluding the guard region.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn hash_of<Q>(&self, q: &Q) -> u32
    where
        Q: ?Sized + Hash,
    {
        fold_hash(self.hasher.hash_one(q))
    }

    /// Inserts `key`/`value`. Returns false, leaving the map untouched,
    /// iff the key is already present.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let hash = self.hash_of(&key);
        if self.find_index(hash, &key).is_some() {
            return false;
        }
        // One doubling may not be enough at small load factors; keep
        // growing until the bound admits the new entry.
        while self.count >= self.resize_at {
            self.grow();
        }
        let mut candidate = Slot {
            psl: 0,
            hash,
            key,
            value,
        };
        loop {
            match self.place(candidate) {
                Ok(()) => {
                    self.count += 1;
                    return true;
                }
                Err(mut evicted) => {
                    // PSL bound hit mid-insertion: grow, then retry the
                    // candidate in hand against the new table.
                    evicted.psl = 0;
                    self.grow();
                    candidate = evicted;
                }
            }
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash_of(key);
        let i = self.find_index(hash, key)?;
        self.store.slot(i).as_ref().map(|slot| &slot.value)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash_of(key);
        let i = self.find_index(hash, key)?;
        self.store.slot_mut(i).as_mut().map(|slot| &mut slot.value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash_of(key);
        self.find_index(hash, key).is_some()
    }

    /// Overwrites the value for `key` in place, leaving PSL and occupancy
    /// untouched. Returns false if the key is absent.
    pub fn update<Q>(&mut self, key: &Q, value: V) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash_of(key);
        if let Some(i) = self.find_index(hash, key) {
            if let Some(slot) = self.store.slot_mut(i).as_mut() {
                slot.value = value;
                return true;
            }
        }
        false
    }

    /// Removes `key` via backward-shift deletion. Returns false if absent.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash_of(key);
        let Some(mut i) = self.find_index(hash, key) else {
            return false;
        };
        self.store.take(i);
        self.count -= 1;
        // Pull displaced successors one slot toward home until the next
        // slot is empty or already at its own home bucket.
        loop {
            let next = i + 1;
            if next == self.store.len() {
                break;
            }
            let displaced = matches!(self.store.slot(next), Some(slot) if slot.psl > 0);
            if !displaced {
                break;
            }
            if let Some(mut slot) = self.store.take(next) {
                slot.psl -= 1;
                *self.store.slot_mut(i) = Some(slot);
            }
            i = next;
        }
        true
    }

    /// Drops every entry; the table geometry is kept. Idempotent.
    pub fn clear(&mut self) {
        self.store.clear();
        self.count = 0;
        self.longest_psl = 0;
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::over(self.store.raw())
    }

    /// Bounded forward scan from the home bucket. The displacement
    /// invariant (PSL non-decreasing until the first empty slot) makes it
    /// sound to stop at an empty slot or past the running-maximum PSL.
    fn find_index<Q>(&self, hash: u32, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let home = self.mapper.bucket(hash);
        let end = home + self.longest_psl as usize;
        let mut i = home;
        loop {
            match self.store.slot(i) {
                None => return None,
                Some(slot) => {
                    if slot.hash == hash && slot.key.borrow() == key {
                        return Some(i);
                    }
                }
            }
            i += 1;
            if i > end || i == self.store.len() {
                return None;
            }
        }
    }

    /// Displacement walk. Places the candidate in the first empty slot on
    /// its probe path, evicting any occupant closer to home than the
    /// candidate ("steal from the rich"). Fails with the candidate in hand
    /// when its PSL reaches the bound, signalling a resize.
    fn place(&mut self, mut candidate: Slot<K, V>) -> Result<(), Slot<K, V>> {
        let mut i = self.mapper.bucket(candidate.hash);
        loop {
            if candidate.psl >= self.max_psl {
                return Err(candidate);
            }
            let slot = self.store.slot_mut(i);
            match slot {
                None => {
                    self.longest_psl = self.longest_psl.max(candidate.psl);
                    *slot = Some(candidate);
                    return Ok(());
                }
                Some(occupant) => {
                    if candidate.psl > occupant.psl {
                        self.longest_psl = self.longest_psl.max(candidate.psl);
                        core::mem::swap(occupant, &mut candidate);
                    }
                }
            }
            i += 1;
            candidate.psl += 1;
        }
    }

    /// Full rehash into a larger table. Every surviving entry is pulled
    /// out once and reinserted through the displacement walk with its PSL
    /// reset; stored hashes are reused so `K: Hash` is never re-invoked.
    /// If reinsertion overflows the new bound the table doubles again
    /// before retrying, so the caller never observes a half-migrated
    /// table.
    fn grow(&mut self) {
        let mut pending: Vec<Slot<K, V>> = self.store.drain().collect();
        // Reinsertion pops from the back; reversing keeps table order, so
        // the relative order of colliding entries survives the rehash.
        pending.reverse();
        let mut capacity = (self.capacity + 1).next_power_of_two();
        loop {
            self.install_geometry(capacity);
            if self.reinsert(&mut pending) {
                return;
            }
            pending.extend(self.store.drain());
            capacity *= 2;
        }
    }

    fn install_geometry(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.mapper = BucketMapper::new(capacity);
        self.max_psl = probe::max_psl(capacity, self.load_factor);
        self.resize_at = (capacity as f64 * self.load_factor) as usize;
        self.store = SlotStore::new(capacity, self.max_psl);
        self.longest_psl = 0;
    }

    fn reinsert(&mut self, pending: &mut Vec<Slot<K, V>>) -> bool {
        while let Some(mut slot) = pending.pop() {
            slot.psl = 0;
            if let Err(evicted) = self.place(slot) {
                pending.push(evicted);
                return false;
            }
        }
        true
    }

    /// Structural self-check used by the test suites after mutations.
    #[cfg(any(test, debug_assertions))]
    pub(crate) fn check_invariants(&self) {
        self.store.verify(self.count, &self.mapper);
        assert!(
            self.count <= self.resize_at,
            "load factor exceeded: {} entries at capacity {}",
            self.count,
            self.capacity
        );
    }
}

/// Iterator over occupied slots in table order.
pub struct Iter<'a, K, V> {
    it: core::slice::Iter<'a, Option<Slot<K, V>>>,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn over(slots: &'a [Option<Slot<K, V>>]) -> Self {
        Self { it: slots.iter() }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it
            .find_map(|slot| slot.as_ref().map(|s| (&s.key, &s.value)))
    }
}

impl<K, V, Q, S> Index<&Q> for RobinMap<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
{
    type Output = V;

    /// Panics if the key is absent; there is no sentinel channel here.
    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("RobinMap: no entry for key"),
        }
    }
}
