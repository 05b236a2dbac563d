//! RobinMultiMap: Robin Hood map allowing several values per key.
//!
//! Entries sharing one stored hash form a contiguous run in probe order,
//! so "first match" and "all matches" scans stop at the group boundary.
//! Contiguity falls out of the displacement rule: a candidate walks past
//! its own group, then displaces the next occupant even on a PSL tie —
//! plain strictly-greater eviction would let a later arrival with a
//! different hash wedge itself into the group. Backward-shift removal
//! preserves table order and therefore contiguity.

use crate::hash::DefaultHashBuilder;
use crate::index::{fold_hash, BucketMapper};
use crate::map::{DEFAULT_LOAD_FACTOR, MIN_CAPACITY};
use crate::probe;
use crate::slot::{Slot, SlotStore};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};

/// Hard cap on entries per hash group. A group of `n` entries pins a probe
/// run of at least `n` slots regardless of capacity (identical hashes can
/// never be spread apart by resizing), so exceeding the cap is a contract
/// violation reported to the caller, never silently dropped.
pub(crate) const GROUP_CEILING: usize = 1024;

#[derive(Debug, PartialEq, Eq)]
pub enum InsertError {
    /// More entries share one hash group than the probe accounting allows.
    KeyGroupOverflow,
}

pub struct RobinMultiMap<K, V, S = DefaultHashBuilder> {
    store: SlotStore<K, V>,
    mapper: BucketMapper,
    hasher: S,
    count: usize,
    capacity: usize,
    load_factor: f64,
    max_psl: u32,
    resize_at: usize,
    longest_psl: u32,
}

impl<K, V> RobinMultiMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_capacity(MIN_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, Default::default())
    }

    pub fn with_load_factor(capacity: usize, load_factor: f64) -> Self {
        Self::with_parts(capacity, load_factor, Default::default())
    }
}

impl<K, V> Default for RobinMultiMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> RobinMultiMap<K, V, S>
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

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn hash_of<Q>(&self, q: &Q) -> u32
    where
        Q: ?Sized + Hash,
    {
        fold_hash(self.hasher.hash_one(q))
    }

    /// Appends an entry for `key`; duplicate keys are allowed. Fails with
    /// [`InsertError::KeyGroupOverflow`] when the key's hash group is at
    /// the ceiling.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), InsertError> {
        let hash = self.hash_of(&key);
        if self.group_len(hash) >= GROUP_CEILING {
            return Err(InsertError::KeyGroupOverflow);
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
                    return Ok(());
                }
                Err(mut evicted) => {
                    evicted.psl = 0;
                    self.grow();
                    candidate = evicted;
                }
            }
        }
    }

    /// First value stored for `key`, in probe order.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash_of(key);
        let i = self.find_index(hash, key)?;
        self.store.slot(i).as_ref().map(|slot| &slot.value)
    }

    /// All values stored for `key`, in probe order. The scan covers only
    /// the key's contiguous hash group.
    pub fn get_all<'a, Q>(&'a self, key: &'a Q) -> GetAll<'a, K, V, Q>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash_of(key);
        let start = self.group_start(hash).unwrap_or(self.store.len());
        GetAll {
            slots: self.store.raw(),
            i: start,
            hash,
            key,
        }
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash_of(key);
        self.find_index(hash, key).is_some()
    }

    /// Overwrites the first value stored for `key`. False if absent.
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

    /// Removes the first entry for `key` via backward-shift deletion.
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

    /// Removes every entry for `key`; returns how many were removed.
    pub fn remove_all<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let mut removed = 0;
        while self.remove(key) {
            removed += 1;
        }
        removed
    }

    pub fn clear(&mut self) {
        self.store.clear();
        self.count = 0;
        self.longest_psl = 0;
    }

    pub fn iter(&self) -> crate::map::Iter<'_, K, V> {
        crate::map::Iter::over(self.store.raw())
    }

    /// First slot of the hash group for `hash`, if any entry with that
    /// hash exists.
    fn group_start(&self, hash: u32) -> Option<usize> {
        let home = self.mapper.bucket(hash);
        let end = (home + self.longest_psl as usize).min(self.store.len() - 1);
        for i in home..=end {
            match self.store.slot(i) {
                None => return None,
                Some(slot) if slot.hash == hash => return Some(i),
                Some(_) => {}
            }
        }
        None
    }

    /// Number of entries currently in the hash group for `hash`.
    fn group_len(&self, hash: u32) -> usize {
        let Some(start) = self.group_start(hash) else {
            return 0;
        };
        let mut n = 0;
        let mut i = start;
        while i < self.store.len() {
            match self.store.slot(i) {
                Some(slot) if slot.hash == hash => n += 1,
                _ => break,
            }
            i += 1;
        }
        n
    }

    /// First entry matching `key`, scanning only its hash group.
    fn find_index<Q>(&self, hash: u32, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut i = self.group_start(hash)?;
        while i < self.store.len() {
            match self.store.slot(i) {
                Some(slot) if slot.hash == hash => {
                    if slot.key.borrow() == key {
                        return Some(i);
                    }
                }
                _ => return None,
            }
            i += 1;
        }
        None
    }

    /// Displacement walk with the group special-cases. A candidate counts
    /// the same-hash slots it walks over: the PSL allowance stretches by
    /// that amount (a resize cannot pull identical hashes apart, so the
    /// group's own length must not trigger one), and once past its group
    /// the candidate displaces on PSL ties to keep the group contiguous.
    fn place(&mut self, mut candidate: Slot<K, V>) -> Result<(), Slot<K, V>> {
        let mut i = self.mapper.bucket(candidate.hash);
        let mut group_passed: u32 = 0;
        loop {
            if candidate.psl >= self.max_psl + group_passed || i == self.store.len() {
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
                    if occupant.hash == candidate.hash {
                        group_passed += 1;
                    } else if candidate.psl > occupant.psl
                        || (candidate.psl == occupant.psl && group_passed > 0)
                    {
                        self.longest_psl = self.longest_psl.max(candidate.psl);
                        core::mem::swap(occupant, &mut candidate);
                        group_passed = 0;
                    }
                }
            }
            i += 1;
            candidate.psl += 1;
        }
    }

    fn grow(&mut self) {
        let mut pending: Vec<Slot<K, V>> = self.store.drain().collect();
        // Pop order is back-to-front; reversing keeps table order, so a
        // hash group re-forms in the same entry order after the rehash.
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

    /// Structural self-check used by the test suites: slot/PSL consistency
    /// plus hash-group contiguity.
    #[cfg(any(test, debug_assertions))]
    pub(crate) fn check_invariants(&self) {
        self.store.verify(self.count, &self.mapper);
        self.store.verify_groups();
        assert!(
            self.count <= self.resize_at,
            "load factor exceeded: {} entries at capacity {}",
            self.count,
            self.capacity
        );
    }
}

/// Iterator over every value stored for one key.
pub struct GetAll<'a, K, V, Q: ?Sized> {
    slots: &'a [Option<Slot<K, V>>],
    i: usize,
    hash: u32,
    key: &'a Q,
}

impl<'a, K, V, Q> Iterator for GetAll<'a, K, V, Q>
where
    K: Borrow<Q>,
    Q: ?Sized + Eq,
{
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        while self.i < self.slots.len() {
            match &self.slots[self.i] {
                Some(slot) if slot.hash == self.hash => {
                    self.i += 1;
                    if slot.key.borrow() == self.key {
                        return Some(&slot.value);
                    }
                }
                // Group boundary: no further match can exist.
                _ => return None,
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::hash::{BuildHasher, Hasher};

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0xA000_0000
        }
    }

    /// Invariant: duplicate keys accumulate; `get` yields the first entry
    /// and `get_all` yields every entry for the key.
    #[test]
    fn duplicate_keys_accumulate() {
        let mut m = RobinMultiMap::new();
        m.insert(7u64, "a").unwrap();
        m.insert(7u64, "b").unwrap();
        m.insert(7u64, "c").unwrap();
        m.insert(8u64, "x").unwrap();
        assert_eq!(m.len(), 4);
        assert_eq!(m.get(&7), Some(&"a"));
        let all: Vec<&str> = m.get_all(&7).copied().collect();
        assert_eq!(all, ["a", "b", "c"]);
        let only: Vec<&str> = m.get_all(&8).copied().collect();
        assert_eq!(only, ["x"]);
        assert!(m.get_all(&9).next().is_none());
        m.check_invariants();
    }

    /// Invariant: hash groups stay contiguous when arrivals interleave —
    /// the tie-displacement special case is what prevents a later key from
    /// splitting an earlier key's group.
    #[test]
    fn interleaved_inserts_keep_groups_contiguous() {
        let mut m: RobinMultiMap<u64, u64> = RobinMultiMap::new();
        for round in 0..6u64 {
            for key in 0..40u64 {
                m.insert(key, round).unwrap();
            }
            m.check_invariants();
        }
        for key in 0..40u64 {
            let values: Vec<u64> = m.get_all(&key).copied().collect();
            assert_eq!(values.len(), 6, "key {key}");
        }
    }

    /// Invariant: same under full hash collision — different keys sharing
    /// one hash live in one group and are told apart by `Eq`.
    #[test]
    fn colliding_keys_resolved_by_eq() {
        let mut m: RobinMultiMap<u64, u64, ConstBuildHasher> =
            RobinMultiMap::with_hasher(ConstBuildHasher);
        for key in 0..5u64 {
            m.insert(key, key * 10).unwrap();
            m.insert(key, key * 10 + 1).unwrap();
        }
        m.check_invariants();
        for key in 0..5u64 {
            let values: Vec<u64> = m.get_all(&key).copied().collect();
            assert_eq!(values, [key * 10, key * 10 + 1]);
        }
    }

    /// Invariant: `remove` drops exactly the first entry for the key;
    /// `remove_all` drains the group and reports the count.
    #[test]
    fn remove_first_and_remove_all() {
        let mut m = RobinMultiMap::new();
        for v in 0..4u64 {
            m.insert(1u64, v).unwrap();
        }
        m.insert(2u64, 99).unwrap();

        assert!(m.remove(&1));
        m.check_invariants();
        let rest: Vec<u64> = m.get_all(&1).copied().collect();
        assert_eq!(rest, [1, 2, 3]);
        assert_eq!(m.len(), 4);

        assert_eq!(m.remove_all(&1), 3);
        assert!(!m.contains_key(&1));
        assert!(!m.remove(&1));
        assert_eq!(m.get(&2), Some(&99));
        assert_eq!(m.len(), 1);
        m.check_invariants();
    }

    /// Invariant: `update` rewrites the first matching entry in place and
    /// leaves the rest of the group alone.
    #[test]
    fn update_first_entry() {
        let mut m = RobinMultiMap::new();
        m.insert(5u64, 1).unwrap();
        m.insert(5u64, 2).unwrap();
        assert!(m.update(&5, 100));
        assert!(!m.update(&6, 0));
        let values: Vec<i32> = m.get_all(&5).copied().collect();
        assert_eq!(values, [100, 2]);
        m.check_invariants();
    }

    /// Invariant: growth preserves the whole multiset of entries.
    #[test]
    fn growth_preserves_multiset() {
        let mut m: RobinMultiMap<u64, u64> = RobinMultiMap::with_load_factor(16, 0.5);
        for key in 0..30u64 {
            m.insert(key % 10, key).unwrap();
        }
        assert!(m.capacity() > 16);
        assert_eq!(m.len(), 30);
        for key in 0..10u64 {
            let mut values: Vec<u64> = m.get_all(&key).copied().collect();
            values.sort_unstable();
            assert_eq!(values, [key, key + 10, key + 20]);
        }
        m.check_invariants();
    }

    /// Invariant: exceeding the per-group ceiling is a hard, reported
    /// failure; the map is left at the ceiling, nothing silently dropped.
    #[test]
    fn group_ceiling_is_hard_failure() {
        let mut m: RobinMultiMap<u64, usize> = RobinMultiMap::new();
        for n in 0..GROUP_CEILING {
            m.insert(42, n).unwrap();
        }
        assert_eq!(
            m.insert(42, GROUP_CEILING),
            Err(InsertError::KeyGroupOverflow)
        );
        assert_eq!(m.len(), GROUP_CEILING);
        assert_eq!(m.get_all(&42).count(), GROUP_CEILING);
        m.check_invariants();
    }

    /// Invariant: the occupancy ratio never exceeds the configured load
    /// factor, even when one doubling per insert cannot restore the bound.
    #[test]
    fn tiny_load_factor_keeps_ratio_bounded() {
        let mut m: RobinMultiMap<u64, u64> = RobinMultiMap::with_load_factor(16, 0.01);
        for v in 0u64..5 {
            m.insert(v % 2, v).unwrap();
            assert!(
                m.len() as f64 <= m.capacity() as f64 * 0.01,
                "{} entries at capacity {}",
                m.len(),
                m.capacity()
            );
            m.check_invariants();
        }
        assert_eq!(m.get_all(&0).count(), 3);
        assert_eq!(m.get_all(&1).count(), 2);
    }

    /// Invariant: `clear` is idempotent and the map is reusable after.
    #[test]
    fn clear_idempotent() {
        let mut m = RobinMultiMap::new();
        for v in 0..10u64 {
            m.insert(v % 3, v).unwrap();
        }
        m.clear();
        m.clear();
        assert_eq!(m.len(), 0);
        assert!(m.get_all(&0).next().is_none());
        m.insert(0u64, 7).unwrap();
        assert_eq!(m.get(&0), Some(&7));
        m.check_invariants();
    }
}
