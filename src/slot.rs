//! Slot storage: a contiguous run of fixed-size slots with a guard region.
//!
//! The store holds `capacity + max_psl + 1` slots. The trailing guard
//! region absorbs probe runs that start near the end of the nominal bucket
//! range, so no probe ever wraps around; wraparound arithmetic exists only
//! in home-index derivation. An unoccupied slot is `None`; its former
//! contents are dropped eagerly on removal.

#[cfg(any(test, debug_assertions))]
use crate::index::BucketMapper;

/// One occupied table slot. `psl` is the slot's current distance from the
/// key's home bucket; `hash` is the folded 32-bit hash stored at insertion
/// so the key's `Hash` impl is never re-invoked afterwards (rehashing on
/// resize reuses it, and lookups reject mismatches before touching `Eq`).
#[derive(Debug)]
pub(crate) struct Slot<K, V> {
    pub psl: u32,
    pub hash: u32,
    pub key: K,
    pub value: V,
}

pub(crate) struct SlotStore<K, V> {
    slots: Box<[Option<Slot<K, V>>]>,
    capacity: usize,
}

impl<K, V> SlotStore<K, V> {
    /// Allocates a fresh zeroed store. Allocation failure aborts; there is
    /// no degraded mode.
    pub(crate) fn new(capacity: usize, max_psl: u32) -> Self {
        let len = capacity + max_psl as usize + 1;
        let mut slots = Vec::with_capacity(len);
        slots.resize_with(len, || None);
        Self {
            slots: slots.into_boxed_slice(),
            capacity,
        }
    }

    /// Total slot count including the guard region.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Nominal capacity, excluding the guard region.
    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn slot(&self, i: usize) -> &Option<Slot<K, V>> {
        &self.slots[i]
    }

    #[inline]
    pub(crate) fn slot_mut(&mut self, i: usize) -> &mut Option<Slot<K, V>> {
        &mut self.slots[i]
    }

    #[inline]
    pub(crate) fn take(&mut self, i: usize) -> Option<Slot<K, V>> {
        self.slots[i].take()
    }

    /// Drops every entry and leaves all slots unoccupied.
    pub(crate) fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
    }

    /// Moves every occupied slot out, leaving the store empty.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = Slot<K, V>> + '_ {
        self.slots.iter_mut().filter_map(Option::take)
    }

    /// Raw slot slice, for the public iterators.
    #[inline]
    pub(crate) fn raw(&self) -> &[Option<Slot<K, V>>] {
        &self.slots
    }

    /// Structural self-check, driven by tests after every mutation batch.
    ///
    /// Asserts the invariants the probing logic relies on:
    /// - `psl` of every occupied slot equals its distance from the home
    ///   bucket recomputed from the stored hash;
    /// - no entry sits past an unoccupied slot on its probe path (a lookup
    ///   may stop at the first empty slot);
    /// - the number of occupied slots equals `expected_count`.
    #[cfg(any(test, debug_assertions))]
    pub(crate) fn verify(&self, expected_count: usize, mapper: &BucketMapper) {
        let mut occupied = 0;
        for (i, slot) in self.slots.iter().enumerate() {
            let Some(slot) = slot else { continue };
            occupied += 1;
            let home = mapper.bucket(slot.hash);
            assert_eq!(
                slot.psl,
                (i - home) as u32,
                "slot {i}: psl does not match distance from home {home}"
            );
            if slot.psl > 0 {
                assert!(
                    self.slots[i - 1].is_some(),
                    "slot {i}: displaced entry preceded by an empty slot"
                );
            }
        }
        assert_eq!(occupied, expected_count, "count out of sync with table");
    }

    /// Additional check for the multi-value variant: every run of slots
    /// sharing one stored hash is contiguous in table order.
    #[cfg(any(test, debug_assertions))]
    pub(crate) fn verify_groups(&self) {
        let mut closed: hashbrown::HashSet<u32> = hashbrown::HashSet::new();
        let mut current: Option<u32> = None;
        for slot in self.slots.iter() {
            match slot {
                Some(slot) => {
                    if current != Some(slot.hash) {
                        if let Some(prev) = current {
                            closed.insert(prev);
                        }
                        assert!(
                            !closed.contains(&slot.hash),
                            "hash group 0x{:08x} split across the table",
                            slot.hash
                        );
                        current = Some(slot.hash);
                    }
                }
                None => {
                    if let Some(prev) = current.take() {
                        closed.insert(prev);
                    }
                }
            }
        }
    }
}
