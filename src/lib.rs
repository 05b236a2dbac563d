//! robin-map: Robin Hood open-addressing hash maps with bounded probe
//! lengths, backward-shift deletion, and Fibonacci index derivation.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: build the map family in safe, verifiable layers so each piece
//!   can be reasoned about independently.
//! - Layers:
//!   - index::BucketMapper: multiplicative (Fibonacci) hashing — a
//!     wraparound multiply by a golden-ratio constant plus a shift derived
//!     from capacity maps 32-bit hashes to home buckets without modulo.
//!   - probe: the PSL (probe-sequence-length) bound policy. The bound is a
//!     resize trigger, never a hard displacement limit.
//!   - slot::SlotStore: contiguous slot array of `capacity + max_psl + 1`
//!     entries; the trailing guard region absorbs probe runs near the tail
//!     so probing needs no wraparound arithmetic.
//!   - RobinMap<K, V, S>: single-value map. Insertion displaces occupants
//!     closer to home than the candidate ("steal from the rich"), which
//!     keeps PSL values non-decreasing along every probe run; removal
//!     backward-shifts displaced successors instead of leaving tombstones.
//!   - RobinMultiMap<K, V, S>: several entries per key; entries sharing a
//!     stored hash stay contiguous so per-key scans stop at the group
//!     boundary; a hard per-group ceiling is reported, never silent.
//!
//! Constraints
//! - Single-threaded, synchronous, non-reentrant: every operation runs to
//!   completion before another starts; concurrent mutation is the caller's
//!   bug, not a supported mode (a lock-free engine is a different crate's
//!   problem).
//! - Present/absent/duplicate are value-level results (`bool`/`Option`) on
//!   the hot path. Only contract violations are hard failures: indexing an
//!   absent key panics, exceeding the multimap group ceiling errors, and
//!   allocation failure during a resize aborts. No retry logic anywhere.
//! - Resize is a full rehash into a fresh table, atomic from the caller's
//!   perspective; no operation ever observes a half-migrated table.
//!
//! Hasher and rehashing invariants
//! - Each slot stores its folded 32-bit hash. Indexing and rehashing use
//!   the stored hash, so `K: Hash` runs exactly once per keyed operation
//!   and never during a resize. Lookups reject on the stored hash before
//!   invoking `K: Eq`.
//!
//! Notes and non-goals
//! - No persistence, no thread safety, no SIMD bucket-group layout.
//! - Keys need a total equality relation; keys are immutable post-insert.
//! - Iteration is read-only and yields occupied slots in table order.

mod hash;
mod index;
pub mod map;
mod map_proptest;
pub mod multi_map;
mod multi_map_proptest;
mod probe;
mod slot;

// Public surface
pub use hash::{DefaultHashBuilder, IntMixBuildHasher, IntMixHasher};
pub use map::RobinMap;
pub use multi_map::{InsertError, RobinMultiMap};
