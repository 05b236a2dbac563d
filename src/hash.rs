//! Hashers for the map family.
//!
//! The default build hasher for arbitrary keys is re-exported from
//! hashbrown. For numeric keys, `IntMixBuildHasher` skips the streaming
//! hasher machinery: each integer write folds into the state with an
//! fx-style multiply, pre-mixed with a 16-bit shift-xor to break stride
//! patterns in sequential or strided key sets.

use core::hash::{BuildHasher, Hasher};

/// Default hasher for keys without a specialized mixer.
pub use hashbrown::hash_map::DefaultHashBuilder;

const SEED: u64 = 0x517c_c1b7_2722_0a95;

#[inline]
fn mix(state: u64, word: u64) -> u64 {
    let word = word ^ (word >> 16);
    (state.rotate_left(5) ^ word).wrapping_mul(SEED)
}

/// Specialized mixer for integer keys.
///
/// Deterministic across instances (no per-instance seed), which keeps
/// bucket layouts reproducible in tests and benchmarks.
#[derive(Copy, Clone, Debug, Default)]
pub struct IntMixBuildHasher;

impl BuildHasher for IntMixBuildHasher {
    type Hasher = IntMixHasher;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        IntMixHasher { state: 0 }
    }
}

/// Hasher produced by [`IntMixBuildHasher`].
#[derive(Debug)]
pub struct IntMixHasher {
    state: u64,
}

impl Hasher for IntMixHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.state
    }

    // Byte-slice fallback for composite keys; integer keys hit the
    // fixed-width paths below.
    fn write(&mut self, bytes: &[u8]) {
        for chunk in bytes.chunks(8) {
            let mut word = [0u8; 8];
            word[..chunk.len()].copy_from_slice(chunk);
            self.state = mix(self.state, u64::from_le_bytes(word));
        }
    }

    #[inline]
    fn write_u8(&mut self, i: u8) {
        self.state = mix(self.state, i as u64);
    }
    #[inline]
    fn write_u16(&mut self, i: u16) {
        self.state = mix(self.state, i as u64);
    }
    #[inline]
    fn write_u32(&mut self, i: u32) {
        self.state = mix(self.state, i as u64);
    }
    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.state = mix(self.state, i);
    }
    #[inline]
    fn write_u128(&mut self, i: u128) {
        self.state = mix(mix(self.state, i as u64), (i >> 64) as u64);
    }
    #[inline]
    fn write_usize(&mut self, i: usize) {
        self.state = mix(self.state, i as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::hash::BuildHasher;

    /// Invariant: hashing is deterministic across hasher instances, as the
    /// table requires for the lifetime of its stored hashes.
    #[test]
    fn deterministic_across_instances() {
        let b = IntMixBuildHasher;
        assert_eq!(b.hash_one(12345u64), b.hash_one(12345u64));
        assert_eq!(b.hash_one(-7i32), IntMixBuildHasher.hash_one(-7i32));
    }

    /// Invariant: sequential integers produce distinct hashes (the premix
    /// keeps the multiply bijective per word).
    #[test]
    fn sequential_keys_distinct() {
        let b = IntMixBuildHasher;
        let hashes: std::collections::BTreeSet<u64> =
            (0u64..1000).map(|k| b.hash_one(k)).collect();
        assert_eq!(hashes.len(), 1000);
    }

    /// Invariant: the extremes of the integer range hash to distinct values.
    #[test]
    fn extreme_keys_distinct() {
        let b = IntMixBuildHasher;
        assert_ne!(b.hash_one(i32::MIN), b.hash_one(i32::MAX));
        assert_ne!(b.hash_one(i64::MIN), b.hash_one(i64::MAX));
    }
}
