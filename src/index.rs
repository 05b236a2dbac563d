//! Bucket index derivation via multiplicative (Fibonacci) hashing.
//!
//! A hash code is multiplied by a constant near `2^32 / φ` and the high
//! bits are kept by a right shift, so small sequential keys spread across
//! the full bucket range without a division or modulo. The mapper is pure
//! and total for every 32-bit input; it carries no state beyond the shift
//! derived from the table capacity.

/// `2^32 / φ`, rounded. Odd, so multiplication modulo `2^32` is a bijection.
pub(crate) const GOLDEN_RATIO: u32 = 0x9E37_79B9;

/// Maps 32-bit hash codes onto bucket indices for one table geometry.
///
/// Rebuilt whenever the table capacity changes; never mutated in place.
#[derive(Copy, Clone, Debug)]
pub(crate) struct BucketMapper {
    shift: u32,
}

impl BucketMapper {
    /// `capacity` must be a power of two of at least 2.
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity.is_power_of_two() && capacity >= 2);
        let log2 = capacity.trailing_zeros();
        Self {
            shift: 32 - log2 + 1,
        }
    }

    /// Home bucket for `hash`. Always in `[0, capacity / 2)`.
    #[inline]
    pub(crate) fn bucket(&self, hash: u32) -> usize {
        (hash.wrapping_mul(GOLDEN_RATIO) >> self.shift) as usize
    }
}

/// Folds a 64-bit hasher output down to the 32 bits the mapper consumes,
/// mixing the high half in so `BuildHasher`s that concentrate entropy in
/// the upper bits are not penalized.
#[inline]
pub(crate) fn fold_hash(hash: u64) -> u32 {
    (hash ^ (hash >> 32)) as u32
}
