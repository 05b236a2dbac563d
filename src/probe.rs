//! Probe-sequence-length (PSL) bound policy.
//!
//! The bound is a resize trigger, not a hard displacement limit: when an
//! insertion would push a candidate past the bound, the table grows and
//! the insertion retries. Two policies apply:
//!
//! - load factor at or below one half: `log2(capacity)` — tight bound,
//!   frequent but cheap resizes;
//! - higher load factors: a monotone capacity-to-PSL lookup table that
//!   tolerates longer worst-case probes in exchange for fewer resizes.

/// Bound applied when the capacity has no table entry.
pub(crate) const FALLBACK_PSL: u32 = 96;

/// Maximum allowed PSL for a table of `capacity` slots at `load_factor`.
///
/// `capacity` must be a power of two. Monotone in capacity for a fixed
/// load factor.
pub(crate) fn max_psl(capacity: usize, load_factor: f64) -> u32 {
    if load_factor <= 0.5 {
        return capacity.trailing_zeros();
    }
    match capacity {
        16 => 6,
        32 => 8,
        64 => 10,
        128 => 12,
        256 => 14,
        512 => 16,
        1024 => 20,
        2048 => 24,
        4096 => 28,
        8192 => 32,
        16384 => 36,
        32768 => 40,
        65536 => 48,
        131072 => 56,
        262144 => 64,
        524288 => 72,
        1048576 => 80,
        _ => FALLBACK_PSL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Invariant: the tight policy is exactly `log2(capacity)` whenever the
    /// load factor does not exceed one half.
    #[test]
    fn tight_policy_is_log2() {
        assert_eq!(max_psl(16, 0.5), 4);
        assert_eq!(max_psl(1024, 0.25), 10);
        assert_eq!(max_psl(1 << 20, 0.5), 20);
    }

    /// Invariant: the relaxed policy is monotone in capacity, so growing a
    /// table never shrinks its probe allowance.
    #[test]
    fn relaxed_policy_is_monotone() {
        let mut prev = 0;
        let mut capacity = 16usize;
        while capacity <= 1 << 20 {
            let bound = max_psl(capacity, 0.875);
            assert!(bound >= prev, "bound dropped at capacity {capacity}");
            prev = bound;
            capacity *= 2;
        }
    }

    /// Invariant: capacities beyond the lookup table fall back to the
    /// conservative constant instead of panicking.
    #[test]
    fn unmapped_capacity_falls_back() {
        assert_eq!(max_psl(1 << 21, 0.9), FALLBACK_PSL);
        assert_eq!(max_psl(1 << 30, 0.75), FALLBACK_PSL);
    }

    /// Invariant: the relaxed policy always allows at least as many probes
    /// as the tight policy at the same capacity.
    #[test]
    fn relaxed_at_least_tight() {
        let mut capacity = 16usize;
        while capacity <= 1 << 20 {
            assert!(max_psl(capacity, 0.9) >= max_psl(capacity, 0.5));
            capacity *= 2;
        }
    }
}
