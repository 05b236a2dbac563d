// RobinMultiMap integration suite (public API only).
//
// Core invariants exercised:
// - Multiplicity: every inserted (key, value) pair stays retrievable via
//   get_all until removed; len counts entries, not keys.
// - Group scans: get/get_all only ever see values of the queried key, even
//   when different keys share a hash.
// - Ceiling: overflowing a hash group is a reported error, not a drop.
use robin_map::{InsertError, RobinMultiMap};
use std::collections::HashMap;

// Test: multiset equivalence against a per-key Vec model across inserts,
// single removes, and full-group removes.
#[test]
fn multiset_against_reference() {
    let mut sut: RobinMultiMap<u64, u64> = RobinMultiMap::new();
    let mut model: HashMap<u64, Vec<u64>> = HashMap::new();

    for i in 0..3000u64 {
        let k = i % 40;
        sut.insert(k, i).unwrap();
        model.entry(k).or_default().push(i);
    }
    // Drop a few whole groups.
    for k in [3u64, 17, 39] {
        let expected = model.remove(&k).map_or(0, |v| v.len());
        assert_eq!(sut.remove_all(&k), expected);
    }

    let model_len: usize = model.values().map(Vec::len).sum();
    assert_eq!(sut.len(), model_len);
    for (k, values) in &model {
        let mut got: Vec<u64> = sut.get_all(k).copied().collect();
        got.sort_unstable();
        let mut expected = values.clone();
        expected.sort_unstable();
        assert_eq!(&got, &expected, "key {k}");
    }
}

// Test: single remove takes exactly one entry out of a group; repeated
// removes drain it and then report absence.
#[test]
fn remove_drains_one_at_a_time() {
    let mut m = RobinMultiMap::new();
    for v in 0..5u32 {
        m.insert("dup", v).unwrap();
    }
    for remaining in (0..5usize).rev() {
        assert!(m.remove(&"dup"));
        assert_eq!(m.get_all(&"dup").count(), remaining);
    }
    assert!(!m.remove(&"dup"));
    assert!(m.is_empty());
}

// Test: string keys, growth, and per-key scans interact correctly.
#[test]
fn string_keys_with_growth() {
    let mut m: RobinMultiMap<String, usize> = RobinMultiMap::with_capacity(16);
    for i in 0..500usize {
        m.insert(format!("bucket-{}", i % 20), i).unwrap();
    }
    assert!(m.capacity() > 16);
    assert_eq!(m.len(), 500);
    for b in 0..20usize {
        let key = format!("bucket-{b}");
        assert_eq!(m.get_all(key.as_str()).count(), 25);
        assert!(m.contains_key(key.as_str()));
    }
    assert!(!m.contains_key("bucket-20"));
}

// Test: the per-group ceiling reports KeyGroupOverflow and leaves the
// group intact at the ceiling.
#[test]
fn group_overflow_reported() {
    let mut m: RobinMultiMap<u32, u32> = RobinMultiMap::new();
    let mut inserted = 0u32;
    let err = loop {
        match m.insert(9, inserted) {
            Ok(()) => inserted += 1,
            Err(e) => break e,
        }
    };
    assert_eq!(err, InsertError::KeyGroupOverflow);
    assert_eq!(m.len(), inserted as usize);
    assert_eq!(m.get_all(&9).count(), inserted as usize);
    // Other keys are unaffected by one saturated group.
    m.insert(10, 1).unwrap();
    assert_eq!(m.get(&10), Some(&1));
}

// Test: update rewrites one entry; the rest of the group is untouched.
#[test]
fn update_touches_first_only() {
    let mut m = RobinMultiMap::new();
    m.insert(1u64, 10).unwrap();
    m.insert(1u64, 20).unwrap();
    m.insert(1u64, 30).unwrap();
    assert!(m.update(&1, 99));
    let mut values: Vec<i32> = m.get_all(&1).copied().collect();
    values.sort_unstable();
    assert_eq!(values, [20, 30, 99]);
}
