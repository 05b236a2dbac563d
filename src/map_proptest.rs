#![cfg(test)]

// Property tests for RobinMap kept inside the crate so they can drive the
// structural self-check after every operation.

use crate::RobinMap;
use hashbrown::HashMap;
use proptest::prelude::*;
use std::collections::BTreeMap;

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// keys, pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i64),
    Update(usize, i64),
    Remove(usize),
    Get(usize),
    Contains(usize),
    Iterate,
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<u64>, Vec<OpI>)> {
    proptest::collection::vec(any::<u64>(), 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            8 => (idx.clone(), any::<i64>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            4 => (idx.clone(), any::<i64>()).prop_map(|(i, v)| OpI::Update(i, v)),
            4 => idx.clone().prop_map(OpI::Remove),
            4 => idx.clone().prop_map(OpI::Get),
            2 => idx.clone().prop_map(OpI::Contains),
            1 => Just(OpI::Iterate),
            1 => Just(OpI::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run_state_machine<S>(pool: Vec<u64>, ops: Vec<OpI>, mut sut: RobinMap<u64, i64, S>) -> Result<(), TestCaseError>
where
    S: core::hash::BuildHasher,
{
    let mut model: HashMap<u64, i64> = HashMap::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = pool[i];
                let fresh = !model.contains_key(&k);
                prop_assert_eq!(sut.insert(k, v), fresh, "insert parity for key {}", k);
                if fresh {
                    model.insert(k, v);
                } else {
                    // Duplicate insert must leave the stored value alone.
                    prop_assert_eq!(sut.get(&k), model.get(&k));
                }
            }
            OpI::Update(i, v) => {
                let k = pool[i];
                let present = model.contains_key(&k);
                prop_assert_eq!(sut.update(&k, v), present);
                if present {
                    model.insert(k, v);
                }
            }
            OpI::Remove(i) => {
                let k = pool[i];
                prop_assert_eq!(sut.remove(&k), model.remove(&k).is_some());
                prop_assert!(sut.get(&k).is_none(), "removed key must not resolve");
            }
            OpI::Get(i) => {
                let k = pool[i];
                prop_assert_eq!(sut.get(&k), model.get(&k));
            }
            OpI::Contains(i) => {
                let k = pool[i];
                prop_assert_eq!(sut.contains_key(&k), model.contains_key(&k));
            }
            OpI::Iterate => {
                let s: BTreeMap<u64, i64> = sut.iter().map(|(&k, &v)| (k, v)).collect();
                let m: BTreeMap<u64, i64> = model.iter().map(|(&k, &v)| (k, v)).collect();
                prop_assert_eq!(s, m);
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
            }
        }

        // Post-conditions after each op: size parity and the structural
        // invariants (PSL-distance consistency, no gaps on probe paths,
        // count equal to a full occupied-slot scan, load-factor bound).
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        sut.check_invariants();
    }
    Ok(())
}

// Property: State-machine equivalence against hashbrown::HashMap across
// random operation sequences, under the default hasher.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_state_machine(pool, ops, RobinMap::new())?;
    }
}

// Worst-case collision variant: a constant hasher funnels every key into
// one displacement chain, stressing eviction, backward shift, and the
// PSL-overflow resize path.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl core::hash::BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl core::hash::Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_state_machine(pool, ops, RobinMap::with_hasher(ConstBuildHasher))?;
    }
}

// Higher load factors switch the PSL bound to the lookup-table policy;
// the same equivalence must hold there.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_high_load_factor((pool, ops) in arb_scenario()) {
        run_state_machine(pool, ops, RobinMap::with_load_factor(16, 0.875))?;
    }
}

// Tiny load factors force several doublings per admitted entry; the
// occupancy bound (checked inside check_invariants after every op) must
// hold across the whole sequence.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_small_load_factor((pool, ops) in arb_scenario()) {
        run_state_machine(pool, ops, RobinMap::with_load_factor(16, 0.05))?;
    }
}
