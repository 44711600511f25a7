#![cfg(test)]

// Property tests for every backend, kept inside the crate so the AVL
// consistency check and the cuckoo placement accessors are reachable.

use crate::avl::AvlMap;
use crate::closed_addressing::ClosedAddressingMap;
use crate::cuckoo::{CuckooMap, Side};
use crate::error::MapError;
use crate::key::{modulo_hash, multiplicative_hash};
use crate::map::{Backend, Map};
use crate::open_addressing::OpenAddressingMap;
use proptest::prelude::*;
use std::collections::{BTreeMap, VecDeque};

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Remove(usize),
    Search(usize),
}

fn arb_scenario(keys: std::ops::Range<i64>) -> impl Strategy<Value = (Vec<i64>, Vec<Op>)> {
    proptest::collection::btree_set(keys, 1..=8).prop_flat_map(|pool| {
        let pool: Vec<i64> = pool.into_iter().collect();
        let idx = 0..pool.len();
        let op = prop_oneof![
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            idx.clone().prop_map(Op::Remove),
            idx.prop_map(Op::Search),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Property: open addressing agrees with a unique-key model, including the
// order of its capacity and duplicate checks.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_open_addressing((pool, ops) in arb_scenario(-50..50), capacity in 1usize..10) {
        let mut sut: OpenAddressingMap<i64, i32> = OpenAddressingMap::with_capacity(capacity).unwrap();
        let mut model: BTreeMap<i64, i32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(i, v) => {
                    let k = pool[i];
                    let res = sut.insert(k, v);
                    if model.len() == capacity {
                        prop_assert_eq!(res, Err(MapError::CapacityExhausted { capacity }));
                    } else if model.contains_key(&k) {
                        prop_assert_eq!(res, Err(MapError::DuplicateKey));
                    } else {
                        prop_assert_eq!(res, Ok(()));
                        model.insert(k, v);
                    }
                }
                Op::Remove(i) => {
                    let k = pool[i];
                    let res = sut.remove(&k);
                    match model.remove(&k) {
                        Some(_) => prop_assert_eq!(res, Ok(())),
                        None => prop_assert_eq!(res, Err(MapError::NotFound)),
                    }
                }
                Op::Search(i) => {
                    let k = pool[i];
                    prop_assert_eq!(sut.search(&k).ok(), model.get(&k));
                }
            }
            prop_assert_eq!(sut.len(), model.len());
            prop_assert!(sut.len() + sut.tombstones() <= capacity);
        }
        for (k, v) in &model {
            prop_assert_eq!(sut.search(k), Ok(v));
        }
    }
}

// Property: closed addressing keeps every inserted pair; per key, search
// and remove act on the oldest surviving value.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_closed_addressing((pool, ops) in arb_scenario(-50..50), buckets in 1usize..8) {
        let mut sut: ClosedAddressingMap<i64, i32> = ClosedAddressingMap::with_capacity(buckets).unwrap();
        let mut model: BTreeMap<i64, VecDeque<i32>> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(i, v) => {
                    let k = pool[i];
                    sut.insert(k, v);
                    model.entry(k).or_default().push_back(v);
                }
                Op::Remove(i) => {
                    let k = pool[i];
                    let expected = model.get_mut(&k).and_then(VecDeque::pop_front);
                    prop_assert_eq!(sut.remove(&k).map(|(_, v)| v), expected);
                }
                Op::Search(i) => {
                    let k = pool[i];
                    let expected = model.get(&k).and_then(|q| q.front());
                    prop_assert_eq!(sut.search(&k).ok(), expected);
                }
            }
            let total: usize = model.values().map(VecDeque::len).sum();
            prop_assert_eq!(sut.len(), total);
        }
        // Every entry sits in the bucket its key hashes to.
        for b in 0..sut.bucket_count() {
            for (k, _) in sut.bucket(b).unwrap().iter() {
                prop_assert_eq!(modulo_hash(k, buckets), b);
            }
        }
    }
}

// Property: cuckoo hashing agrees with a first-write-wins model and every
// key sits at one of its two candidate slots.
//
// Keys stay below 1000 so that any growth sequence reaches a capacity where
// all first-array positions are distinct well before the rehash limit.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_cuckoo((pool, ops) in arb_scenario(0..1000), capacity in 2usize..12) {
        let mut sut: CuckooMap<i64, i32> = CuckooMap::with_capacity(capacity).unwrap();
        let mut model: BTreeMap<i64, i32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(i, v) => {
                    let k = pool[i];
                    prop_assert_eq!(sut.insert(k, v), Ok(()));
                    model.entry(k).or_insert(v);
                }
                Op::Remove(i) => {
                    let k = pool[i];
                    prop_assert_eq!(sut.remove(&k).map(|(_, v)| v), model.remove(&k));
                }
                Op::Search(i) => {
                    let k = pool[i];
                    prop_assert_eq!(sut.search(&k).ok(), model.get(&k));
                }
            }
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.capacity(), capacity << sut.rehash_count());
        }
        let cap = sut.capacity();
        for (side, slot, k, _) in sut.iter() {
            let home = match side {
                Side::First => modulo_hash(k, cap),
                Side::Second => multiplicative_hash(k, cap),
            };
            prop_assert_eq!(home, slot);
            prop_assert_eq!(sut.position(k), Some((side, slot)));
        }
    }
}

// Property: the AVL tree agrees with an ordered model and stays balanced
// after every operation.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_avl((pool, ops) in arb_scenario(-1_000_000..1_000_000)) {
        let mut sut: AvlMap<i64, i32> = AvlMap::new();
        let mut model: BTreeMap<i64, i32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(i, v) => {
                    let k = pool[i];
                    let fresh = !model.contains_key(&k);
                    prop_assert_eq!(sut.insert(k, v), fresh);
                    model.entry(k).or_insert(v);
                }
                Op::Remove(i) => {
                    let k = pool[i];
                    match model.remove(&k) {
                        Some(v) => prop_assert_eq!(sut.remove(&k), Ok(v)),
                        None => prop_assert_eq!(sut.remove(&k), Err(MapError::NotFound)),
                    }
                }
                Op::Search(i) => {
                    let k = pool[i];
                    prop_assert_eq!(sut.search(&k).ok(), model.get(&k));
                }
            }
            sut.check_consistency();
            prop_assert_eq!(sut.len(), model.len());
        }
        prop_assert_eq!(format!("{:?}", sut), format!("{:?}", model));
    }
}

// Property: through the trait object, a fresh key is always searchable
// right after a successful insert and gone right after a successful remove.
proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]
    #[test]
    fn prop_trait_object_insert_remove(keys in proptest::collection::btree_set(0u32..500, 1..40)) {
        for backend in Backend::ALL {
            let mut m: Box<dyn Map<u32, u32>> = backend.build(64).unwrap();
            for &k in &keys {
                m.insert(k, k + 1).unwrap();
                prop_assert_eq!(m.search(&k), Ok(&(k + 1)));
            }
            prop_assert_eq!(m.len(), keys.len());
            for &k in &keys {
                m.remove(&k).unwrap();
                prop_assert_eq!(m.search(&k), Err(MapError::NotFound));
            }
            prop_assert!(m.is_empty());
        }
    }
}
