use super::*;

use crate::density::load_percent;
use crate::resize::redistribute;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeSet;

const KEY_DIGITS: u32 = 3;

fn validate_store(s: &BucketStore) {
    let n = s.bucket_count();
    assert!(
        n >= MIN_BUCKETS && n % 2 == 0,
        "bucket count must be even and at least {MIN_BUCKETS}: {n}"
    );
    assert_eq!(s.buckets().len(), n);

    let mut seen = BTreeSet::new();
    for (b, bucket) in s.buckets().iter().enumerate() {
        assert_eq!(bucket.capacity(), s.bucket_capacity());
        let len = bucket.len();
        let slots = bucket.slots();
        assert!(
            slots[..len].iter().all(Option::is_some) && slots[len..].iter().all(Option::is_none),
            "bucket {b} must hold its keys in a dense prefix: {slots:?}"
        );

        let keys: Vec<Key> = bucket.keys().collect();
        assert!(
            keys.windows(2).all(|w| w[0] < w[1]),
            "bucket {b} keys must be strictly increasing: {keys:?}"
        );
        for &k in &keys {
            assert_eq!(s.hash(k).bucket, b, "key {k} stored outside its target bucket");
            assert!(seen.insert(k), "key {k} stored twice");
        }
    }

    for entry in s.overflow().iter() {
        assert_eq!(
            s.hash(entry.key).bucket,
            entry.target_bucket,
            "overflow entry {} has a stale target",
            entry.key
        );
        assert!(
            s.buckets()[entry.target_bucket].is_full(),
            "overflow entry {} targets bucket {} which has room",
            entry.key,
            entry.target_bucket
        );
        assert!(seen.insert(entry.key), "key {} stored twice", entry.key);
    }

    assert_eq!(seen.len(), s.len(), "stored key count must match len");
    assert_eq!(
        s.current_density(),
        load_percent(s.occupied(), n, s.bucket_capacity())
    );
}

fn key_strategy() -> impl Strategy<Value = Key> {
    // A narrow range keeps collisions and overflow frequent.
    100u64..=163
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 4)]
    Insert(#[proptest(strategy = "key_strategy()")] Key),
    #[proptest(weight = 3)]
    Delete(#[proptest(strategy = "key_strategy()")] Key),
    #[proptest(weight = 1)]
    Modify(
        #[proptest(strategy = "key_strategy()")] Key,
        #[proptest(strategy = "key_strategy()")] Key,
    ),
    #[proptest(weight = 2)]
    Search(#[proptest(strategy = "key_strategy()")] Key),
}

fn hash_strategy() -> impl Strategy<Value = HashKind> {
    prop_oneof![
        Just(HashKind::Modulo),
        Just(HashKind::MidSquare),
        Just(HashKind::Folding),
        Just(HashKind::Truncation),
        (hash::MIN_BASE..=hash::MAX_BASE).prop_map(|base| HashKind::BaseChange { base }),
    ]
}

fn config_strategy() -> impl Strategy<Value = StoreConfig> {
    (
        (1usize..=3).prop_map(|half| half * 2),
        1usize..=4,
        5u8..=40,
        50u8..=95,
        prop_oneof![Just(ResizeStrategy::Total), Just(ResizeStrategy::Partial)],
        hash_strategy(),
        prop_oneof![
            Just(SearchProbe::Direct),
            Just(SearchProbe::Linear),
            Just(SearchProbe::Binary),
        ],
        prop_oneof![Just(ModifyMode::TwoPhase), Just(ModifyMode::Atomic)],
    )
        .prop_map(
            |(bucket_count, bucket_capacity, min_density, max_density, strategy, hash, probe, modify_mode)| {
                StoreConfig {
                    bucket_count,
                    bucket_capacity,
                    key_digits: KEY_DIGITS,
                    density: DensityConfig {
                        max_density,
                        min_density,
                        strategy,
                    },
                    hash,
                    probe,
                    modify_mode,
                }
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(config in config_strategy(), ops in prop::collection::vec(any::<Op>(), 0..=500)) {
        let mut s = BucketStore::new(config).expect("generated configs are valid");
        let mut m: BTreeSet<Key> = BTreeSet::new();

        for op in ops {
            match op {
                Op::Insert(key) => {
                    let got = s.insert(key);
                    if m.insert(key) {
                        let outcome = got.expect("fresh key inserts");
                        prop_assert_eq!(outcome.density, s.current_density());
                        if let (Placement::Bucket { bucket, position }, ResizeEvent::None) =
                            (outcome.placement, outcome.resize)
                        {
                            prop_assert_eq!(s.buckets()[bucket].slot(position), Some(key));
                        }
                    } else {
                        prop_assert_eq!(got.err(), Some(HashError::DuplicateKey(key)));
                    }
                }
                Op::Delete(key) => {
                    let got = s.delete(key);
                    if m.remove(&key) {
                        let outcome = got.expect("present key deletes");
                        prop_assert_eq!(outcome.density, s.current_density());
                    } else {
                        prop_assert_eq!(got.err(), Some(HashError::KeyNotFound(key)));
                    }
                }
                Op::Modify(old, new) => {
                    let got = s.modify(old, new);
                    if !m.contains(&old) {
                        prop_assert_eq!(got.err(), Some(HashError::KeyNotFound(old)));
                    } else if m.contains(&new) {
                        prop_assert_eq!(got.err(), Some(HashError::DuplicateKey(new)));
                    } else {
                        got.expect("valid modify succeeds");
                        m.remove(&old);
                        m.insert(new);
                    }
                }
                Op::Search(key) => {
                    let result = s.search(key).expect("valid key searches");
                    prop_assert_eq!(result.found(), m.contains(&key));
                }
            }

            prop_assert_eq!(s.len(), m.len());
            validate_store(&s);
        }

        validate_store(&s);
        let got: BTreeSet<Key> = s.keys().collect();
        prop_assert_eq!(got, m);
    }

    #[test]
    fn prop_playback_is_repeatable(
        config in config_strategy(),
        keys in prop::collection::btree_set(key_strategy(), 0..48),
        target in key_strategy(),
    ) {
        let mut s = BucketStore::new(config).expect("generated configs are valid");
        for &k in &keys {
            s.insert(k).expect("distinct keys insert");
        }

        let result = s.search(target).expect("valid key searches");
        let len = result.log.len();
        prop_assert!(len >= 1, "every search inspects at least one slot");

        let mut cursor = PlaybackCursor::new(result.log.clone());
        prop_assert!(!cursor.is_stale(&s));
        let states: Vec<HighlightState> =
            (0..len).map(|i| cursor.seek(Some(i), &s)).collect();

        // Revisiting an index yields the same state regardless of direction.
        for i in (0..len).rev() {
            prop_assert_eq!(&cursor.seek(Some(i), &s), &states[i]);
        }
        prop_assert_eq!(cursor.seek(None, &s).index, None);
        for state in &states {
            prop_assert_eq!(&cursor.next(&s), state);
        }
        prop_assert!(cursor.is_finished());
        prop_assert_eq!(&cursor.next(&s), &states[len - 1]);
        for i in (0..len - 1).rev() {
            prop_assert_eq!(&cursor.prev(&s), &states[i]);
        }
        prop_assert_eq!(cursor.prev(&s).index, None);

        // The log ends on the key exactly when it sits in its bucket.
        match result.verdict {
            SearchVerdict::InBucket { bucket, position } => {
                prop_assert!(states[len - 1].is_found(bucket, position));
            }
            SearchVerdict::InOverflow { .. } | SearchVerdict::Absent => {
                prop_assert!(states
                    .iter()
                    .all(|st| !st.inspection.as_ref().is_some_and(|i| i.found)));
            }
        }

        if let Some(fresh) = (100..=163).find(|k| !keys.contains(k)) {
            s.insert(fresh).expect("fresh key inserts");
            prop_assert!(cursor.is_stale(&s));
        }
    }

    #[test]
    fn prop_redistribute_keeps_every_key(
        keys in prop::collection::btree_set(100u64..=999, 0..80),
        from in (1usize..=4).prop_map(|half| half * 2),
        to in (1usize..=8).prop_map(|half| half * 2),
        capacity in 1usize..=4,
        hash in hash_strategy(),
    ) {
        let mut seed = OverflowTable::new();
        for &k in &keys {
            seed.push(k, 0);
        }
        let first = redistribute(&[], &seed, from, capacity, hash, KEY_DIGITS);
        let second = redistribute(&first.buckets, &first.overflow, to, capacity, hash, KEY_DIGITS);
        prop_assert_eq!(second.rehashed, keys.len());
        prop_assert_eq!(second.buckets.len(), to);

        let mut got: Vec<Key> = second
            .buckets
            .iter()
            .flat_map(Bucket::keys)
            .chain(second.overflow.iter().map(|e| e.key))
            .collect();
        got.sort_unstable();
        prop_assert_eq!(got, keys.iter().copied().collect::<Vec<_>>());

        for (b, bucket) in second.buckets.iter().enumerate() {
            for k in bucket.keys() {
                prop_assert_eq!(hash.hash(k, to, KEY_DIGITS).bucket, b);
            }
        }
        for entry in second.overflow.iter() {
            prop_assert!(second.buckets[entry.target_bucket].is_full());
        }
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

/// Two buckets of three slots under modulo hashing; thresholds wide enough
/// that five keys never expand, and the floor blocks every reduction.
fn floor_config() -> StoreConfig {
    StoreConfig {
        bucket_count: 2,
        bucket_capacity: 3,
        key_digits: 2,
        density: DensityConfig {
            max_density: 99,
            min_density: 1,
            strategy: ResizeStrategy::Total,
        },
        ..StoreConfig::default()
    }
}

#[test]
fn exhaustive_insert_order_small_set() {
    // Four even keys compete for bucket 0's three slots.
    let keys: Vec<Key> = vec![10, 12, 14, 16, 11];

    for_each_permutation(&keys, |perm| {
        let mut s = BucketStore::new(floor_config()).expect("valid config");
        let mut expected_overflow = None;
        for k in perm {
            let outcome = s.insert(k).expect("distinct keys insert");
            assert_eq!(outcome.resize, ResizeEvent::None);
            if let Placement::Overflow { target_bucket } = outcome.placement {
                assert_eq!(target_bucket, 0);
                expected_overflow = Some(k);
            }
        }

        validate_store(&s);
        assert_eq!(s.bucket_count(), 2);
        // Whichever even key arrived last is the one that spilled.
        let spilled: Vec<Key> = s.overflow().iter().map(|e| e.key).collect();
        assert_eq!(spilled, expected_overflow.into_iter().collect::<Vec<_>>());
        assert_eq!(
            s.keys().collect::<BTreeSet<_>>(),
            keys.iter().copied().collect::<BTreeSet<_>>()
        );
    });
}

#[test]
fn exhaustive_delete_order_small_set() {
    let keys: Vec<Key> = vec![10, 12, 14, 16, 11];

    // Insert in a fixed order, then delete in all permutations.
    let mut base = BucketStore::new(floor_config()).expect("valid config");
    for &k in &keys {
        base.insert(k).expect("distinct keys insert");
    }
    assert_eq!(base.overflow().len(), 1);

    for_each_permutation(&keys, |perm| {
        let mut s = base.clone();
        let mut m: BTreeSet<Key> = keys.iter().copied().collect();

        for k in perm {
            let outcome = s.delete(k).expect("present key deletes");
            assert!(m.remove(&k));
            assert!(matches!(
                outcome.resize,
                ResizeEvent::None | ResizeEvent::ReductionBlocked { bucket_count: 2 }
            ));
            assert_eq!(s.len(), m.len());
            assert_eq!(s.keys().collect::<BTreeSet<_>>(), m);
            validate_store(&s);
        }
        assert!(s.is_empty());
        assert!(s.overflow().is_empty());
    });
}
