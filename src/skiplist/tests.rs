// Copyright (c) Sienna Satterwhite, CesiumDB Contributors
// SPDX-License-Identifier: GPL-3.0-only WITH Classpath-exception-2.0

#[cfg(test)]
mod e2e_tests {
    use std::collections::BTreeMap;

    use proptest::{
        collection::vec,
        prelude::*,
        proptest,
    };
    use rand::{
        rngs::SmallRng,
        Rng,
        SeedableRng,
    };

    use crate::{
        errs::SkipListError,
        skiplist::debug::check,
        SkipList,
    };

    const SIZE: usize = 100;

    /// Builds a list of `size` random pairs along with the same pairs sorted
    /// stably on key, and the values per key in insertion order.
    fn create_skiplist(
        rng: &mut SmallRng,
        size: usize,
        keysize: u32,
        valuesize: u32,
    ) -> (SkipList<u32, u32>, Vec<(u32, u32)>, BTreeMap<u32, Vec<u32>>) {
        let mut list = SkipList::with_seed(rng.gen());
        let mut pairs = Vec::with_capacity(size);
        let mut values: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
        for _ in 0..size {
            let pair = (rng.gen_range(0..=keysize), rng.gen_range(0..=valuesize));
            list.insert(pair.0, pair.1);
            pairs.push(pair);
            values.entry(pair.0).or_default().push(pair.1);
        }
        pairs.sort_by_key(|pair| pair.0);
        (list, pairs, values)
    }

    fn collect(list: &SkipList<u32, u32>) -> Vec<(u32, u32)> {
        list.iter().map(|(k, v)| (*k, *v)).collect()
    }

    fn absent_key(rng: &mut SmallRng) -> u32 {
        rng.gen_range(2 * SIZE as u32 + 1..10 * SIZE as u32)
    }

    #[test]
    fn test_scenario_duplicates() {
        let mut list = SkipList::new();
        list.insert(5, "a");
        list.insert(3, "b");
        list.insert(5, "c");
        check(&list);

        let pairs: Vec<_> = list.range::<i32, _>(..).map(|(k, v)| (*k, *v)).collect();
        assert_eq!(pairs, vec![(3, "b"), (5, "a"), (5, "c")]);
        assert_eq!(list.rank_of(&5), Ok(1));
        assert_eq!(list.count_of(&5), 2);
        assert_eq!(list.get_at(-1), Ok((&5, &"c")));

        list.remove_first(&5).unwrap();
        check(&list);
        let pairs: Vec<_> = list.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(pairs, vec![(3, "b"), (5, "c")]);
    }

    #[test]
    fn test_scenario_empty() {
        let mut list: SkipList<u32, &str> = SkipList::new();
        assert_eq!(list.len(), 0);
        assert!(list.is_empty());
        assert_eq!(list.level(), 1);
        assert_eq!(list.pop_front(), Err(SkipListError::Empty));
        assert_eq!(
            list.get_at(0),
            Err(SkipListError::OutOfRange { index: 0, len: 0 })
        );
        assert!(list.first().is_none());
        assert_eq!(list.iter().count(), 0);
        check(&list);
    }

    #[test]
    fn test_level() {
        let list: SkipList<u32, u32> = SkipList::new();
        assert_eq!(list.level(), 1);
        assert_eq!(list.max_level(), 20);
        check(&list);
    }

    #[test]
    fn test_insert() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut list = SkipList::with_seed(1);
        let mut pairs = Vec::new();
        for _ in 0..SIZE {
            let pair = (rng.gen_range(0..2 * SIZE as u32), rng.gen_range(0..10 * SIZE as u32));
            list.insert(pair.0, pair.1);
            pairs.push(pair);
            pairs.sort_by_key(|pair| pair.0);
            check(&list);
            assert_eq!(collect(&list), pairs);
        }
        assert!(list.level() > 1);
    }

    #[test]
    fn test_replace_first() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut list = SkipList::with_seed(2);
        let mut values = BTreeMap::new();
        for _ in 0..SIZE {
            let pair = (rng.gen_range(0..2 * SIZE as u32), rng.gen_range(0..10 * SIZE as u32));
            list.replace_first(pair.0, pair.1);
            values.insert(pair.0, pair.1);
            check(&list);
            let pairs: Vec<_> = values.iter().map(|(k, v)| (*k, *v)).collect();
            assert_eq!(collect(&list), pairs);
        }
        assert!(list.level() > 1);
    }

    #[test]
    fn test_replace_first_touches_leftmost_only() {
        let mut list = SkipList::new();
        list.insert(1, "a");
        list.insert(1, "b");
        list.replace_first(1, "c");
        assert_eq!(list.len(), 2);
        let values: Vec<_> = list.values().copied().collect();
        assert_eq!(values, vec!["c", "b"]);
        check(&list);
    }

    #[test]
    fn test_clear() {
        let mut rng = SmallRng::seed_from_u64(3);
        let (mut list, _, _) = create_skiplist(&mut rng, SIZE, 2 * SIZE as u32, 10 * SIZE as u32);
        assert!(list.level() > 1);
        assert_eq!(list.len(), SIZE);

        list.clear();
        check(&list);
        assert_eq!(list.len(), 0);
        assert_eq!(list.level(), 1);
        assert_eq!(collect(&list), Vec::<(u32, u32)>::new());

        // the list is fully usable afterwards
        list.insert(7, 7);
        check(&list);
        assert_eq!(collect(&list), vec![(7, 7)]);
    }

    #[test]
    fn test_len() {
        let mut rng = SmallRng::seed_from_u64(4);
        let mut list = SkipList::with_seed(4);
        for i in 0..SIZE {
            list.insert(rng.gen_range(0..2 * SIZE as u32), i as u32);
            assert_eq!(list.len(), i + 1);
            check(&list);
        }
    }

    #[test]
    fn test_debug_format() {
        let mut list = SkipList::new();
        list.insert(1, 2);
        list.insert(3, 4);
        assert_eq!(format!("{:?}", list), "{1: 2, 3: 4}");
    }

    #[test]
    fn test_range() {
        let mut rng = SmallRng::seed_from_u64(5);
        let (list, pairs, _) = create_skiplist(&mut rng, SIZE, SIZE as u32, 10 * SIZE as u32);

        let reference = |start: Option<u32>, stop: Option<u32>| -> Vec<(u32, u32)> {
            pairs
                .iter()
                .filter(|(k, _)| start.map_or(true, |s| *k >= s) && stop.map_or(true, |s| *k < s))
                .copied()
                .collect()
        };
        let pairs_of = |range: crate::Range<'_, u32, u32>| -> Vec<(u32, u32)> {
            range.map(|(k, v)| (*k, *v)).collect()
        };

        assert_eq!(pairs_of(list.range::<u32, _>(..)), reference(None, None));
        assert_eq!(pairs_of(list.range(10..)), reference(Some(10), None));
        assert_eq!(pairs_of(list.range(11..)), reference(Some(11), None));
        assert_eq!(pairs_of(list.range(..90)), reference(None, Some(90)));
        assert_eq!(pairs_of(list.range(..91)), reference(None, Some(91)));
        assert_eq!(pairs_of(list.range(10..90)), reference(Some(10), Some(90)));
        assert_eq!(pairs_of(list.range(..=90)), reference(None, Some(91)));
        assert_eq!(pairs_of(list.range(90..10)), Vec::<(u32, u32)>::new());
        assert_eq!(pairs_of(list.range(500..)), Vec::<(u32, u32)>::new());

        let keys: Vec<u32> = list.range(10..90).keys().copied().collect();
        let expected: Vec<u32> = reference(Some(10), Some(90)).iter().map(|p| p.0).collect();
        assert_eq!(keys, expected);

        let values: Vec<u32> = list.range(10..90).values().copied().collect();
        let expected: Vec<u32> = reference(Some(10), Some(90)).iter().map(|p| p.1).collect();
        assert_eq!(values, expected);

        check(&list);
    }

    #[test]
    fn test_range_excluded_start() {
        use std::ops::Bound::{
            Excluded,
            Included,
        };

        let list: SkipList<_, _> = [(1, 'a'), (2, 'b'), (2, 'c'), (3, 'd')].into_iter().collect();
        let pairs: Vec<_> = list.range((Excluded(1), Included(2))).collect();
        assert_eq!(pairs, vec![(&2, &'b'), (&2, &'c')]);
        let pairs: Vec<_> = list.range((Excluded(2), Included(3))).collect();
        assert_eq!(pairs, vec![(&3, &'d')]);
    }

    #[test]
    fn test_range_is_restartable() {
        let list: SkipList<_, _> = (0..50u32).map(|i| (i, i)).collect();
        let range = list.range(10..20);
        assert_eq!(range.len(), 10);

        let first: Vec<_> = range.clone().collect();
        let second: Vec<_> = range.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 10);
    }

    #[test]
    fn test_pop_front() {
        let mut rng = SmallRng::seed_from_u64(6);
        let (mut list, mut pairs, _) =
            create_skiplist(&mut rng, SIZE, 2 * SIZE as u32, 10 * SIZE as u32);
        while !pairs.is_empty() {
            assert_eq!(list.pop_front(), Ok(pairs.remove(0)));
            check(&list);
            assert_eq!(collect(&list), pairs);
        }
        assert_eq!(list.pop_front(), Err(SkipListError::Empty));
        assert_eq!(list.level(), 1);
        check(&list);
    }

    #[test]
    fn test_search_first() {
        let mut rng = SmallRng::seed_from_u64(7);
        let (list, pairs, values) =
            create_skiplist(&mut rng, SIZE, 2 * SIZE as u32, 10 * SIZE as u32);
        for (key, vals) in values.iter() {
            assert_eq!(list.search_first(key), Some(&vals[0]));
            let absent = absent_key(&mut rng);
            assert_eq!(list.search_first(&absent), None);
            assert_eq!(*list.search_first_or(&absent, &u32::MAX), u32::MAX);
        }
        check(&list);
        assert_eq!(collect(&list), pairs);
    }

    #[test]
    fn test_remove_first() {
        let mut rng = SmallRng::seed_from_u64(8);
        let (mut list, mut pairs, values) =
            create_skiplist(&mut rng, SIZE, 2 * SIZE as u32, 10 * SIZE as u32);
        for (key, vals) in values.iter() {
            for value in vals {
                list.remove_first(key).unwrap();
                let idx = pairs.iter().position(|p| p == &(*key, *value)).unwrap();
                pairs.remove(idx);
                check(&list);
                assert_eq!(collect(&list), pairs);
            }
            assert_eq!(list.remove_first(key), Err(SkipListError::NotFound));
            assert_eq!(list.remove_first(key), Err(SkipListError::NotFound));
            check(&list);
        }
        assert_eq!(list.len(), 0);
        assert_eq!(list.level(), 1);
    }

    #[test]
    fn test_pop_first() {
        let mut rng = SmallRng::seed_from_u64(9);
        let (mut list, mut pairs, values) =
            create_skiplist(&mut rng, SIZE, 2 * SIZE as u32, 10 * SIZE as u32);
        for (key, vals) in values.iter() {
            for value in vals {
                assert_eq!(list.pop_first(key), Ok(*value));
                let idx = pairs.iter().position(|p| p == &(*key, *value)).unwrap();
                pairs.remove(idx);
                check(&list);
                assert_eq!(collect(&list), pairs);
            }
            assert_eq!(list.pop_first(key), Err(SkipListError::NotFound));
            assert_eq!(list.pop_first_or(key, u32::MAX), u32::MAX);
            check(&list);
            assert_eq!(collect(&list), pairs);
        }
    }

    #[test]
    fn test_contains_key() {
        let mut rng = SmallRng::seed_from_u64(10);
        let (list, _, values) = create_skiplist(&mut rng, SIZE, 2 * SIZE as u32, 10 * SIZE as u32);
        for key in values.keys() {
            assert!(list.contains_key(key));
            assert!(!list.contains_key(&absent_key(&mut rng)));
        }
        check(&list);
    }

    #[test]
    fn test_contains_key_after_remove() {
        let mut list = SkipList::new();
        list.insert("k", 1);
        assert_eq!(list.search_first("k"), Some(&1));
        list.remove_first("k").unwrap();
        assert!(!list.contains_key("k"));
        check(&list);
    }

    #[test]
    fn test_rank_of() {
        let mut rng = SmallRng::seed_from_u64(11);
        let (list, pairs, values) =
            create_skiplist(&mut rng, SIZE, 2 * SIZE as u32, 10 * SIZE as u32);
        for (key, vals) in values.iter() {
            let expected = pairs.iter().position(|p| p == &(*key, vals[0])).unwrap();
            assert_eq!(list.rank_of(key), Ok(expected));
            let absent = absent_key(&mut rng);
            assert_eq!(list.rank_of(&absent), Err(SkipListError::NotFound));
            assert_eq!(list.rank_of_or(&absent, usize::MAX), usize::MAX);
        }
        check(&list);
    }

    #[test]
    fn test_count_of() {
        let mut rng = SmallRng::seed_from_u64(12);
        let (list, _, values) = create_skiplist(&mut rng, SIZE, 2 * SIZE as u32, 10 * SIZE as u32);
        for (key, vals) in values.iter() {
            assert_eq!(list.count_of(key), vals.len());
            assert_eq!(list.count_of(&absent_key(&mut rng)), 0);
        }
        check(&list);
    }

    #[test]
    fn test_rank_consistency() {
        let list: SkipList<_, _> = (0..500u32).rev().map(|i| (i * 3, i)).collect();
        for i in 0..list.len() {
            let (key, _) = list.get_at(i as isize).unwrap();
            assert_eq!(list.rank_of(key), Ok(i));
        }
        check(&list);
    }

    #[test]
    fn test_get_at() {
        let mut rng = SmallRng::seed_from_u64(13);
        let (list, pairs, _) = create_skiplist(&mut rng, SIZE, 2 * SIZE as u32, 10 * SIZE as u32);
        for i in 0..SIZE {
            let (k, v) = pairs[i];
            assert_eq!(list.get_at(i as isize), Ok((&k, &v)));
            let (k, v) = pairs[SIZE - i - 1];
            assert_eq!(list.get_at(-(i as isize) - 1), Ok((&k, &v)));
        }
        assert_eq!(
            list.get_at(SIZE as isize),
            Err(SkipListError::OutOfRange {
                index: SIZE as isize,
                len: SIZE
            })
        );
        assert_eq!(
            list.get_at(-(SIZE as isize) - 1),
            Err(SkipListError::OutOfRange {
                index: -(SIZE as isize) - 1,
                len: SIZE
            })
        );
        assert!(list.get_at(isize::MIN).is_err());
        check(&list);
    }

    #[test]
    fn test_range_at() {
        let mut rng = SmallRng::seed_from_u64(14);
        let (list, pairs, _) = create_skiplist(&mut rng, SIZE, 2 * SIZE as u32, 10 * SIZE as u32);
        let pairs_of = |range: crate::Range<'_, u32, u32>| -> Vec<(u32, u32)> {
            range.map(|(k, v)| (*k, *v)).collect()
        };

        assert_eq!(pairs_of(list.range_at(..)), pairs);
        assert_eq!(pairs_of(list.range_at(..10)), pairs[..10].to_vec());
        assert_eq!(pairs_of(list.range_at(10..)), pairs[10..].to_vec());
        assert_eq!(pairs_of(list.range_at(10..90)), pairs[10..90].to_vec());
        assert_eq!(pairs_of(list.range_at(10..=90)), pairs[10..=90].to_vec());
        assert_eq!(pairs_of(list.range_at(90..1_000)), pairs[90..].to_vec());
        assert_eq!(pairs_of(list.range_at(90..10)), Vec::<(u32, u32)>::new());
        assert_eq!(pairs_of(list.range_at((SIZE as isize)..)), Vec::<(u32, u32)>::new());

        // negative positions count from the end
        assert_eq!(pairs_of(list.range_at(-10..)), pairs[90..].to_vec());
        assert_eq!(pairs_of(list.range_at(..-90)), pairs[..10].to_vec());
        assert_eq!(pairs_of(list.range_at(10..-10)), pairs[10..90].to_vec());
        assert_eq!(pairs_of(list.range_at(-1..=-1)), pairs[99..].to_vec());
        assert_eq!(pairs_of(list.range_at(-1_000..5)), pairs[..5].to_vec());
        assert_eq!(pairs_of(list.range_at(..-1_000)), Vec::<(u32, u32)>::new());
        assert_eq!(pairs_of(list.range_at(-5..-10)), Vec::<(u32, u32)>::new());
        check(&list);
    }

    #[test]
    fn test_remove_at() {
        let mut rng = SmallRng::seed_from_u64(15);
        let (mut list, mut pairs, _) =
            create_skiplist(&mut rng, SIZE, 2 * SIZE as u32, 10 * SIZE as u32);
        while !pairs.is_empty() {
            let len = pairs.len() as isize;
            let ix = rng.gen_range(-len..len);
            let expected = pairs.remove(ix.rem_euclid(len) as usize);
            assert_eq!(list.remove_at(ix), Ok(expected));
            check(&list);
            assert_eq!(collect(&list), pairs);

            let len = pairs.len() as isize;
            assert!(list.remove_at(len).is_err());
            assert!(list.remove_at(-len - 1).is_err());
            check(&list);
            assert_eq!(collect(&list), pairs);
        }
        assert_eq!(list.level(), 1);
    }

    #[test]
    fn test_set_value_at() {
        let mut rng = SmallRng::seed_from_u64(16);
        let (mut list, mut pairs, _) =
            create_skiplist(&mut rng, SIZE, 2 * SIZE as u32, 10 * SIZE as u32);
        for ix in 0..pairs.len() {
            let (key, value) = pairs[ix];
            assert_eq!(list.set_value_at(ix as isize, 2 * value), Ok(value));
            pairs[ix] = (key, 2 * value);
            check(&list);
            assert_eq!(collect(&list), pairs);
        }
        assert!(list.set_value_at(SIZE as isize, 0).is_err());
        assert!(list.set_value_at(-(SIZE as isize) - 1, 0).is_err());
        assert_eq!(list.set_value_at(-1, 1), Ok(pairs[SIZE - 1].1));
        check(&list);
    }

    #[test]
    fn test_grow_and_shrink_repeatedly() {
        let mut list = SkipList::with_seed(17);
        for round in 0..20u32 {
            for i in 0..(round * 37) {
                list.insert(i % 13, i);
                check(&list);
            }
            while list.pop_front().is_ok() {
                check(&list);
            }
            assert_eq!(list.len(), 0);
            assert_eq!(list.level(), 1);
        }
    }

    #[test]
    fn test_remove_from_the_back() {
        let mut list: SkipList<u32, u32> = SkipList::with_seed(18);
        list.extend((0..1_000).map(|i| (i, i)));
        check(&list);
        assert!(list.level() > 2);
        for i in (0..1_000).rev() {
            assert_eq!(list.remove_at(-1), Ok((i, i)));
            check(&list);
        }
        assert_eq!(list.level(), 1);
    }

    #[test]
    fn test_into_iter() {
        let list: SkipList<_, _> = [(3, "c"), (1, "a"), (2, "b")].into_iter().collect();
        let mut iter = list.into_iter();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next(), Some((1, "a")));
        assert_eq!(iter.len(), 2);
        assert_eq!(iter.collect::<Vec<_>>(), vec![(2, "b"), (3, "c")]);
    }

    #[test]
    fn test_borrowed_lookups() {
        use std::ops::Bound::{
            Excluded,
            Included,
        };

        let mut list: SkipList<String, u32> = SkipList::new();
        list.insert("beta".to_string(), 2);
        list.insert("alpha".to_string(), 1);
        assert_eq!(list.search_first("alpha"), Some(&1));
        assert_eq!(list.rank_of("beta"), Ok(1));
        assert_eq!(list.range::<str, _>((Included("alpha"), Excluded("beta"))).count(), 1);
        assert_eq!(list.pop_first("alpha"), Ok(1));
        check(&list);
    }

    #[test]
    fn test_eq_and_clone() {
        let list: SkipList<_, _> = (0..100).map(|i| (i, i)).collect();
        let mut copy = list.clone();
        check(&copy);
        assert_eq!(list, copy);
        copy.set_value_at(0, 7).unwrap();
        assert_ne!(list, copy);

        let empty: SkipList<i32, i32> = SkipList::default();
        assert!(empty.is_empty());
        assert_eq!(empty, SkipList::new());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Insert(u8, u16),
        Replace(u8, u16),
        Remove(u8),
        RemoveAt(i16),
        SetAt(i16, u16),
        PopFront,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (any::<u8>(), any::<u16>()).prop_map(|(k, v)| Op::Insert(k, v)),
            1 => (any::<u8>(), any::<u16>()).prop_map(|(k, v)| Op::Replace(k, v)),
            2 => any::<u8>().prop_map(Op::Remove),
            2 => any::<i16>().prop_map(Op::RemoveAt),
            1 => (any::<i16>(), any::<u16>()).prop_map(|(i, v)| Op::SetAt(i, v)),
            1 => Just(Op::PopFront),
        ]
    }

    /// Resolves `rank` against a model of length `len` the way the list does.
    fn model_index(rank: i16, len: usize) -> Option<usize> {
        let rank = rank as isize;
        let idx = if rank < 0 { rank + len as isize } else { rank };
        (0..len as isize).contains(&idx).then_some(idx as usize)
    }

    proptest! {
        #[test]
        fn test_matches_sorted_vec_model(seed in any::<u64>(), ops in vec(op_strategy(), 1..300)) {
            let mut list = SkipList::with_seed(seed);
            // a stable sorted model: equal keys keep insertion order
            let mut model: Vec<(u8, u16)> = Vec::new();

            for op in ops {
                match op {
                    | Op::Insert(k, v) => {
                        list.insert(k, v);
                        let at = model.partition_point(|(mk, _)| *mk <= k);
                        model.insert(at, (k, v));
                    },
                    | Op::Replace(k, v) => {
                        list.replace_first(k, v);
                        let at = model.partition_point(|(mk, _)| *mk < k);
                        match model.get_mut(at) {
                            | Some(entry) if entry.0 == k => entry.1 = v,
                            | _ => model.insert(at, (k, v)),
                        }
                    },
                    | Op::Remove(k) => {
                        let at = model.partition_point(|(mk, _)| *mk < k);
                        if model.get(at).map_or(false, |entry| entry.0 == k) {
                            prop_assert_eq!(list.pop_first(&k), Ok(model.remove(at).1));
                        } else {
                            prop_assert_eq!(list.remove_first(&k), Err(SkipListError::NotFound));
                        }
                    },
                    | Op::RemoveAt(rank) => match model_index(rank, model.len()) {
                        | Some(idx) => {
                            prop_assert_eq!(list.remove_at(rank as isize), Ok(model.remove(idx)));
                        },
                        | None => {
                            prop_assert!(list.remove_at(rank as isize).is_err());
                        },
                    },
                    | Op::SetAt(rank, v) => match model_index(rank, model.len()) {
                        | Some(idx) => {
                            let old = std::mem::replace(&mut model[idx].1, v);
                            prop_assert_eq!(list.set_value_at(rank as isize, v), Ok(old));
                        },
                        | None => {
                            prop_assert!(list.set_value_at(rank as isize, v).is_err());
                        },
                    },
                    | Op::PopFront => {
                        if model.is_empty() {
                            prop_assert_eq!(list.pop_front(), Err(SkipListError::Empty));
                        } else {
                            prop_assert_eq!(list.pop_front(), Ok(model.remove(0)));
                        }
                    },
                }

                check(&list);
                prop_assert_eq!(list.len(), model.len());
                let pairs: Vec<(u8, u16)> = list.iter().map(|(k, v)| (*k, *v)).collect();
                prop_assert_eq!(&pairs, &model);
            }

            for (idx, (k, _)) in model.iter().enumerate() {
                let first = model.partition_point(|(mk, _)| mk < k);
                prop_assert_eq!(list.rank_of(k), Ok(first));
                prop_assert_eq!(list.get_at(idx as isize).map(|(k, v)| (*k, *v)), Ok(model[idx]));
            }
        }
    }
}
