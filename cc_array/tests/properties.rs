use std::cmp::Ordering;
use std::rc::Rc;

use cc_array::sort::{insertion_sort_by, merge_sort_by};
use cc_array::{ManagedArray, ValueArray};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// (key, original index)
fn keyed(keys: &[u8]) -> Vec<(u8, usize)> {
    keys.iter().copied().zip(0..).collect()
}

fn by_key(a: &(u8, usize), b: &(u8, usize)) -> Ordering {
    a.0.cmp(&b.0)
}

#[test]
fn merge_and_insertion_sort_agree_on_random_input() {
    init_logger();

    let mut rng = StdRng::seed_from_u64(0x5eed);
    for &n in &[0usize, 1, 2, 100, 10_000] {
        let keys: Vec<u8> = (0..n).map(|_| rng.gen_range(0..32)).collect();
        let input = keyed(&keys);

        let mut expected = input.clone();
        expected.sort_by(by_key);

        let mut merged = input.clone();
        merge_sort_by(&mut merged, by_key);
        assert_eq!(merged, expected, "merge sort, n = {}", n);

        // Insertion sort is quadratic, 10k elements is still fine.
        let mut inserted = input.clone();
        insertion_sort_by(&mut inserted, by_key);
        assert_eq!(inserted, expected, "insertion sort, n = {}", n);
    }
}

#[test]
fn managed_scenario() {
    init_logger();

    let items: Vec<Rc<&str>> = ["a", "b", "c"].iter().map(|s| Rc::new(*s)).collect();
    let mut array = ManagedArray::with_capacity(3);
    for item in &items {
        array.append(item).unwrap();
    }

    array.remove_at(1).unwrap();
    assert_eq!(Rc::strong_count(&items[1]), 1);
    assert_eq!(Rc::strong_count(&items[0]), 2);
    assert!(Rc::ptr_eq(&array[0], &items[0]));
    assert!(Rc::ptr_eq(&array[1], &items[2]));

    array.destroy();
    for item in &items {
        assert_eq!(Rc::strong_count(item), 1);
    }
}

#[derive(Clone, Debug)]
enum Op {
    Append(u8),
    Insert(usize, u8),
    Remove(usize),
    FastRemove(usize),
    Shrink,
    Reserve(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<u8>().prop_map(Op::Append),
        (0usize..64, any::<u8>()).prop_map(|(i, v)| Op::Insert(i, v)),
        (0usize..64).prop_map(Op::Remove),
        (0usize..64).prop_map(Op::FastRemove),
        Just(Op::Shrink),
        (0usize..40).prop_map(Op::Reserve),
    ]
}

proptest! {
    #[test]
    fn appends_keep_insertion_order(values in proptest::collection::vec(any::<u32>(), 0..200)) {
        let mut array = ValueArray::with_capacity(1);
        for (i, value) in values.iter().enumerate() {
            array.append_with_resize(*value);
            prop_assert_eq!(array.len(), i + 1);
            prop_assert!(array.capacity() >= array.len());
        }
        prop_assert_eq!(array.as_slice(), &values[..]);
    }

    #[test]
    fn behaves_like_a_vec(ops in proptest::collection::vec(op(), 0..100)) {
        let mut array = ValueArray::with_capacity(1);
        let mut model: Vec<u8> = Vec::new();

        for op in ops {
            match op {
                Op::Append(v) => {
                    array.append_with_resize(v);
                    model.push(v);
                }
                Op::Insert(i, v) => {
                    let result = array.insert_at(v, i);
                    prop_assert_eq!(result.is_ok(), i <= model.len());
                    if i <= model.len() {
                        model.insert(i, v);
                    }
                }
                Op::Remove(i) => {
                    let result = array.remove_at(i);
                    if i < model.len() {
                        prop_assert_eq!(result, Ok(model.remove(i)));
                    } else {
                        prop_assert!(result.is_err());
                    }
                }
                Op::FastRemove(i) => {
                    let result = array.fast_remove_at(i);
                    if i < model.len() {
                        prop_assert_eq!(result, Ok(model.swap_remove(i)));
                    } else {
                        prop_assert!(result.is_err());
                    }
                }
                Op::Shrink => {
                    array.shrink_to_fit();
                    prop_assert_eq!(array.capacity(), model.len().max(1));
                    array.shrink_to_fit();
                    prop_assert_eq!(array.capacity(), model.len().max(1));
                }
                Op::Reserve(n) => {
                    array.ensure_extra_capacity(n);
                    prop_assert!(array.capacity() >= model.len() + n);
                }
            }

            prop_assert_eq!(array.as_slice(), &model[..]);
            prop_assert!(array.capacity() >= 1);
        }
    }

    #[test]
    fn ordered_removal_preserves_order(
        values in proptest::collection::vec(any::<u16>(), 1..64),
        index in any::<proptest::sample::Index>(),
    ) {
        let i = index.index(values.len());
        let mut array = ValueArray::from_slice(&values);
        array.remove_at(i).unwrap();

        let mut expected = values.clone();
        expected.remove(i);
        prop_assert_eq!(array.as_slice(), &expected[..]);
    }

    #[test]
    fn fast_removal_moves_the_last_element(
        values in proptest::collection::vec(any::<u16>(), 1..64),
        index in any::<proptest::sample::Index>(),
    ) {
        let i = index.index(values.len());
        let last = *values.last().unwrap();
        let mut array = ValueArray::from_slice(&values);
        array.fast_remove_at(i).unwrap();

        prop_assert_eq!(array.len(), values.len() - 1);
        if i < array.len() {
            prop_assert_eq!(array[i], last);
        }
        prop_assert_eq!(&array.as_slice()[..i], &values[..i]);
    }

    #[test]
    fn bulk_removal(
        values in proptest::collection::vec(0u8..8, 0..64),
        minus in proptest::collection::vec(0u8..8, 0..8),
    ) {
        let mut full = ValueArray::from_slice(&values);
        full.full_remove_array(&minus);
        let expected: Vec<u8> = values.iter().copied().filter(|v| !minus.contains(v)).collect();
        prop_assert_eq!(full.as_slice(), &expected[..]);

        let mut first = ValueArray::from_slice(&values);
        first.remove_array(&minus);
        let mut expected = values.clone();
        for m in &minus {
            if let Some(pos) = expected.iter().position(|v| v == m) {
                expected.remove(pos);
            }
        }
        prop_assert_eq!(first.as_slice(), &expected[..]);
    }

    #[test]
    fn managed_bulk_removal_releases_every_slot(
        picks in proptest::collection::vec(0usize..6, 0..48),
        minus in proptest::collection::vec(0usize..6, 0..6),
    ) {
        let items: Vec<Rc<usize>> = (0..6).map(Rc::new).collect();
        let mut array = ManagedArray::with_capacity(1);
        for &p in &picks {
            array.append_with_resize(&items[p]);
        }

        let minus: Vec<Rc<usize>> = minus.iter().map(|&m| items[m].clone()).collect();
        array.full_remove_array(&minus);

        for (i, item) in items.iter().enumerate() {
            let in_minus = minus.iter().filter(|m| Rc::ptr_eq(m, item)).count();
            let stored = if in_minus > 0 { 0 } else { picks.iter().filter(|&&p| p == i).count() };
            prop_assert_eq!(Rc::strong_count(item), 1 + in_minus + stored);
        }
    }

    #[test]
    fn sorting_is_stable_and_idempotent(keys in proptest::collection::vec(0u8..16, 0..300)) {
        let input = keyed(&keys);

        let mut reference = input.clone();
        reference.sort_by(by_key);

        let mut merged = ValueArray::from_slice(&input);
        merged.merge_sort_by(by_key);
        prop_assert_eq!(merged.as_slice(), &reference[..]);

        let mut inserted = ValueArray::from_slice(&input);
        inserted.insertion_sort_by(by_key);
        prop_assert_eq!(inserted.as_slice(), &reference[..]);

        merged.merge_sort_by(by_key);
        prop_assert_eq!(merged.as_slice(), &reference[..]);
        inserted.insertion_sort_by(by_key);
        prop_assert_eq!(inserted.as_slice(), &reference[..]);
    }
}
