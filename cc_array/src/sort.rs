//! Stable in-place sorting over fixed-width records.
//!
//! Records are moved with raw bit copies: no element is cloned or dropped while
//! sorting, so sorting counted handles leaves every reference count untouched.

use core::cmp::Ordering;
use core::ptr;

use crate::alloc::{Allocator, Global};

/// Stable insertion sort.
///
/// Adaptive: close to linear on nearly sorted input, quadratic in the worst case.
/// An element moves down one slot at a time while its left neighbor compares
/// strictly greater, so equal elements never swap.
pub fn insertion_sort_by<T, F>(v: &mut [T], mut compare: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    for i in 1..v.len() {
        let mut j = i;
        while j > 0 && compare(&v[j - 1], &v[j]) == Ordering::Greater {
            v.swap(j - 1, j);
            j -= 1;
        }
    }
}

/// Stable bottom-up merge sort.
///
/// Runs of width 1, 2, 4, ... are merged pairwise, starting from the end of the
/// slice so that the right run of each pair is always complete and the left run
/// is at most as long. Each left run is copied into a scratch buffer of `len / 2`
/// slots and merged back in place. On ties the left run wins.
///
/// The scratch buffer comes from the global allocator, see `merge_sort_by_in`.
pub fn merge_sort_by<T, F>(v: &mut [T], compare: F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    merge_sort_by_in(v, compare, Global);
}

/// Same as `merge_sort_by`, with the scratch buffer allocated in `allocator`.
pub fn merge_sort_by_in<T, F, A>(v: &mut [T], mut compare: F, allocator: A)
where
    F: FnMut(&T, &T) -> Ordering,
    A: Allocator,
{
    let n = v.len();
    if n < 2 {
        return;
    }

    log::trace!("merge sort over {} records", n);

    // Never initialized as far as the vector is concerned, so dropping it only
    // frees the memory.
    let mut scratch = allocator_api2::vec::Vec::<T, A>::with_capacity_in(n / 2, allocator);
    let buf = scratch.as_mut_ptr();
    let arr = v.as_mut_ptr();

    let mut h = 1;
    while h < n {
        // Last index of the left run.
        let mut m = n - 1 - h;
        loop {
            let lo = (m + 1).saturating_sub(h);
            unsafe {
                merge(arr, lo, m + 1, m + 1 + h, buf, &mut compare);
            }

            if m < 2 * h {
                break;
            }
            m -= 2 * h;
        }

        h *= 2;
    }
}

/// Merges `v[lo..mid]` and `v[mid..hi]`.
///
/// # Safety
///
/// Both runs must be in bounds, `buf` must have room for `mid - lo` items.
unsafe fn merge<T, F>(v: *mut T, lo: usize, mid: usize, hi: usize, buf: *mut T, compare: &mut F)
where
    F: FnMut(&T, &T) -> Ordering,
{
    let left_len = mid - lo;
    ptr::copy_nonoverlapping(v.add(lo), buf, left_len);

    // The gap in `v` is always as wide as what is left of the left run, so if
    // `compare` panics, dropping the hole puts the slice back in a valid state.
    let mut hole = MergeHole {
        src: buf,
        start: 0,
        end: left_len,
        dst: v.add(lo),
    };

    let mut right = v.add(mid);
    let right_end = v.add(hi);

    while hole.start < hole.end && right < right_end {
        let left = hole.src.add(hole.start);
        if compare(&*left, &*right) == Ordering::Greater {
            ptr::copy_nonoverlapping(right, hole.dst, 1);
            right = right.add(1);
        } else {
            ptr::copy_nonoverlapping(left, hole.dst, 1);
            hole.start += 1;
        }
        hole.dst = hole.dst.add(1);
    }

    // Whatever remains of the right run is already in place, the rest of the
    // left run is copied back when `hole` drops.
}

struct MergeHole<T> {
    src: *const T,
    start: usize,
    end: usize,
    dst: *mut T,
}

impl<T> Drop for MergeHole<T> {
    fn drop(&mut self) {
        unsafe {
            ptr::copy_nonoverlapping(self.src.add(self.start), self.dst, self.end - self.start);
        }
    }
}

#[cfg(test)]
fn by_key(a: &(u32, u32), b: &(u32, u32)) -> Ordering {
    a.0.cmp(&b.0)
}

#[test]
fn small_inputs() {
    let mut empty: [u32; 0] = [];
    merge_sort_by(&mut empty, |a, b| a.cmp(b));
    insertion_sort_by(&mut empty, |a, b| a.cmp(b));

    let mut one = [7];
    merge_sort_by(&mut one, |a, b| a.cmp(b));
    assert_eq!(one, [7]);

    let mut two = [2, 1];
    merge_sort_by(&mut two, |a, b| a.cmp(b));
    assert_eq!(two, [1, 2]);

    let mut two = [2, 1];
    insertion_sort_by(&mut two, |a, b| a.cmp(b));
    assert_eq!(two, [1, 2]);
}

#[test]
fn merge_sort_odd_lengths() {
    for n in 0..70u32 {
        let mut v: Vec<u32> = (0..n).map(|i| (i * 7919) % 13).collect();
        let mut expected = v.clone();
        expected.sort();
        merge_sort_by(&mut v, |a, b| a.cmp(b));
        assert_eq!(v, expected, "n = {}", n);
    }
}

#[test]
fn ties_keep_original_order() {
    // (key, original position)
    let input = [(5, 0), (3, 1), (5, 2), (1, 3)];

    let mut merged = input;
    merge_sort_by(&mut merged, by_key);
    assert_eq!(merged, [(1, 3), (3, 1), (5, 0), (5, 2)]);

    let mut inserted = input;
    insertion_sort_by(&mut inserted, by_key);
    assert_eq!(inserted, merged);
}

#[test]
fn ties_across_run_boundaries() {
    let mut v: Vec<(u32, u32)> = (0..37).map(|i| (i % 3, i)).collect();
    let mut expected = v.clone();
    expected.sort_by(by_key);

    merge_sort_by(&mut v, by_key);
    assert_eq!(v, expected);
}

#[test]
fn sorting_does_not_touch_counts() {
    use std::rc::Rc;

    let items: Vec<Rc<u32>> = [4, 2, 9, 1, 1, 7].iter().map(|v| Rc::new(*v)).collect();
    let mut a = items.clone();
    let mut b = items.clone();

    merge_sort_by(&mut a, |x, y| x.cmp(y));
    insertion_sort_by(&mut b, |x, y| x.cmp(y));

    for item in &items {
        assert_eq!(Rc::strong_count(item), 3);
    }

    let values: Vec<u32> = a.iter().map(|v| **v).collect();
    assert_eq!(values, vec![1, 1, 2, 4, 7, 9]);
    assert!(a.iter().zip(b.iter()).all(|(x, y)| Rc::ptr_eq(x, y)));
}

#[test]
fn panicking_comparator_keeps_a_permutation() {
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use std::rc::Rc;

    let items: Vec<Rc<u32>> = (0..20u32).rev().map(Rc::new).collect();
    let mut v = items.clone();

    let mut calls = 0;
    let result = catch_unwind(AssertUnwindSafe(|| {
        merge_sort_by(&mut v, |a, b| {
            calls += 1;
            if calls == 25 {
                panic!("comparator failure");
            }
            a.cmp(b)
        });
    }));
    assert!(result.is_err());

    let mut values: Vec<u32> = v.iter().map(|v| **v).collect();
    values.sort();
    assert_eq!(values, (0..20).collect::<Vec<u32>>());
    for item in &items {
        assert_eq!(Rc::strong_count(item), 2);
    }
}

#[test]
fn scratch_comes_from_the_given_allocator() {
    use crate::testing::CountingAllocator;

    let allocator = CountingAllocator::new();

    let mut one = [1u32];
    merge_sort_by_in(&mut one, |a, b| a.cmp(b), &allocator);
    assert_eq!(allocator.allocations(), 0);

    let mut v = [3u32, 1, 2];
    merge_sort_by_in(&mut v, |a, b| a.cmp(b), &allocator);
    assert_eq!(v, [1, 2, 3]);
    assert_eq!(allocator.allocations(), 1);
    assert_eq!(allocator.live_allocations(), 0);
}
