use core::cmp::Ordering;
use core::fmt;
use core::ops::Index;

use crate::alloc::{Allocator, Global};
use crate::equality::{Equality, Identity};
use crate::error::{ArrayError, Result};
use crate::handle::Handle;
use crate::raw::RawArray;
use crate::sort;
use crate::util;

/// A resizable array that owns one counted reference per stored handle.
///
/// Storing a handle clones it (one increment), removing it drops the stored clone
/// (one decrement). Searches compare handles by identity, never by value.
///
/// Every operation comes in a checked form returning an `ArrayError` when its
/// precondition does not hold, and most have an `unsafe` `_unchecked` form for
/// hot loops where the caller already validated the indices or the capacity.
pub struct ManagedArray<H: Handle, A: Allocator = Global> {
    raw: RawArray<H, A>,
}

impl<H: Handle> ManagedArray<H, Global> {
    /// Creates an empty array. Same as `with_capacity(1)`.
    pub fn new() -> Self {
        Self::with_capacity(1)
    }

    /// Creates an empty array with room for `cap` handles (at least one).
    pub fn with_capacity(cap: usize) -> Self {
        Self::with_capacity_in(cap, Global)
    }
}

impl<H: Handle, A: Allocator> ManagedArray<H, A> {
    pub fn with_capacity_in(cap: usize, allocator: A) -> Self {
        ManagedArray {
            raw: RawArray::with_capacity_in(cap, allocator),
        }
    }

    pub fn try_with_capacity_in(cap: usize, allocator: A) -> Result<Self> {
        Ok(ManagedArray {
            raw: RawArray::try_with_capacity_in(cap, allocator)?,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    #[inline]
    pub fn remaining_capacity(&self) -> usize {
        self.raw.remaining_capacity()
    }

    /// Doubles the capacity until `additional` more handles fit.
    pub fn ensure_extra_capacity(&mut self, additional: usize) {
        self.raw.ensure_extra_capacity(additional);
    }

    pub fn try_ensure_extra_capacity(&mut self, additional: usize) -> Result<()> {
        self.raw.try_ensure_extra_capacity(additional)
    }

    pub fn double_capacity(&mut self) {
        self.raw.double_capacity();
    }

    /// Reduces the capacity to `max(len, 1)`.
    pub fn shrink_to_fit(&mut self) {
        self.raw.shrink_to_fit();
    }

    #[inline]
    pub fn as_slice(&self) -> &[H] {
        self.raw.as_slice()
    }

    /// Address of the first slot, invalidated by any capacity change.
    #[inline]
    pub fn as_ptr(&self) -> *const H {
        self.raw.as_ptr()
    }

    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, H> {
        self.as_slice().iter()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&H> {
        self.as_slice().get(index)
    }

    /// # Safety
    ///
    /// `index` must be less than `len`.
    #[inline]
    pub unsafe fn get_unchecked(&self, index: usize) -> &H {
        util::assume(index < self.len());
        self.as_slice().get_unchecked(index)
    }

    #[inline]
    pub fn first(&self) -> Option<&H> {
        self.as_slice().first()
    }

    #[inline]
    pub fn last(&self) -> Option<&H> {
        self.as_slice().last()
    }

    /// Stores a new reference to `handle` if there is spare capacity.
    ///
    /// Never grows the buffer.
    pub fn append(&mut self, handle: &H) -> Result<()> {
        if self.remaining_capacity() == 0 {
            return Err(ArrayError::CapacityExceeded {
                len: self.len(),
                capacity: self.capacity(),
                additional: 1,
            });
        }

        unsafe {
            self.raw.push_unchecked(handle.clone());
        }

        Ok(())
    }

    /// # Safety
    ///
    /// The array must have spare capacity.
    #[inline]
    pub unsafe fn append_unchecked(&mut self, handle: &H) {
        self.raw.push_unchecked(handle.clone());
    }

    /// Stores a new reference to `handle`, doubling the capacity if needed.
    #[inline]
    pub fn append_with_resize(&mut self, handle: &H) {
        self.raw.push(handle.clone());
    }

    /// Stores new references to all of `other`'s handles if they fit in the
    /// remaining capacity. Nothing is appended otherwise.
    pub fn append_array(&mut self, other: &[H]) -> Result<()> {
        if self.remaining_capacity() < other.len() {
            return Err(ArrayError::CapacityExceeded {
                len: self.len(),
                capacity: self.capacity(),
                additional: other.len(),
            });
        }

        unsafe {
            self.raw.extend_from_slice_unchecked(other);
        }

        Ok(())
    }

    pub fn append_array_with_resize(&mut self, other: &[H]) {
        self.raw.extend_from_slice(other);
    }

    /// Stores a new reference to `handle` at `index`, shifting the following
    /// handles to the right. Grows the capacity if needed.
    pub fn insert_at(&mut self, handle: &H, index: usize) -> Result<()> {
        util::check_insertion_index(index, self.len())?;
        unsafe {
            self.raw.insert_unchecked(index, handle.clone());
        }

        Ok(())
    }

    /// # Safety
    ///
    /// `index` must be less than or equal to `len`.
    pub unsafe fn insert_at_unchecked(&mut self, handle: &H, index: usize) {
        self.raw.insert_unchecked(index, handle.clone());
    }

    /// Releases the handle at `index` and shifts the following ones to the left.
    pub fn remove_at(&mut self, index: usize) -> Result<()> {
        util::check_index(index, self.len())?;
        unsafe {
            self.remove_at_unchecked(index);
        }

        Ok(())
    }

    /// # Safety
    ///
    /// `index` must be less than `len`.
    pub unsafe fn remove_at_unchecked(&mut self, index: usize) {
        let removed = self.raw.remove_unchecked(index);
        drop(removed);
    }

    /// Releases the handle at `index` and moves the last handle into its slot.
    ///
    /// O(1) but does not preserve the order of the remaining handles.
    pub fn fast_remove_at(&mut self, index: usize) -> Result<()> {
        util::check_index(index, self.len())?;
        unsafe {
            self.fast_remove_at_unchecked(index);
        }

        Ok(())
    }

    /// # Safety
    ///
    /// `index` must be less than `len`.
    pub unsafe fn fast_remove_at_unchecked(&mut self, index: usize) {
        let removed = self.raw.swap_remove_unchecked(index);
        drop(removed);
    }

    /// Index of the first slot holding the same object as `handle`.
    pub fn index_of(&self, handle: &H) -> Option<usize> {
        self.iter().position(|item| Identity.equal(item, handle))
    }

    pub fn contains(&self, handle: &H) -> bool {
        self.index_of(handle).is_some()
    }

    /// Removes the first occurrence of `handle`, keeping the order of the others.
    ///
    /// Returns whether a handle was removed.
    pub fn remove_object(&mut self, handle: &H) -> bool {
        match self.index_of(handle) {
            Some(index) => {
                unsafe {
                    self.remove_at_unchecked(index);
                }
                true
            }
            None => false,
        }
    }

    /// Removes the first occurrence of `handle` with a fast removal.
    pub fn fast_remove_object(&mut self, handle: &H) -> bool {
        match self.index_of(handle) {
            Some(index) => {
                unsafe {
                    self.fast_remove_at_unchecked(index);
                }
                true
            }
            None => false,
        }
    }

    /// For each handle in `other`, removes its first occurrence from this array.
    pub fn remove_array(&mut self, other: &[H]) {
        for handle in other {
            self.remove_object(handle);
        }
    }

    /// Removes every occurrence of every handle in `other`.
    pub fn full_remove_array(&mut self, other: &[H]) {
        self.raw
            .retain(|item| !other.iter().any(|handle| Identity.equal(item, handle)));
    }

    /// Swaps two handles without touching their counts.
    pub fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        let len = self.len();
        util::check_index(a, len)?;
        util::check_index(b, len)?;
        self.raw.as_mut_slice().swap(a, b);

        Ok(())
    }

    /// Releases every handle. The capacity is unchanged.
    pub fn remove_all(&mut self) {
        self.raw.clear();
    }

    /// Releases every handle and frees the buffer.
    pub fn destroy(mut self) {
        self.remove_all();
    }

    /// Calls `f` on every handle in order.
    pub fn for_each<F>(&self, f: F)
    where
        F: FnMut(&H),
    {
        self.iter().for_each(f);
    }

    /// Calls `f` on every handle in order, passing `arg` along.
    pub fn for_each_with<U: ?Sized, F>(&self, arg: &U, mut f: F)
    where
        F: FnMut(&H, &U),
    {
        for handle in self.iter() {
            f(handle, arg);
        }
    }

    /// Sorts the handles with a stable insertion sort. Counts are untouched.
    pub fn insertion_sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&H, &H) -> Ordering,
    {
        sort::insertion_sort_by(self.raw.as_mut_slice(), compare);
    }

    /// Sorts the handles with a stable merge sort. Counts are untouched.
    pub fn merge_sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&H, &H) -> Ordering,
    {
        self.raw.merge_sort_by(compare);
    }
}

impl<H: Handle> Default for ManagedArray<H, Global> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Handle, A: Allocator + Clone> Clone for ManagedArray<H, A> {
    fn clone(&self) -> Self {
        ManagedArray {
            raw: self.raw.clone(),
        }
    }
}

impl<H: Handle, A: Allocator> Index<usize> for ManagedArray<H, A> {
    type Output = H;

    fn index(&self, index: usize) -> &H {
        &self.as_slice()[index]
    }
}

impl<'a, H: Handle, A: Allocator> IntoIterator for &'a ManagedArray<H, A> {
    type Item = &'a H;
    type IntoIter = core::slice::Iter<'a, H>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<H: Handle + fmt::Debug, A: Allocator> fmt::Debug for ManagedArray<H, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.raw, f)
    }
}

#[cfg(test)]
use std::rc::Rc;

#[cfg(test)]
fn handles(values: &[u32]) -> Vec<Rc<u32>> {
    values.iter().map(|v| Rc::new(*v)).collect()
}

#[cfg(test)]
fn values(array: &ManagedArray<Rc<u32>>) -> Vec<u32> {
    array.iter().map(|h| **h).collect()
}

#[test]
fn store_and_release() {
    let items = handles(&[1, 2, 3]);
    let mut a = ManagedArray::with_capacity(1);
    for item in &items {
        a.append_with_resize(item);
    }

    assert_eq!(a.len(), 3);
    assert!(a.capacity() >= 3);
    for item in &items {
        assert_eq!(Rc::strong_count(item), 2);
    }

    a.remove_at(1).unwrap();
    assert_eq!(Rc::strong_count(&items[1]), 1);
    assert_eq!(values(&a), vec![1, 3]);
    assert!(Rc::ptr_eq(&a[0], &items[0]));
    assert!(Rc::ptr_eq(&a[1], &items[2]));

    a.remove_all();
    assert!(a.is_empty());
    assert!(a.capacity() >= 3);
    for item in &items {
        assert_eq!(Rc::strong_count(item), 1);
    }
}

#[test]
fn append_respects_capacity() {
    let items = handles(&[1, 2, 3]);
    let mut a = ManagedArray::with_capacity(2);
    a.append(&items[0]).unwrap();
    a.append(&items[1]).unwrap();
    assert_eq!(
        a.append(&items[2]),
        Err(ArrayError::CapacityExceeded {
            len: 2,
            capacity: 2,
            additional: 1,
        })
    );
    assert_eq!(Rc::strong_count(&items[2]), 1);
    assert_eq!(a.capacity(), 2);

    a.ensure_extra_capacity(1);
    unsafe {
        a.append_unchecked(&items[2]);
    }
    assert_eq!(values(&a), vec![1, 2, 3]);
}

#[test]
fn insert_at() {
    let items = handles(&[0, 1, 2, 3]);
    let mut a = ManagedArray::with_capacity(1);
    a.insert_at(&items[1], 0).unwrap();
    a.insert_at(&items[3], 1).unwrap();
    a.insert_at(&items[0], 0).unwrap();
    a.insert_at(&items[2], 2).unwrap();
    assert_eq!(values(&a), vec![0, 1, 2, 3]);

    assert_eq!(
        a.insert_at(&items[0], 5),
        Err(ArrayError::IndexOutOfBounds { index: 5, len: 4 })
    );
    assert_eq!(Rc::strong_count(&items[0]), 2);
}

#[test]
fn fast_remove() {
    let items = handles(&[0, 1, 2, 3, 4]);
    let mut a = ManagedArray::with_capacity(8);
    a.append_array(&items).unwrap();

    a.fast_remove_at(1).unwrap();
    assert_eq!(values(&a), vec![0, 4, 2, 3]);
    assert_eq!(Rc::strong_count(&items[1]), 1);
    assert_eq!(Rc::strong_count(&items[4]), 2);

    a.fast_remove_at(3).unwrap();
    assert_eq!(values(&a), vec![0, 4, 2]);

    assert_eq!(
        a.fast_remove_at(3),
        Err(ArrayError::IndexOutOfBounds { index: 3, len: 3 })
    );
}

#[test]
fn identity_search() {
    let items = handles(&[7, 7, 8]);
    let mut a = ManagedArray::with_capacity(4);
    a.append_array(&items).unwrap();

    let lookalike = Rc::new(7);
    assert_eq!(a.index_of(&lookalike), None);
    assert!(!a.contains(&lookalike));
    assert_eq!(a.index_of(&items[1]), Some(1));
    assert!(a.contains(&items[2]));

    assert!(!a.remove_object(&lookalike));
    assert!(a.remove_object(&items[0]));
    assert_eq!(a.index_of(&items[1]), Some(0));
    assert!(a.fast_remove_object(&items[1]));
    assert_eq!(a.len(), 1);
}

#[test]
fn remove_array_first_matches_only() {
    let items = handles(&[0, 1, 2]);
    let mut a = ManagedArray::with_capacity(1);
    for i in [0, 1, 2, 1, 0, 1] {
        a.append_with_resize(&items[i]);
    }
    assert_eq!(Rc::strong_count(&items[1]), 4);

    a.remove_array(&[items[1].clone(), items[0].clone()]);
    assert_eq!(values(&a), vec![2, 1, 0, 1]);
    assert_eq!(Rc::strong_count(&items[1]), 3);
    assert_eq!(Rc::strong_count(&items[0]), 2);
}

#[test]
fn full_remove_array() {
    let items = handles(&[0, 1, 2]);
    let mut a = ManagedArray::with_capacity(1);
    for i in [0, 1, 2, 1, 0, 1] {
        a.append_with_resize(&items[i]);
    }

    let mut minus = ManagedArray::with_capacity(1);
    minus.append_with_resize(&items[1]);

    a.full_remove_array(minus.as_slice());
    assert_eq!(values(&a), vec![0, 2, 0]);
    assert_eq!(Rc::strong_count(&items[1]), 2);

    minus.destroy();
    assert_eq!(Rc::strong_count(&items[1]), 1);
}

#[test]
fn swap_and_sort_keep_counts() {
    let items = handles(&[5, 3, 5, 1]);
    let mut a = ManagedArray::with_capacity(1);
    a.append_array_with_resize(&items);

    a.swap(0, 3).unwrap();
    assert_eq!(values(&a), vec![1, 3, 5, 5]);
    assert!(a.swap(0, 4).is_err());
    a.swap(0, 3).unwrap();

    a.merge_sort_by(|x, y| x.cmp(y));
    assert_eq!(values(&a), vec![1, 3, 5, 5]);
    assert!(Rc::ptr_eq(&a[2], &items[0]));
    assert!(Rc::ptr_eq(&a[3], &items[2]));

    a.insertion_sort_by(|x, y| y.cmp(x));
    assert_eq!(values(&a), vec![5, 5, 3, 1]);
    assert!(Rc::ptr_eq(&a[0], &items[0]));

    for item in &items {
        assert_eq!(Rc::strong_count(item), 2);
    }
}

#[test]
fn merge_sort_scratch_uses_the_array_allocator() {
    use crate::testing::CountingAllocator;

    let allocator = CountingAllocator::new();
    let items = handles(&[8, 3, 6, 1, 7, 2, 5, 4]);
    {
        let mut a = ManagedArray::with_capacity_in(8, &allocator);
        a.append_array(&items).unwrap();
        assert_eq!(allocator.allocations(), 1);

        a.merge_sort_by(|x, y| x.cmp(y));
        assert_eq!(allocator.allocations(), 2);
        assert_eq!(allocator.live_allocations(), 1);

        let sorted: Vec<u32> = a.iter().map(|h| **h).collect();
        assert_eq!(sorted, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    assert_eq!(allocator.live_allocations(), 0);
    for item in &items {
        assert_eq!(Rc::strong_count(item), 1);
    }
}

#[test]
fn for_each() {
    let items = handles(&[1, 2, 3]);
    let mut a = ManagedArray::with_capacity(3);
    a.append_array(&items).unwrap();

    let mut sum = 0;
    a.for_each(|h| sum += **h);
    assert_eq!(sum, 6);

    let mut seen = Vec::new();
    a.for_each_with(&10u32, |h, offset| seen.push(**h + offset));
    assert_eq!(seen, vec![11, 12, 13]);
}

#[test]
fn clone_takes_references() {
    let items = handles(&[1, 2]);
    let mut a = ManagedArray::with_capacity(2);
    a.append_array(&items).unwrap();

    let b = a.clone();
    assert_eq!(Rc::strong_count(&items[0]), 3);
    drop(a);
    assert_eq!(Rc::strong_count(&items[0]), 2);
    assert_eq!(format!("{:?}", b), "[1, 2]");
}
