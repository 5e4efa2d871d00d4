use core::cmp::Ordering;
use core::fmt;
use core::ops::{Index, IndexMut};

use crate::alloc::{Allocator, Global};
use crate::equality::{Equality, Structural};
use crate::error::{ArrayError, Result};
use crate::raw::RawArray;
use crate::sort;
use crate::util;

/// A resizable array of plain records.
///
/// Records are `Copy` and stored by value: nothing is counted when they are
/// stored or removed. Searches use the `Equality` strategy the array was created
/// with, `Structural` (`PartialEq`) by default.
pub struct ValueArray<T: Copy, E = Structural, A: Allocator = Global> {
    raw: RawArray<T, A>,
    equality: E,
}

impl<T: Copy> ValueArray<T, Structural, Global> {
    /// Creates an empty array. Same as `with_capacity(1)`.
    pub fn new() -> Self {
        Self::with_capacity(1)
    }

    /// Creates an empty array with room for `cap` records (at least one).
    pub fn with_capacity(cap: usize) -> Self {
        Self::with_equality(cap, Structural)
    }

    pub fn from_slice(records: &[T]) -> Self {
        let mut array = Self::with_capacity(records.len());
        array.append_array_with_resize(records);

        array
    }
}

impl<T: Copy, E> ValueArray<T, E, Global> {
    /// Creates an empty array searched with `equality`.
    pub fn with_equality(cap: usize, equality: E) -> Self {
        Self::with_equality_in(cap, equality, Global)
    }
}

impl<T: Copy, E, A: Allocator> ValueArray<T, E, A> {
    pub fn with_equality_in(cap: usize, equality: E, allocator: A) -> Self {
        ValueArray {
            raw: RawArray::with_capacity_in(cap, allocator),
            equality,
        }
    }

    pub fn try_with_equality_in(cap: usize, equality: E, allocator: A) -> Result<Self> {
        Ok(ValueArray {
            raw: RawArray::try_with_capacity_in(cap, allocator)?,
            equality,
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

    pub fn equality(&self) -> &E {
        &self.equality
    }

    pub fn ensure_extra_capacity(&mut self, additional: usize) {
        self.raw.ensure_extra_capacity(additional);
    }

    pub fn try_ensure_extra_capacity(&mut self, additional: usize) -> Result<()> {
        self.raw.try_ensure_extra_capacity(additional)
    }

    pub fn double_capacity(&mut self) {
        self.raw.double_capacity();
    }

    pub fn shrink_to_fit(&mut self) {
        self.raw.shrink_to_fit();
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.raw.as_slice()
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.raw.as_mut_slice()
    }

    /// Address of the first slot, invalidated by any capacity change.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.raw.as_ptr()
    }

    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<T> {
        self.as_slice().get(index).copied()
    }

    /// # Safety
    ///
    /// `index` must be less than `len`.
    #[inline]
    pub unsafe fn get_unchecked(&self, index: usize) -> T {
        util::assume(index < self.len());
        *self.as_slice().get_unchecked(index)
    }

    #[inline]
    pub fn first(&self) -> Option<T> {
        self.as_slice().first().copied()
    }

    #[inline]
    pub fn last(&self) -> Option<T> {
        self.as_slice().last().copied()
    }

    /// Appends `value` if there is spare capacity. Never grows the buffer.
    pub fn append(&mut self, value: T) -> Result<()> {
        self.raw
            .push_within_capacity(value)
            .map_err(|_| ArrayError::CapacityExceeded {
                len: self.raw.len(),
                capacity: self.raw.capacity(),
                additional: 1,
            })
    }

    /// # Safety
    ///
    /// The array must have spare capacity.
    #[inline]
    pub unsafe fn append_unchecked(&mut self, value: T) {
        self.raw.push_unchecked(value);
    }

    #[inline]
    pub fn append_with_resize(&mut self, value: T) {
        self.raw.push(value);
    }

    /// Appends all of `other` if it fits in the remaining capacity. Nothing is
    /// appended otherwise.
    pub fn append_array(&mut self, other: &[T]) -> Result<()> {
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

    pub fn append_array_with_resize(&mut self, other: &[T]) {
        self.raw.extend_from_slice(other);
    }

    /// Inserts `value` at `index`, shifting the following records to the right.
    /// Grows the capacity if needed.
    pub fn insert_at(&mut self, value: T, index: usize) -> Result<()> {
        util::check_insertion_index(index, self.len())?;
        unsafe {
            self.raw.insert_unchecked(index, value);
        }

        Ok(())
    }

    /// # Safety
    ///
    /// `index` must be less than or equal to `len`.
    pub unsafe fn insert_at_unchecked(&mut self, value: T, index: usize) {
        self.raw.insert_unchecked(index, value);
    }

    /// Removes the record at `index`, shifting the following ones to the left.
    pub fn remove_at(&mut self, index: usize) -> Result<T> {
        util::check_index(index, self.len())?;

        Ok(unsafe { self.raw.remove_unchecked(index) })
    }

    /// # Safety
    ///
    /// `index` must be less than `len`.
    pub unsafe fn remove_at_unchecked(&mut self, index: usize) -> T {
        self.raw.remove_unchecked(index)
    }

    /// Removes the record at `index` and moves the last record into its slot.
    pub fn fast_remove_at(&mut self, index: usize) -> Result<T> {
        util::check_index(index, self.len())?;

        Ok(unsafe { self.raw.swap_remove_unchecked(index) })
    }

    /// # Safety
    ///
    /// `index` must be less than `len`.
    pub unsafe fn fast_remove_at_unchecked(&mut self, index: usize) -> T {
        self.raw.swap_remove_unchecked(index)
    }

    pub fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        let len = self.len();
        util::check_index(a, len)?;
        util::check_index(b, len)?;
        self.raw.as_mut_slice().swap(a, b);

        Ok(())
    }

    /// Removes every record. The capacity is unchanged.
    pub fn remove_all(&mut self) {
        self.raw.clear();
    }

    /// Frees the buffer.
    pub fn destroy(self) {}

    pub fn for_each<F>(&self, f: F)
    where
        F: FnMut(&T),
    {
        self.iter().for_each(f);
    }

    pub fn for_each_with<U: ?Sized, F>(&self, arg: &U, mut f: F)
    where
        F: FnMut(&T, &U),
    {
        for value in self.iter() {
            f(value, arg);
        }
    }

    pub fn insertion_sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        sort::insertion_sort_by(self.raw.as_mut_slice(), compare);
    }

    pub fn merge_sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.raw.merge_sort_by(compare);
    }
}

impl<T: Copy, E: Equality<T>, A: Allocator> ValueArray<T, E, A> {
    /// Index of the first record equal to `value`.
    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.iter().position(|item| self.equality.equal(item, value))
    }

    pub fn contains(&self, value: &T) -> bool {
        self.index_of(value).is_some()
    }

    /// Removes the first record equal to `value`, keeping the order of the others.
    pub fn remove_object(&mut self, value: &T) -> Option<T> {
        let index = self.index_of(value)?;

        Some(unsafe { self.raw.remove_unchecked(index) })
    }

    pub fn fast_remove_object(&mut self, value: &T) -> Option<T> {
        let index = self.index_of(value)?;

        Some(unsafe { self.raw.swap_remove_unchecked(index) })
    }

    /// For each record in `other`, removes the first equal record from this array.
    pub fn remove_array(&mut self, other: &[T]) {
        for value in other {
            self.remove_object(value);
        }
    }

    /// Removes every record equal to any record of `other`.
    pub fn full_remove_array(&mut self, other: &[T]) {
        let equality = &self.equality;
        self.raw
            .retain(|item| !other.iter().any(|value| equality.equal(item, value)));
    }
}

impl<T: Copy> Default for ValueArray<T, Structural, Global> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy, E: Clone, A: Allocator + Clone> Clone for ValueArray<T, E, A> {
    fn clone(&self) -> Self {
        ValueArray {
            raw: self.raw.clone(),
            equality: self.equality.clone(),
        }
    }
}

impl<T: Copy, E, A: Allocator> Index<usize> for ValueArray<T, E, A> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T: Copy, E, A: Allocator> IndexMut<usize> for ValueArray<T, E, A> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.as_mut_slice()[index]
    }
}

impl<'a, T: Copy, E, A: Allocator> IntoIterator for &'a ValueArray<T, E, A> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Copy, E, A: Allocator> Extend<T> for ValueArray<T, E, A> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.ensure_extra_capacity(iter.size_hint().0);
        for value in iter {
            self.append_with_resize(value);
        }
    }
}

impl<T: Copy + fmt::Debug, E, A: Allocator> fmt::Debug for ValueArray<T, E, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.raw, f)
    }
}

#[cfg(test)]
#[derive(Copy, Clone, Debug, PartialEq)]
struct Record {
    key: u32,
    origin: u32,
}

#[test]
fn append_keys_and_sort() {
    let mut a = ValueArray::with_capacity(1);
    for (origin, key) in [5, 3, 5, 1].into_iter().enumerate() {
        a.append_with_resize(Record {
            key,
            origin: origin as u32,
        });
    }

    assert_eq!(a.len(), 4);
    assert!(a.capacity() >= 4);

    a.merge_sort_by(|a, b| a.key.cmp(&b.key));
    let keys: Vec<u32> = a.iter().map(|r| r.key).collect();
    assert_eq!(keys, vec![1, 3, 5, 5]);
    assert_eq!(a[2].origin, 0);
    assert_eq!(a[3].origin, 2);
}

#[test]
fn ordered_and_fast_removal() {
    let mut a = ValueArray::from_slice(&[10, 11, 12, 13, 14]);
    assert_eq!(a.capacity(), 5);

    assert_eq!(a.remove_at(1), Ok(11));
    assert_eq!(a.as_slice(), &[10, 12, 13, 14]);

    assert_eq!(a.fast_remove_at(0), Ok(10));
    assert_eq!(a.as_slice(), &[14, 12, 13]);

    assert_eq!(a.remove_at(3), Err(ArrayError::IndexOutOfBounds { index: 3, len: 3 }));
    assert_eq!(a.fast_remove_at(7), Err(ArrayError::IndexOutOfBounds { index: 7, len: 3 }));
    assert_eq!(a.len(), 3);
}

#[test]
fn append_and_insert() {
    let mut a = ValueArray::with_capacity(2);
    assert_eq!(a.append(1u8), Ok(()));
    assert_eq!(a.append(3), Ok(()));
    assert_eq!(
        a.append(4),
        Err(ArrayError::CapacityExceeded {
            len: 2,
            capacity: 2,
            additional: 1,
        })
    );
    assert_eq!(
        a.append_array(&[4, 5]),
        Err(ArrayError::CapacityExceeded {
            len: 2,
            capacity: 2,
            additional: 2,
        })
    );

    a.insert_at(2, 1).unwrap();
    assert_eq!(a.capacity(), 4);
    a.insert_at(0, 0).unwrap();
    a.insert_at(4, 4).unwrap();
    assert_eq!(a.as_slice(), &[0, 1, 2, 3, 4]);
    assert!(a.insert_at(9, 9).is_err());

    a.ensure_extra_capacity(2);
    a.append_array(&[5, 6]).unwrap();
    unsafe {
        a.append_unchecked(7);
    }
    assert_eq!(a.as_slice(), &[0, 1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(a.first(), Some(0));
    assert_eq!(a.last(), Some(7));
    assert_eq!(a.get(8), None);
}

#[test]
fn structural_search() {
    let mut a = ValueArray::from_slice(&[(1, 2), (3, 4), (1, 2)]);
    assert_eq!(a.index_of(&(1, 2)), Some(0));
    assert!(a.contains(&(3, 4)));
    assert!(!a.contains(&(4, 3)));

    assert_eq!(a.remove_object(&(1, 2)), Some((1, 2)));
    assert_eq!(a.as_slice(), &[(3, 4), (1, 2)]);
    assert_eq!(a.remove_object(&(9, 9)), None);
    assert_eq!(a.fast_remove_object(&(3, 4)), Some((3, 4)));
    assert_eq!(a.as_slice(), &[(1, 2)]);
}

#[test]
fn custom_equality() {
    let same_key = |a: &Record, b: &Record| a.key == b.key;
    let mut a = ValueArray::with_equality(4, same_key);
    a.append_array(&[
        Record { key: 1, origin: 0 },
        Record { key: 2, origin: 1 },
        Record { key: 1, origin: 2 },
    ])
    .unwrap();

    assert_eq!(a.index_of(&Record { key: 2, origin: 99 }), Some(1));

    a.full_remove_array(&[Record { key: 1, origin: 99 }]);
    assert_eq!(a.as_slice(), &[Record { key: 2, origin: 1 }]);
}

#[test]
fn bulk_removal() {
    let mut a = ValueArray::from_slice(&[1, 2, 3, 2, 1, 2]);
    let mut b = a.clone();

    a.remove_array(&[2, 1, 7]);
    assert_eq!(a.as_slice(), &[3, 2, 1, 2]);

    b.full_remove_array(&[2, 7]);
    assert_eq!(b.as_slice(), &[1, 3, 1]);

    b.full_remove_array(&[]);
    assert_eq!(b.as_slice(), &[1, 3, 1]);
}

#[test]
fn shrink_and_clear() {
    let mut a: ValueArray<u32> = ValueArray::with_capacity(16);
    a.extend(0..3);
    a.shrink_to_fit();
    assert_eq!(a.capacity(), 3);
    a.shrink_to_fit();
    assert_eq!(a.capacity(), 3);

    a.remove_all();
    assert!(a.is_empty());
    assert_eq!(a.capacity(), 3);
    a.shrink_to_fit();
    assert_eq!(a.capacity(), 1);

    a.double_capacity();
    assert_eq!(a.capacity(), 2);
    a.destroy();
}

#[test]
fn swap_and_insertion_sort() {
    let mut a = ValueArray::from_slice(&[3, 1, 2]);
    a.swap(0, 2).unwrap();
    assert_eq!(a.as_slice(), &[2, 1, 3]);
    assert!(a.swap(3, 0).is_err());

    a[1] = 0;
    a.insertion_sort_by(|a, b| b.cmp(a));
    assert_eq!(a.as_slice(), &[3, 2, 0]);

    let mut visited = Vec::new();
    a.for_each(|v| visited.push(*v));
    a.for_each_with("x", |v, tag| visited.push(v + tag.len() as i32));
    assert_eq!(visited, vec![3, 2, 0, 4, 3, 1]);
}
