use core::cmp::Ordering;
use core::fmt;
use core::marker::PhantomData;
use core::ptr::{self, NonNull};

use crate::alloc::{Allocator, Global};
use crate::error::ArrayError;
use crate::sort;
use crate::util::{self, assume, is_zst, nnptr};

/// The storage engine shared by `ManagedArray` and `ValueArray`.
///
/// A single contiguous buffer of `capacity` slots, the first `len` of which are
/// initialized. The capacity is never less than one.
///
/// Growth only happens through the resize-aware methods and always doubles the
/// capacity. Shrinking only happens on explicit calls to `shrink_to_fit`.
///
/// # Buffer relocation
///
/// Any method that can change the capacity may move the buffer. References into
/// the buffer borrow the array so the borrow checker rejects their use across such
/// calls. Raw pointers obtained through `as_ptr` are not tracked and must not be
/// dereferenced after a capacity-changing call.
pub struct RawArray<T, A: Allocator = Global> {
    data: NonNull<T>,
    len: usize,
    cap: usize,
    allocator: A,
    _marker: PhantomData<T>,
}

unsafe impl<T: Send, A: Allocator + Send> Send for RawArray<T, A> {}
unsafe impl<T: Sync, A: Allocator + Sync> Sync for RawArray<T, A> {}

impl<T> RawArray<T, Global> {
    /// Creates an empty array with room for `cap` items (at least one).
    pub fn with_capacity(cap: usize) -> Self {
        Self::with_capacity_in(cap, Global)
    }
}

impl<T, A: Allocator> RawArray<T, A> {
    /// Creates an empty array with room for `cap` items (at least one).
    ///
    /// Aborts if the allocation fails.
    pub fn with_capacity_in(cap: usize, allocator: A) -> Self {
        match Self::try_with_capacity_in(cap, allocator) {
            Ok(array) => array,
            Err(ArrayError::Alloc { layout }) => util::alloc_failed(layout),
            Err(_) => util::capacity_overflow(),
        }
    }

    pub fn try_with_capacity_in(cap: usize, allocator: A) -> Result<Self, ArrayError> {
        let cap = cap.max(1);

        let data = if is_zst::<T>() {
            NonNull::dangling()
        } else {
            let layout = util::array_layout::<T>(cap)?;
            allocator
                .allocate(layout)
                .map_err(|_| ArrayError::Alloc { layout })?
                .cast::<T>()
        };

        Ok(RawArray {
            data,
            len: 0,
            cap,
            allocator,
            _marker: PhantomData,
        })
    }

    #[inline]
    /// Returns `true` if the array contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    /// Returns the number of elements in the array.
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    /// Returns the total number of elements the array can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Returns number of elements that can be added without reallocating.
    #[inline]
    pub fn remaining_capacity(&self) -> usize {
        self.cap - self.len
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        unsafe { core::slice::from_raw_parts(self.data.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { core::slice::from_raw_parts_mut(self.data.as_ptr(), self.len) }
    }

    /// Address of the first slot.
    ///
    /// The pointer is invalidated by any call that can change the capacity.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.data.as_ptr()
    }

    #[inline(always)]
    unsafe fn item_ptr(&self, index: usize) -> NonNull<T> {
        nnptr::add(self.data, index)
    }

    #[inline(always)]
    unsafe fn write_item(&mut self, index: usize, val: T) {
        debug_assert!(index < self.cap);
        let dst = self.item_ptr(index);
        nnptr::write(dst, val);
    }

    #[inline(always)]
    unsafe fn read_item(&self, index: usize) -> T {
        debug_assert!(index < self.cap);
        nnptr::read(self.item_ptr(index))
    }

    /// Grows the capacity by doubling until at least `additional` more items fit.
    ///
    /// Aborts if the allocation fails.
    #[inline]
    pub fn ensure_extra_capacity(&mut self, additional: usize) {
        if self.remaining_capacity() < additional {
            util::handle_reserve(self.try_grow_for(additional));
        }
    }

    /// Fallible version of `ensure_extra_capacity`.
    #[inline]
    pub fn try_ensure_extra_capacity(&mut self, additional: usize) -> Result<(), ArrayError> {
        if self.remaining_capacity() < additional {
            return self.try_grow_for(additional);
        }

        Ok(())
    }

    #[cold]
    fn try_grow_for(&mut self, additional: usize) -> Result<(), ArrayError> {
        let required = self
            .len
            .checked_add(additional)
            .ok_or(ArrayError::CapacityOverflow)?;
        let new_cap = util::grow_by_doubling(self.cap, required)?;

        self.try_realloc_with_capacity(new_cap)
    }

    /// Doubles the capacity.
    ///
    /// Aborts if the allocation fails.
    pub fn double_capacity(&mut self) {
        let new_cap = match self.cap.checked_mul(2) {
            Some(cap) => cap,
            None => util::capacity_overflow(),
        };

        util::handle_reserve(self.try_realloc_with_capacity(new_cap));
    }

    /// Reduces the capacity to `max(len, 1)`.
    pub fn shrink_to_fit(&mut self) {
        let new_cap = self.len.max(1);
        if self.cap > new_cap {
            util::handle_reserve(self.try_realloc_with_capacity(new_cap));
        }
    }

    #[cold]
    fn try_realloc_with_capacity(&mut self, new_cap: usize) -> Result<(), ArrayError> {
        debug_assert!(new_cap >= self.len);
        debug_assert!(new_cap >= 1);

        if new_cap == self.cap {
            return Ok(());
        }

        log::debug!(
            "reallocating array storage: {} -> {} slots ({} live)",
            self.cap,
            new_cap,
            self.len
        );

        if is_zst::<T>() {
            self.cap = new_cap;
            return Ok(());
        }

        let old_layout = util::array_layout::<T>(self.cap)?;
        let new_layout = util::array_layout::<T>(new_cap)?;

        let new_alloc = unsafe {
            let old_alloc = self.data.cast::<u8>();
            if new_layout.size() >= old_layout.size() {
                self.allocator.grow(old_alloc, old_layout, new_layout)
            } else {
                self.allocator.shrink(old_alloc, old_layout, new_layout)
            }
        }
        .map_err(|_| ArrayError::Alloc { layout: new_layout })?;

        self.data = new_alloc.cast::<T>();
        self.cap = new_cap;

        Ok(())
    }

    /// Appends an element without checking the capacity.
    ///
    /// # Safety
    ///
    /// The array must have spare capacity.
    #[inline(always)]
    pub unsafe fn push_unchecked(&mut self, val: T) {
        assume(self.len < self.cap);

        self.write_item(self.len, val);
        self.len += 1;
    }

    /// Appends an element if there is spare capacity, otherwise returns it.
    #[inline]
    pub fn push_within_capacity(&mut self, val: T) -> Result<(), T> {
        if self.len == self.cap {
            return Err(val);
        }

        unsafe {
            self.push_unchecked(val);
        }

        Ok(())
    }

    /// Appends an element, doubling the capacity if needed.
    #[inline]
    pub fn push(&mut self, val: T) {
        self.ensure_extra_capacity(1);
        unsafe {
            self.push_unchecked(val);
        }
    }

    /// Inserts an element at `index`, shifting the following ones to the right.
    ///
    /// Grows the capacity if needed.
    ///
    /// # Safety
    ///
    /// `index` must be less than or equal to `len`.
    pub unsafe fn insert_unchecked(&mut self, index: usize, val: T) {
        assume(index <= self.len);

        self.ensure_extra_capacity(1);

        let p = self.item_ptr(index);
        let remaining = self.len - index;
        if remaining > 0 {
            nnptr::copy(p, nnptr::add(p, 1), remaining);
        }
        nnptr::write(p, val);

        self.len += 1;
    }

    /// Removes and returns the element at `index`, shifting the following ones to
    /// the left.
    ///
    /// # Safety
    ///
    /// `index` must be less than `len`.
    pub unsafe fn remove_unchecked(&mut self, index: usize) -> T {
        assume(index < self.len);

        let p = self.item_ptr(index);
        let item = nnptr::read(p);
        self.len -= 1;

        let remaining = self.len - index;
        if remaining > 0 {
            nnptr::copy(nnptr::add(p, 1), p, remaining);
        }

        item
    }

    /// Removes and returns the element at `index`, moving the last element into
    /// its slot.
    ///
    /// # Safety
    ///
    /// `index` must be less than `len`.
    pub unsafe fn swap_remove_unchecked(&mut self, index: usize) -> T {
        assume(index < self.len);

        let item = self.read_item(index);
        self.len -= 1;

        let last = self.len;
        if index != last {
            nnptr::copy_nonoverlapping(self.item_ptr(last), self.item_ptr(index), 1);
        }

        item
    }

    /// Stable merge sort, with the scratch buffer allocated in this array's allocator.
    pub fn merge_sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let items = unsafe { core::slice::from_raw_parts_mut(self.data.as_ptr(), self.len) };
        sort::merge_sort_by_in(items, compare, &self.allocator);
    }

    /// Drops the elements past `new_len`.
    pub fn truncate(&mut self, new_len: usize) {
        if new_len >= self.len {
            return;
        }

        unsafe {
            let tail = ptr::slice_from_raw_parts_mut(
                self.item_ptr(new_len).as_ptr(),
                self.len - new_len,
            );
            self.len = new_len;
            ptr::drop_in_place(tail);
        }
    }

    /// Drops all elements. The capacity is unchanged.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Keeps the elements for which `keep` returns true, in order.
    ///
    /// Single pass: kept elements are swapped towards the front and the rest is
    /// dropped at the end.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&T) -> bool,
    {
        let slice = self.as_mut_slice();
        let mut kept = 0;
        for i in 0..slice.len() {
            if keep(&slice[i]) {
                if kept != i {
                    slice.swap(kept, i);
                }
                kept += 1;
            }
        }

        self.truncate(kept);
    }

    /// Clones and appends the items of `slice` without checking the capacity.
    ///
    /// # Safety
    ///
    /// The array must have room for `slice.len()` more items.
    pub unsafe fn extend_from_slice_unchecked(&mut self, slice: &[T])
    where
        T: Clone,
    {
        assume(self.remaining_capacity() >= slice.len());

        for item in slice {
            self.push_unchecked(item.clone());
        }
    }

    /// Clones and appends the items of `slice`, doubling the capacity as needed.
    pub fn extend_from_slice(&mut self, slice: &[T])
    where
        T: Clone,
    {
        self.ensure_extra_capacity(slice.len());
        unsafe {
            self.extend_from_slice_unchecked(slice);
        }
    }
}

impl<T, A: Allocator> Drop for RawArray<T, A> {
    fn drop(&mut self) {
        self.clear();

        if is_zst::<T>() {
            return;
        }

        unsafe {
            // The layout was valid when the buffer was allocated.
            let layout = core::alloc::Layout::array::<T>(self.cap).unwrap_unchecked();
            self.allocator.deallocate(self.data.cast::<u8>(), layout);
        }
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for RawArray<T, A> {
    fn clone(&self) -> Self {
        let mut array = RawArray::with_capacity_in(self.cap, self.allocator.clone());
        unsafe {
            array.extend_from_slice_unchecked(self.as_slice());
        }

        array
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for RawArray<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_slice(), f)
    }
}

#[cfg(test)]
use crate::testing::CountingAllocator;

#[test]
fn capacity_is_at_least_one() {
    let a: RawArray<u32> = RawArray::with_capacity(0);
    assert_eq!(a.capacity(), 1);
    assert_eq!(a.len(), 0);

    let b: RawArray<u32> = RawArray::with_capacity(7);
    assert_eq!(b.capacity(), 7);
}

#[test]
fn growth_doubles() {
    let mut a: RawArray<u32> = RawArray::with_capacity(1);
    let mut caps = Vec::new();
    for i in 0..9 {
        a.push(i);
        caps.push(a.capacity());
    }

    assert_eq!(caps, vec![1, 2, 4, 4, 8, 8, 8, 8, 16]);
    assert_eq!(a.as_slice(), &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
}

#[test]
fn ensure_extra_capacity() {
    let mut a: RawArray<u32> = RawArray::with_capacity(3);
    a.push(1);
    a.push(2);

    a.ensure_extra_capacity(1);
    assert_eq!(a.capacity(), 3);

    a.ensure_extra_capacity(5);
    assert_eq!(a.capacity(), 12);
    assert!(a.capacity() >= a.len() + 5);
    assert_eq!(a.as_slice(), &[1, 2]);

    a.ensure_extra_capacity(0);
    assert_eq!(a.capacity(), 12);
}

#[test]
fn double_and_shrink() {
    let mut a: RawArray<u64> = RawArray::with_capacity(2);
    a.double_capacity();
    assert_eq!(a.capacity(), 4);
    a.push(10);
    a.push(11);
    a.push(12);

    a.shrink_to_fit();
    assert_eq!(a.capacity(), 3);
    a.shrink_to_fit();
    assert_eq!(a.capacity(), 3);
    assert_eq!(a.as_slice(), &[10, 11, 12]);

    a.clear();
    a.shrink_to_fit();
    assert_eq!(a.capacity(), 1);
    assert!(a.is_empty());
}

#[test]
fn insert_and_remove() {
    let mut a: RawArray<u32> = RawArray::with_capacity(1);
    a.push(1);
    a.push(3);
    unsafe {
        a.insert_unchecked(1, 2);
        a.insert_unchecked(0, 0);
        a.insert_unchecked(4, 4);
    }
    assert_eq!(a.as_slice(), &[0, 1, 2, 3, 4]);

    unsafe {
        assert_eq!(a.remove_unchecked(1), 1);
        assert_eq!(a.as_slice(), &[0, 2, 3, 4]);
        assert_eq!(a.swap_remove_unchecked(0), 0);
        assert_eq!(a.as_slice(), &[4, 2, 3]);
        assert_eq!(a.swap_remove_unchecked(2), 3);
        assert_eq!(a.as_slice(), &[4, 2]);
    }
}

#[test]
fn push_within_capacity() {
    let mut a: RawArray<u8> = RawArray::with_capacity(2);
    assert_eq!(a.push_within_capacity(1), Ok(()));
    assert_eq!(a.push_within_capacity(2), Ok(()));
    assert_eq!(a.push_within_capacity(3), Err(3));
    assert_eq!(a.capacity(), 2);
}

#[test]
fn retain_keeps_order() {
    let mut a: RawArray<u32> = RawArray::with_capacity(4);
    a.extend_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8, 9]);
    a.retain(|v| v % 3 != 0);
    assert_eq!(a.as_slice(), &[1, 2, 4, 5, 7, 8]);
}

#[test]
fn drops_everything() {
    use std::rc::Rc;

    let item = Rc::new(());
    let allocator = CountingAllocator::new();
    {
        let mut a = RawArray::with_capacity_in(1, &allocator);
        for _ in 0..100 {
            a.push(item.clone());
        }
        assert_eq!(Rc::strong_count(&item), 101);

        a.truncate(40);
        assert_eq!(Rc::strong_count(&item), 41);
        a.shrink_to_fit();
        assert_eq!(a.capacity(), 40);
    }

    assert_eq!(Rc::strong_count(&item), 1);
    assert_eq!(allocator.live_allocations(), 0);
    assert!(allocator.allocations() >= 1);
}

#[test]
fn zst_items() {
    let mut a: RawArray<()> = RawArray::with_capacity(0);
    for _ in 0..5 {
        a.push(());
    }

    assert_eq!(a.len(), 5);
    assert_eq!(a.capacity(), 8);
    a.shrink_to_fit();
    assert_eq!(a.capacity(), 5);
}

#[test]
fn fallible_growth() {
    let mut a: RawArray<u64> = RawArray::with_capacity(1);
    a.push(0);
    assert_eq!(
        a.try_ensure_extra_capacity(usize::MAX),
        Err(ArrayError::CapacityOverflow)
    );
    assert_eq!(a.try_ensure_extra_capacity(3), Ok(()));
    assert_eq!(a.capacity(), 4);
}
