use core::alloc::Layout;
use core::mem;

use crate::error::ArrayError;

/// Contract check for the unchecked path.
///
/// Panics in debug builds (or with the `checks` feature), otherwise tells the
/// optimizer the condition holds.
#[track_caller]
#[inline(always)]
#[cfg(any(debug_assertions, feature = "checks"))]
pub unsafe fn assume(v: bool) {
    if !v {
        core::unreachable!()
    }
}

#[track_caller]
#[inline(always)]
#[cfg(not(any(debug_assertions, feature = "checks")))]
pub unsafe fn assume(v: bool) {
    if !v {
        unsafe {
            core::hint::unreachable_unchecked();
        }
    }
}

pub(crate) const fn is_zst<T>() -> bool {
    mem::size_of::<T>() == 0
}

pub(crate) fn array_layout<T>(cap: usize) -> Result<Layout, ArrayError> {
    Layout::array::<T>(cap).map_err(|_| ArrayError::CapacityOverflow)
}

/// Smallest capacity obtained by doubling `cap` that holds `required` items.
pub(crate) fn grow_by_doubling(cap: usize, required: usize) -> Result<usize, ArrayError> {
    let mut new_cap = cap.max(1);
    while new_cap < required {
        new_cap = new_cap.checked_mul(2).ok_or(ArrayError::CapacityOverflow)?;
    }

    Ok(new_cap)
}

#[inline]
pub(crate) fn check_index(index: usize, len: usize) -> Result<(), ArrayError> {
    if index >= len {
        return Err(ArrayError::IndexOutOfBounds { index, len });
    }

    Ok(())
}

#[inline]
pub(crate) fn check_insertion_index(index: usize, len: usize) -> Result<(), ArrayError> {
    if index > len {
        return Err(ArrayError::IndexOutOfBounds { index, len });
    }

    Ok(())
}

/// Growth and shrink have no recoverable error path outside of the `try_` methods.
#[inline]
pub(crate) fn handle_reserve(result: Result<(), ArrayError>) {
    match result {
        Ok(()) => {}
        Err(ArrayError::Alloc { layout }) => alloc_failed(layout),
        Err(_) => capacity_overflow(),
    }
}

#[cold]
#[inline(never)]
#[track_caller]
pub(crate) fn capacity_overflow() -> ! {
    panic!("capacity overflow");
}

#[cold]
#[inline(never)]
pub(crate) fn alloc_failed(layout: Layout) -> ! {
    log::error!("failed to allocate {} bytes for array storage", layout.size());
    std::alloc::handle_alloc_error(layout)
}

// Waiting for `non_null_convenience` to be stabilized.
pub mod nnptr {
    use std::ptr::{self, NonNull};

    #[inline(always)]
    pub unsafe fn read<T>(src: NonNull<T>) -> T {
        ptr::read(src.as_ptr())
    }

    #[inline(always)]
    pub unsafe fn write<T>(dst: NonNull<T>, val: T) {
        ptr::write(dst.as_ptr(), val)
    }

    #[inline(always)]
    pub unsafe fn copy<T>(src: NonNull<T>, dst: NonNull<T>, count: usize) {
        ptr::copy(src.as_ptr(), dst.as_ptr(), count)
    }

    #[inline(always)]
    pub unsafe fn copy_nonoverlapping<T>(src: NonNull<T>, dst: NonNull<T>, count: usize) {
        ptr::copy_nonoverlapping(src.as_ptr(), dst.as_ptr(), count)
    }

    #[inline(always)]
    pub unsafe fn add<T>(p: NonNull<T>, count: usize) -> NonNull<T> {
        NonNull::new_unchecked(p.as_ptr().add(count))
    }
}

#[test]
fn doubling_policy() {
    assert_eq!(grow_by_doubling(1, 1).unwrap(), 1);
    assert_eq!(grow_by_doubling(1, 2).unwrap(), 2);
    assert_eq!(grow_by_doubling(1, 5).unwrap(), 8);
    assert_eq!(grow_by_doubling(3, 7).unwrap(), 12);
    assert_eq!(grow_by_doubling(16, 4).unwrap(), 16);
    assert!(matches!(
        grow_by_doubling(usize::MAX / 2 + 1, usize::MAX),
        Err(ArrayError::CapacityOverflow)
    ));
}

#[test]
fn index_checks() {
    assert!(check_index(0, 1).is_ok());
    assert!(check_index(1, 1).is_err());
    assert!(check_insertion_index(1, 1).is_ok());
    assert_eq!(
        check_insertion_index(3, 1),
        Err(ArrayError::IndexOutOfBounds { index: 3, len: 1 })
    );
}
