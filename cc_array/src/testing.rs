use core::alloc::Layout;
use core::cell::Cell;
use core::ptr::NonNull;

use crate::alloc::{AllocError, Allocator, Global};

/// Forwards to the global allocator and keeps track of live allocations.
pub struct CountingAllocator {
    allocations: Cell<usize>,
    deallocations: Cell<usize>,
}

impl CountingAllocator {
    pub fn new() -> Self {
        CountingAllocator {
            allocations: Cell::new(0),
            deallocations: Cell::new(0),
        }
    }

    pub fn allocations(&self) -> usize {
        self.allocations.get()
    }

    pub fn live_allocations(&self) -> usize {
        self.allocations.get() - self.deallocations.get()
    }
}

unsafe impl Allocator for CountingAllocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let alloc = Global.allocate(layout)?;
        self.allocations.set(self.allocations.get() + 1);

        Ok(alloc)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.deallocations.set(self.deallocations.get() + 1);
        Global.deallocate(ptr, layout)
    }
}

/// Forwards to the global allocator but refuses requests larger than `max_size`
/// bytes.
pub struct LimitedAllocator {
    max_size: usize,
}

impl LimitedAllocator {
    pub fn new(max_size: usize) -> Self {
        LimitedAllocator { max_size }
    }
}

unsafe impl Allocator for LimitedAllocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        if layout.size() > self.max_size {
            return Err(AllocError);
        }

        Global.allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        Global.deallocate(ptr, layout)
    }
}

#[test]
fn failed_growth_keeps_the_array() {
    use crate::error::ArrayError;
    use crate::raw::RawArray;

    let mut a: RawArray<u64, _> = RawArray::with_capacity_in(2, LimitedAllocator::new(64));
    a.push(1);
    a.push(2);

    // 102 slots rounded up by doubling to 128, 1024 bytes.
    let layout = Layout::array::<u64>(128).unwrap();
    assert_eq!(a.try_ensure_extra_capacity(100), Err(ArrayError::Alloc { layout }));
    assert_eq!(a.len(), 2);
    assert_eq!(a.capacity(), 2);
    assert_eq!(a.as_slice(), &[1, 2]);

    assert_eq!(a.try_ensure_extra_capacity(6), Ok(()));
    assert_eq!(a.capacity(), 8);
    assert_eq!(a.as_slice(), &[1, 2]);
}

#[test]
fn failed_allocation_on_creation() {
    use crate::error::ArrayError;
    use crate::managed::ManagedArray;
    use crate::raw::RawArray;
    use std::rc::Rc;

    let layout = Layout::array::<u64>(100).unwrap();
    let result = RawArray::<u64, _>::try_with_capacity_in(100, LimitedAllocator::new(64));
    assert_eq!(result.err(), Some(ArrayError::Alloc { layout }));

    let result = ManagedArray::<Rc<u64>, _>::try_with_capacity_in(100, LimitedAllocator::new(64));
    assert!(matches!(result, Err(ArrayError::Alloc { .. })));

    let small = RawArray::<u64, _>::try_with_capacity_in(8, LimitedAllocator::new(64));
    assert!(small.is_ok());
}
