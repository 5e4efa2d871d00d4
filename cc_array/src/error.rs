use core::alloc::Layout;
use thiserror::Error;

/// Errors reported by the checked array API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArrayError {
    #[error("index {index} is out of bounds (len is {len})")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("not enough capacity for {additional} more items (len {len}, capacity {capacity})")]
    CapacityExceeded {
        len: usize,
        capacity: usize,
        additional: usize,
    },
    #[error("capacity overflow")]
    CapacityOverflow,
    #[error("failed to allocate {} bytes", .layout.size())]
    Alloc { layout: Layout },
}

pub type Result<T> = std::result::Result<T, ArrayError>;

#[test]
fn messages() {
    let err = ArrayError::IndexOutOfBounds { index: 4, len: 2 };
    assert_eq!(err.to_string(), "index 4 is out of bounds (len is 2)");

    let err = ArrayError::CapacityExceeded {
        len: 2,
        capacity: 2,
        additional: 1,
    };
    assert_eq!(
        err.to_string(),
        "not enough capacity for 1 more items (len 2, capacity 2)"
    );

    let layout = Layout::array::<u64>(4).unwrap();
    assert_eq!(ArrayError::Alloc { layout }.to_string(), "failed to allocate 32 bytes");
}
