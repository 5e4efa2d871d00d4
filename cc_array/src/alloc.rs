pub use allocator_api2::alloc::{AllocError, Allocator, Global};
