//! Fast resizable arrays for hot paths.
//!
//! Two arrays share one storage engine ([`RawArray`]):
//!
//! - [`ManagedArray`] stores counted handles (`Rc`, `Arc` or any [`Handle`]). It
//!   takes one reference when storing a handle and gives it back on removal, and
//!   searches by identity.
//! - [`ValueArray`] stores plain `Copy` records and searches with an
//!   [`Equality`] strategy, `PartialEq` by default.
//!
//! Capacity is never below one, grows by doubling on the resize-aware calls and
//! only shrinks when asked to. Both arrays can be sorted in place with the stable
//! sorts of the [`sort`] module.
//!
//! Operations that have preconditions come in two flavors: a checked one that
//! reports violations with an [`ArrayError`], and an `unsafe` `_unchecked` one
//! for loops where the caller already knows the indices and capacity are valid.

pub mod alloc;
pub mod equality;
pub mod error;
pub mod handle;
pub mod managed;
pub mod raw;
pub mod sort;
pub mod value;
mod util;

#[cfg(test)]
mod testing;

pub use equality::{Equality, Identity, Structural};
pub use error::ArrayError;
pub use handle::Handle;
pub use managed::ManagedArray;
pub use raw::RawArray;
pub use value::ValueArray;
