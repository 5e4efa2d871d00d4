use std::rc::Rc;
use std::sync::Arc;

/// A counted reference to a shared object, stored by `ManagedArray`.
///
/// Cloning a handle takes one reference and dropping it gives the reference back.
/// The array clones a handle exactly once when storing it and drops it exactly
/// once when removing it. Moving a handle around inside the array (shifts,
/// swaps, sorting) never touches the count.
pub trait Handle: Clone {
    /// Whether both handles refer to the same object.
    fn same_object(a: &Self, b: &Self) -> bool;
}

impl<T: ?Sized> Handle for Rc<T> {
    #[inline]
    fn same_object(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(a, b)
    }
}

impl<T: ?Sized> Handle for Arc<T> {
    #[inline]
    fn same_object(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(a, b)
    }
}

#[test]
fn identity_not_value() {
    let a = Rc::new(1);
    let b = Rc::new(1);
    assert!(Handle::same_object(&a, &a.clone()));
    assert!(!Handle::same_object(&a, &b));

    let c = Arc::new("x");
    assert!(Handle::same_object(&c, &c.clone()));
    assert!(!Handle::same_object(&c, &Arc::new("x")));
}
