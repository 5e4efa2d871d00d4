use crate::handle::Handle;

/// Equality used by the search and bulk removal operations.
pub trait Equality<T: ?Sized> {
    fn equal(&self, a: &T, b: &T) -> bool;
}

/// Compares values with `PartialEq`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Structural;

impl<T: PartialEq + ?Sized> Equality<T> for Structural {
    #[inline]
    fn equal(&self, a: &T, b: &T) -> bool {
        a == b
    }
}

/// Compares handles by the object they point to.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Identity;

impl<H: Handle> Equality<H> for Identity {
    #[inline]
    fn equal(&self, a: &H, b: &H) -> bool {
        H::same_object(a, b)
    }
}

impl<T: ?Sized, F> Equality<T> for F
where
    F: Fn(&T, &T) -> bool,
{
    #[inline]
    fn equal(&self, a: &T, b: &T) -> bool {
        self(a, b)
    }
}

#[test]
fn strategies() {
    use std::rc::Rc;

    assert!(Structural.equal(&3, &3));
    assert!(!Structural.equal("a", "b"));

    let a = Rc::new(5);
    assert!(Identity.equal(&a, &a.clone()));
    assert!(!Identity.equal(&a, &Rc::new(5)));

    let same_parity = |a: &u32, b: &u32| a % 2 == b % 2;
    assert!(same_parity.equal(&2, &8));
    assert!(!same_parity.equal(&2, &7));
}
