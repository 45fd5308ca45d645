//! Views of a concrete type as one of its "bases".
//!
//! Rust has no implementation inheritance, so the upward conversion from a
//! wrapper of a concrete type to a wrapper of a base is spelled out as a pair
//! of projection functions: one for shared access and one for mutable access.
//! A base can be a trait object the concrete type implements, or a subobject
//! (a field) of it.
use alloc::{string::String, vec::Vec};
use core::fmt;

/// `Self` can be viewed as a `T`.
///
/// Every type is a view of itself. Implement this for each concrete type and
/// each trait object (or embedded part) it should be convertible to:
///
/// ```
/// use copy_on_write::{AsBase, CopyOnWrite};
///
/// trait Shape {
///     fn area(&self) -> f64;
/// }
///
/// #[derive(Clone)]
/// struct Square(f64);
///
/// impl Shape for Square {
///     fn area(&self) -> f64 {
///         self.0 * self.0
///     }
/// }
///
/// impl AsBase<dyn Shape> for Square {
///     fn as_base(&self) -> &(dyn Shape + 'static) {
///         self
///     }
///     fn as_base_mut(&mut self) -> &mut (dyn Shape + 'static) {
///         self
///     }
/// }
///
/// let s: CopyOnWrite<dyn Shape> = CopyOnWrite::from_value(Square(3.0));
/// assert_eq!(s.area(), 9.0);
/// ```
pub trait AsBase<T: ?Sized> {
    fn as_base(&self) -> &T;
    fn as_base_mut(&mut self) -> &mut T;
}

impl<T: ?Sized> AsBase<T> for T {
    #[inline]
    fn as_base(&self) -> &T {
        self
    }

    #[inline]
    fn as_base_mut(&mut self) -> &mut T {
        self
    }
}

impl AsBase<str> for String {
    fn as_base(&self) -> &str {
        self
    }

    fn as_base_mut(&mut self) -> &mut str {
        self
    }
}

impl<T> AsBase<[T]> for Vec<T> {
    fn as_base(&self) -> &[T] {
        self
    }

    fn as_base_mut(&mut self) -> &mut [T] {
        self
    }
}

impl<T, const N: usize> AsBase<[T]> for [T; N] {
    fn as_base(&self) -> &[T] {
        self
    }

    fn as_base_mut(&mut self) -> &mut [T] {
        self
    }
}

/// Shared and mutable projections from a `U` to a `T` living inside it.
///
/// Plain function pointers, so a projection is `Copy + Send + Sync` whatever
/// `U` and `T` are.
pub(crate) struct Projection<U: ?Sized, T: ?Sized> {
    pub(crate) get: fn(&U) -> &T,
    pub(crate) get_mut: fn(&mut U) -> &mut T,
}

impl<U: ?Sized, T: ?Sized> Projection<U, T> {
    pub(crate) fn new(get: fn(&U) -> &T, get_mut: fn(&mut U) -> &mut T) -> Self {
        Projection { get, get_mut }
    }

    pub(crate) fn as_base() -> Self
    where
        U: AsBase<T>,
    {
        Projection::new(<U as AsBase<T>>::as_base, <U as AsBase<T>>::as_base_mut)
    }
}

impl<U: ?Sized, T: ?Sized> Clone for Projection<U, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<U: ?Sized, T: ?Sized> Copy for Projection<U, T> {}

impl<U: ?Sized, T: ?Sized> fmt::Debug for Projection<U, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Projection")
            .field("from", &core::any::type_name::<U>())
            .field("to", &core::any::type_name::<T>())
            .finish()
    }
}
