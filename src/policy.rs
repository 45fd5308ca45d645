//! Copy and delete policies.
//!
//! A [`CopyOnWrite`] that was built from a box carries one [`Copier`] and one
//! [`Deleter`] for the concrete stored type `U`. The copier is invoked every
//! time the held value has to be duplicated (on `clone`, on assignment, and
//! when [`CopyOnWrite::mutate`] detaches a shared holder); the deleter is
//! invoked exactly once when the last owner of the value goes away.
//!
//! Closures work as policies directly:
//!
//! ```
//! use copy_on_write::{CopyError, CopyOnWrite};
//!
//! let w: CopyOnWrite<String> = CopyOnWrite::from_box_with(
//!     Box::new(String::from("hi")),
//!     |s: &String| -> Result<Box<String>, CopyError> { Ok(Box::new(s.to_uppercase())) },
//!     |s: Box<String>| drop(s),
//! );
//! let v = w.clone();
//! assert_eq!(*v, "HI");
//! ```
//!
//! [`CopyOnWrite`]: crate::CopyOnWrite
//! [`CopyOnWrite::mutate`]: crate::CopyOnWrite::mutate
use alloc::boxed::Box;

use crate::error::CopyError;

/// Produces an independent heap copy of a `U`.
///
/// Implementations must return an object equivalent to the argument, or an
/// error. They must not modify anything reachable from `value`.
pub trait Copier<U>: Send + Sync + 'static {
    fn copy(&self, value: &U) -> Result<Box<U>, CopyError>;
}

/// Releases a `U` that was owned by a holder.
///
/// Called exactly once per stored object. Must not panic.
pub trait Deleter<U>: Send + Sync + 'static {
    fn delete(&self, value: Box<U>);
}

/// Copies through [`Clone`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultCopy;

/// Releases by dropping the box.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultDelete;

impl<U: Clone> Copier<U> for DefaultCopy {
    #[inline]
    fn copy(&self, value: &U) -> Result<Box<U>, CopyError> {
        Ok(Box::new(value.clone()))
    }
}

impl<U> Deleter<U> for DefaultDelete {
    #[inline]
    fn delete(&self, value: Box<U>) {
        drop(value)
    }
}

impl<U, F> Copier<U> for F
where
    F: Fn(&U) -> Result<Box<U>, CopyError> + Send + Sync + 'static,
{
    #[inline]
    fn copy(&self, value: &U) -> Result<Box<U>, CopyError> {
        self(value)
    }
}

impl<U, F> Deleter<U> for F
where
    F: Fn(Box<U>) + Send + Sync + 'static,
{
    #[inline]
    fn delete(&self, value: Box<U>) {
        self(value)
    }
}

/// Like [`Clone`], but copying may fail.
///
/// This is the hook for types whose copy constructor can fail, e.g. because it
/// acquires a resource. Use it with the [`TryCloneCopy`] policy.
pub trait TryClone: Sized {
    fn try_clone(&self) -> Result<Self, CopyError>;
}

/// Copies through [`TryClone`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TryCloneCopy;

impl<U: TryClone> Copier<U> for TryCloneCopy {
    #[inline]
    fn copy(&self, value: &U) -> Result<Box<U>, CopyError> {
        value.try_clone().map(Box::new)
    }
}
