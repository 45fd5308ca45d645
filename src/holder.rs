//! Type-erased owners of the value behind a [`CopyOnWrite`].
//!
//! A holder knows the concrete stored type and its copy policy; everything
//! above it only sees `T`. There are three kinds:
//!
//! * [`Indirect`] owns a separately boxed `U` plus its copier and deleter.
//! * [`Direct`] stores the `U` inline, copying through `Clone`.
//! * [`Delegating`] wraps a holder for some `U` and projects it to `T`,
//!   without copying anything.
//!
//! [`CopyOnWrite`]: crate::CopyOnWrite
use alloc::{boxed::Box, sync::Arc};
use core::{any, mem::ManuallyDrop};

use crate::{
    base::{AsBase, Projection},
    error::CopyError,
    policy::{Copier, Deleter},
};

pub(crate) trait Holder<T: ?Sized>: Send + Sync {
    /// An independent holder with its own copy of the value. Never modifies
    /// `self`, also when it fails.
    fn try_clone(&self) -> Result<Arc<dyn Holder<T>>, CopyError>;

    fn get(&self) -> &T;

    /// Mutable access. Holders that share state underneath detach it first,
    /// which is the only reason this can fail.
    fn get_mut(&mut self) -> Result<&mut T, CopyError>;
}

/// Get exclusive access to the holder behind `holder`, replacing it with a
/// fresh copy if it is shared.
///
/// On failure `holder` is unchanged.
pub(crate) fn make_unique<T: ?Sized + 'static>(
    holder: &mut Arc<dyn Holder<T>>,
) -> Result<&mut (dyn Holder<T> + 'static), CopyError> {
    if Arc::get_mut(holder).is_none() {
        tracing::trace!(
            view = any::type_name::<T>(),
            sharers = Arc::strong_count(holder),
            "detaching shared holder"
        );
        *holder = holder.try_clone()?;
    }
    match Arc::get_mut(holder) {
        Some(h) => Ok(h),
        // a freshly cloned holder has exactly one owner and no weak refs
        None => unreachable!("detached holder is still shared"),
    }
}

pub(crate) struct Indirect<U, C, D: Deleter<U>> {
    // Released through `deleter` in `drop`.
    value: ManuallyDrop<Box<U>>,
    copier: C,
    deleter: D,
}

impl<U, C, D: Deleter<U>> Indirect<U, C, D> {
    pub(crate) fn new(value: Box<U>, copier: C, deleter: D) -> Self {
        Indirect {
            value: ManuallyDrop::new(value),
            copier,
            deleter,
        }
    }

    fn value(&self) -> &U {
        &self.value
    }

    fn value_mut(&mut self) -> &mut U {
        &mut self.value
    }
}

impl<T, U, C, D> Holder<T> for Indirect<U, C, D>
where
    T: ?Sized + 'static,
    U: AsBase<T> + Send + Sync + 'static,
    C: Copier<U> + Clone,
    D: Deleter<U> + Clone,
{
    fn try_clone(&self) -> Result<Arc<dyn Holder<T>>, CopyError> {
        // Clone the policies first, so a copied value is never left without
        // the deleter that has to release it.
        let copier = self.copier.clone();
        let deleter = self.deleter.clone();
        let value = match self.copier.copy(self.value()) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(
                    stored = any::type_name::<U>(),
                    error = %err,
                    "copy policy failed"
                );
                return Err(err);
            }
        };
        Ok(Arc::new(Indirect::new(value, copier, deleter)))
    }

    fn get(&self) -> &T {
        <U as AsBase<T>>::as_base(self.value())
    }

    fn get_mut(&mut self) -> Result<&mut T, CopyError> {
        Ok(<U as AsBase<T>>::as_base_mut(self.value_mut()))
    }
}

impl<U, C, D: Deleter<U>> Drop for Indirect<U, C, D> {
    fn drop(&mut self) {
        // Safety: `value` is never used again after being taken here.
        let value = unsafe { ManuallyDrop::take(&mut self.value) };
        self.deleter.delete(value);
    }
}

pub(crate) struct Direct<U> {
    value: U,
}

impl<U> Direct<U> {
    pub(crate) fn new(value: U) -> Self {
        Direct { value }
    }
}

impl<T, U> Holder<T> for Direct<U>
where
    T: ?Sized + 'static,
    U: AsBase<T> + Clone + Send + Sync + 'static,
{
    fn try_clone(&self) -> Result<Arc<dyn Holder<T>>, CopyError> {
        Ok(Arc::new(Direct::new(self.value.clone())))
    }

    fn get(&self) -> &T {
        <U as AsBase<T>>::as_base(&self.value)
    }

    fn get_mut(&mut self) -> Result<&mut T, CopyError> {
        Ok(<U as AsBase<T>>::as_base_mut(&mut self.value))
    }
}

pub(crate) struct Delegating<T: ?Sized + 'static, U: ?Sized + 'static> {
    delegate: Arc<dyn Holder<U>>,
    projection: Projection<U, T>,
}

impl<T: ?Sized + 'static, U: ?Sized + 'static> Delegating<T, U> {
    pub(crate) fn new(delegate: Arc<dyn Holder<U>>, projection: Projection<U, T>) -> Self {
        Delegating {
            delegate,
            projection,
        }
    }
}

impl<T: ?Sized + 'static, U: ?Sized + 'static> Holder<T> for Delegating<T, U> {
    fn try_clone(&self) -> Result<Arc<dyn Holder<T>>, CopyError> {
        let delegate = self.delegate.try_clone()?;
        Ok(Arc::new(Delegating::new(delegate, self.projection)))
    }

    fn get(&self) -> &T {
        (self.projection.get)(self.delegate.get())
    }

    fn get_mut(&mut self) -> Result<&mut T, CopyError> {
        let delegate = make_unique(&mut self.delegate)?;
        Ok((self.projection.get_mut)(delegate.get_mut()?))
    }
}
