//! `CopyOnWrite<T>`: a polymorphic object with value semantics.
//!
//! See the crate docs for an overview.
//!
//! Like `Rc` and `Arc`, most functionality lives in associated functions
//! taking `this` (`CopyOnWrite::mutate(&mut w)`) rather than methods, so that
//! they never shadow methods of the held `T`.
use alloc::{boxed::Box, sync::Arc};
use core::{
    borrow, cmp, fmt,
    hash::{Hash, Hasher},
    mem,
    ops::Deref,
    ptr::{self, NonNull},
};

use crate::{
    base::{AsBase, Projection},
    error::CopyError,
    holder::{make_unique, Delegating, Direct, Holder, Indirect},
    policy::{Copier, DefaultCopy, DefaultDelete, Deleter},
};

/// An owned, possibly polymorphic value.
///
/// Cloning a `CopyOnWrite<dyn Trait>` clones the full concrete object through
/// its copy policy, so nothing is sliced away. Mutable access goes through
/// [`CopyOnWrite::mutate`], which first detaches the value if it is shared
/// (see [`CopyOnWrite::share`]).
///
/// A `CopyOnWrite` may be empty; dereferencing an empty one panics.
pub struct CopyOnWrite<T: ?Sized + 'static> {
    held: Option<Held<T>>,
}

struct Held<T: ?Sized + 'static> {
    // Points at the value owned by `holder`: what `holder.get()` returns, or
    // what `holder.get_mut()` returned last.
    ptr: NonNull<T>,
    holder: Arc<dyn Holder<T>>,
}

impl<T: ?Sized + 'static> Held<T> {
    fn new(holder: Arc<dyn Holder<T>>) -> Self {
        Held {
            ptr: NonNull::from(holder.get()),
            holder,
        }
    }
}

// Safety: `ptr` only ever points into the value owned by `holder`, holders are
// `Send + Sync`, and `T` is only reachable as `&T` (shared) or through
// `mutate` (requires `&mut self`).
unsafe impl<T: ?Sized + Send + Sync + 'static> Send for CopyOnWrite<T> {}
unsafe impl<T: ?Sized + Send + Sync + 'static> Sync for CopyOnWrite<T> {}

impl<T: Clone + Send + Sync + 'static> CopyOnWrite<T> {
    /// Box `value` and hold it with the default policies.
    pub fn new(value: T) -> Self {
        CopyOnWrite::from_box(Box::new(value))
    }
}

impl<T: ?Sized + 'static> CopyOnWrite<T> {
    /// Constructs an empty `CopyOnWrite`.
    pub const fn empty() -> Self {
        CopyOnWrite { held: None }
    }

    /// Take ownership of a boxed `U`, copying it through `Clone` and dropping
    /// it normally.
    ///
    /// The box is adopted as-is; `U` is the exact type that will be copied.
    pub fn from_box<U>(value: Box<U>) -> Self
    where
        U: AsBase<T> + Clone + Send + Sync + 'static,
    {
        CopyOnWrite::from_box_with(value, DefaultCopy, DefaultDelete)
    }

    /// Take ownership of a boxed `U` with custom copy and delete policies.
    ///
    /// `copier` runs every time the value has to be duplicated, `deleter`
    /// once for every object when its last owner goes away.
    pub fn from_box_with<U, C, D>(value: Box<U>, copier: C, deleter: D) -> Self
    where
        U: AsBase<T> + Send + Sync + 'static,
        C: Copier<U> + Clone,
        D: Deleter<U> + Clone,
    {
        CopyOnWrite::from_holder(Arc::new(Indirect::new(value, copier, deleter)))
    }

    /// Like [`from_box`](CopyOnWrite::from_box), but `None` produces an empty
    /// `CopyOnWrite`.
    pub fn from_option_box<U>(value: Option<Box<U>>) -> Self
    where
        U: AsBase<T> + Clone + Send + Sync + 'static,
    {
        CopyOnWrite::from_option_box_with(value, DefaultCopy, DefaultDelete)
    }

    /// Like [`from_box_with`](CopyOnWrite::from_box_with), but `None`
    /// produces an empty `CopyOnWrite`.
    pub fn from_option_box_with<U, C, D>(value: Option<Box<U>>, copier: C, deleter: D) -> Self
    where
        U: AsBase<T> + Send + Sync + 'static,
        C: Copier<U> + Clone,
        D: Deleter<U> + Clone,
    {
        match value {
            Some(value) => CopyOnWrite::from_box_with(value, copier, deleter),
            None => CopyOnWrite::empty(),
        }
    }

    /// Box `value` and hold it as a `T` with the default policies.
    pub fn from_value<U>(value: U) -> Self
    where
        U: AsBase<T> + Clone + Send + Sync + 'static,
    {
        CopyOnWrite::from_box(Box::new(value))
    }

    /// Hold `value` inline in the shared holder allocation.
    ///
    /// This saves the separate box that [`from_value`](CopyOnWrite::from_value)
    /// makes; copies go through `Clone`.
    ///
    /// ```
    /// use copy_on_write::CopyOnWrite;
    ///
    /// let w: CopyOnWrite<[u8]> = CopyOnWrite::make(vec![1u8, 2, 3]);
    /// assert_eq!(&*w, &[1, 2, 3]);
    /// ```
    pub fn make<U>(value: U) -> Self
    where
        U: AsBase<T> + Clone + Send + Sync + 'static,
    {
        CopyOnWrite::from_holder(Arc::new(Direct::new(value)))
    }

    fn from_holder(holder: Arc<dyn Holder<T>>) -> Self {
        CopyOnWrite {
            held: Some(Held::new(holder)),
        }
    }

    /// Convert `CopyOnWrite<U>` to `CopyOnWrite<T>`, as long as `U` can be
    /// viewed as a `T`.
    ///
    /// Nothing is copied: the concrete object and its copy policy carry over
    /// unchanged, only the view changes. This should be spelled `from()`, but
    /// that conflicts with the blanket impl converting T->T.
    pub fn cast<U>(this: CopyOnWrite<U>) -> Self
    where
        U: ?Sized + AsBase<T> + 'static,
    {
        CopyOnWrite::projected(this, Projection::as_base())
    }

    /// Return a `CopyOnWrite<T>` for any `T` contained within `U`, e.g. a
    /// field, or a `&dyn` view of the object.
    ///
    /// Both projections must select the same part of the object.
    ///
    /// ```
    /// use copy_on_write::CopyOnWrite;
    ///
    /// let pair = CopyOnWrite::new((1, String::from("one")));
    /// let mut name: CopyOnWrite<String> = CopyOnWrite::project(pair, |p| &p.1, |p| &mut p.1);
    /// CopyOnWrite::mutate(&mut name).unwrap().push('!');
    /// assert_eq!(*name, "one!");
    /// ```
    pub fn project<U>(this: CopyOnWrite<U>, get: fn(&U) -> &T, get_mut: fn(&mut U) -> &mut T) -> Self
    where
        U: ?Sized + 'static,
    {
        CopyOnWrite::projected(this, Projection::new(get, get_mut))
    }

    fn projected<U: ?Sized + 'static>(this: CopyOnWrite<U>, projection: Projection<U, T>) -> Self {
        match this.held {
            Some(held) => CopyOnWrite::from_holder(Arc::new(Delegating::new(held.holder, projection))),
            None => CopyOnWrite::empty(),
        }
    }

    /// Copy the held value into a new, independent `CopyOnWrite`.
    ///
    /// On failure nothing is allocated and `this` is unchanged.
    pub fn try_clone(this: &Self) -> Result<Self, CopyError> {
        match &this.held {
            Some(held) => Ok(CopyOnWrite::from_holder(held.holder.try_clone()?)),
            None => Ok(CopyOnWrite::empty()),
        }
    }

    /// Make `this` hold a copy of `source`'s value.
    ///
    /// The copy is made before `this` is touched, so if copying fails both
    /// sides are left exactly as they were. If `this` already shares its
    /// holder with `source`, nothing happens.
    pub fn try_assign(this: &mut Self, source: &Self) -> Result<(), CopyError> {
        if CopyOnWrite::shares_holder(this, source) {
            return Ok(());
        }
        *this = CopyOnWrite::try_clone(source)?;
        Ok(())
    }

    /// A second `CopyOnWrite` sharing the same value, without copying it.
    ///
    /// The value is copied later, by whichever side calls
    /// [`mutate`](CopyOnWrite::mutate) first.
    pub fn share(this: &Self) -> Self {
        CopyOnWrite {
            held: this.held.as_ref().map(|held| Held {
                ptr: held.ptr,
                holder: Arc::clone(&held.holder),
            }),
        }
    }

    /// Mutable access to the held value.
    ///
    /// If the value is shared with another `CopyOnWrite`, it is copied first so
    /// the other side never observes the change. Otherwise no copy is made.
    /// If that copy fails, `this` is unchanged.
    ///
    /// # Panics
    ///
    /// If `this` is empty.
    pub fn mutate(this: &mut Self) -> Result<&mut T, CopyError> {
        let held = match this.held.as_mut() {
            Some(held) => held,
            None => panic!("mutate called on an empty CopyOnWrite"),
        };
        let value = NonNull::from(make_unique(&mut held.holder)?.get_mut()?);
        held.ptr = value;
        // Safety: `value` was just derived from exclusive access to the holder,
        // which stays alive and unshared while `this` is mutably borrowed.
        Ok(unsafe { &mut *value.as_ptr() })
    }

    /// Returns a reference to the held value, or `None` if empty.
    #[inline]
    pub fn get(this: &Self) -> Option<&T> {
        // Safety: `ptr` points into the value kept alive by `holder`.
        this.held.as_ref().map(|held| unsafe { held.ptr.as_ref() })
    }

    #[inline]
    pub fn is_empty(this: &Self) -> bool {
        this.held.is_none()
    }

    #[inline]
    pub fn is_some(this: &Self) -> bool {
        this.held.is_some()
    }

    /// Move the value out, leaving `this` empty. The value is not copied and
    /// stays at the same address.
    pub fn take(this: &mut Self) -> Self {
        mem::take(this)
    }

    /// Exchange two values without copying either.
    pub fn swap(a: &mut Self, b: &mut Self) {
        mem::swap(a, b)
    }

    /// Number of `CopyOnWrite`s sharing this holder, including `this`. Zero if
    /// empty.
    pub fn holder_count(this: &Self) -> usize {
        this.held
            .as_ref()
            .map_or(0, |held| Arc::strong_count(&held.holder))
    }

    /// Returns true if no other `CopyOnWrite` shares this holder.
    ///
    /// Only the outermost holder is counted. A view made with
    /// `CopyOnWrite::from(&w)` has a holder of its own and reports unique,
    /// but its first [`mutate`](CopyOnWrite::mutate) still copies the value
    /// it shares with `w`.
    pub fn is_unique(this: &Self) -> bool {
        CopyOnWrite::holder_count(this) == 1
    }

    /// Returns true if both point at the same object (or both are empty).
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        match (CopyOnWrite::get(this), CopyOnWrite::get(other)) {
            (Some(a), Some(b)) => ptr::addr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Returns true if both share the same holder, i.e. one was produced from
    /// the other by [`share`](CopyOnWrite::share) and neither has detached
    /// since.
    pub fn shares_holder(this: &Self, other: &Self) -> bool {
        match (&this.held, &other.held) {
            (Some(a), Some(b)) => Arc::ptr_eq(&a.holder, &b.holder),
            _ => false,
        }
    }
}

/// Hold `value` inline; shorthand for [`CopyOnWrite::make`].
pub fn make<T: Clone + Send + Sync + 'static>(value: T) -> CopyOnWrite<T> {
    CopyOnWrite::make(value)
}

/// Shares `source`'s value under a different view, without copying.
impl<T, U> From<&CopyOnWrite<U>> for CopyOnWrite<T>
where
    T: ?Sized + 'static,
    U: ?Sized + AsBase<T> + 'static,
{
    fn from(source: &CopyOnWrite<U>) -> Self {
        CopyOnWrite::cast(CopyOnWrite::share(source))
    }
}

/// Copies the held value.
///
/// # Panics
///
/// If the copy policy fails. Use [`CopyOnWrite::try_clone`] and
/// [`CopyOnWrite::try_assign`] to handle that case.
impl<T: ?Sized + 'static> Clone for CopyOnWrite<T> {
    fn clone(&self) -> Self {
        match CopyOnWrite::try_clone(self) {
            Ok(copy) => copy,
            Err(err) => panic!("failed to copy held value: {}", err),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        if let Err(err) = CopyOnWrite::try_assign(self, source) {
            panic!("failed to copy held value: {}", err)
        }
    }
}

impl<T: ?Sized + 'static> Default for CopyOnWrite<T> {
    fn default() -> Self {
        CopyOnWrite::empty()
    }
}

impl<T: ?Sized + 'static> Deref for CopyOnWrite<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match CopyOnWrite::get(self) {
            Some(value) => value,
            None => panic!("dereferenced an empty CopyOnWrite"),
        }
    }
}

impl<T: ?Sized + 'static> AsRef<T> for CopyOnWrite<T> {
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T: ?Sized + 'static> borrow::Borrow<T> for CopyOnWrite<T> {
    fn borrow(&self) -> &T {
        self
    }
}

impl<T: ?Sized + PartialEq + 'static> PartialEq for CopyOnWrite<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        CopyOnWrite::get(self) == CopyOnWrite::get(other)
    }
}

impl<T: ?Sized + Eq + 'static> Eq for CopyOnWrite<T> {}

impl<T: ?Sized + PartialOrd + 'static> PartialOrd for CopyOnWrite<T> {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        CopyOnWrite::get(self).partial_cmp(&CopyOnWrite::get(other))
    }
}

impl<T: ?Sized + Ord + 'static> Ord for CopyOnWrite<T> {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        CopyOnWrite::get(self).cmp(&CopyOnWrite::get(other))
    }
}

impl<T: ?Sized + Hash + 'static> Hash for CopyOnWrite<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        CopyOnWrite::get(self).hash(state)
    }
}

impl<T: ?Sized + fmt::Debug + 'static> fmt::Debug for CopyOnWrite<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match CopyOnWrite::get(self) {
            Some(value) => fmt::Debug::fmt(value, f),
            None => f.write_str("<empty>"),
        }
    }
}

impl<T: ?Sized + 'static> fmt::Pointer for CopyOnWrite<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.held {
            Some(held) => fmt::Pointer::fmt(&held.ptr, f),
            None => fmt::Pointer::fmt(&ptr::null::<u8>(), f),
        }
    }
}
