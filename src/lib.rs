/*!
This crate provides [`CopyOnWrite<T>`], a wrapper that holds a polymorphic (or
otherwise indirectly stored) object but behaves like a plain value: cloning it
produces an independent object of the full concrete type, moving it transfers
ownership, and dropping it releases the object exactly once.

```rust
    use copy_on_write::{AsBase, CopyOnWrite};

    trait Counter {
        fn value(&self) -> i32;
        fn set(&mut self, v: i32);
    }

    #[derive(Clone)]
    struct Simple(i32);

    impl Counter for Simple {
        fn value(&self) -> i32 { self.0 }
        fn set(&mut self, v: i32) { self.0 = v }
    }

    impl AsBase<dyn Counter> for Simple {
        fn as_base(&self) -> &(dyn Counter + 'static) { self }
        fn as_base_mut(&mut self) -> &mut (dyn Counter + 'static) { self }
    }

    let mut a: CopyOnWrite<dyn Counter> = CopyOnWrite::from_value(Simple(7));
    let b = a.clone();

    // `b` is a full copy of the `Simple`, not just of the `dyn Counter` view
    CopyOnWrite::mutate(&mut a).unwrap().set(99);
    assert_eq!(a.value(), 99);
    assert_eq!(b.value(), 7);
```

Reads go through `Deref`. Writes go through the single entry point
[`CopyOnWrite::mutate`], so there is never a mutable alias to a value that
another `CopyOnWrite` can see.


# Holders

Underneath each `CopyOnWrite<T>` sits a reference-counted, type-erased
*holder* that knows the concrete type of the stored object and how to copy
it. There are three kinds:

* an *indirect* holder owns a separately boxed object plus a pair of copy and
  delete policies ([`CopyOnWrite::from_box_with`]);
* a *direct* holder stores the object inline, saving one allocation
  ([`CopyOnWrite::make`]);
* a *delegating* holder wraps another holder and views its value as a
  different type ([`CopyOnWrite::cast`], [`CopyOnWrite::project`]).

The `CopyOnWrite` caches a pointer to the value next to its holder, so reads
do not go through dynamic dispatch.


# Copy policies

Every object stored through a box has its own copier and deleter. They can be
closures:

```rust
    use copy_on_write::{CopyError, CopyOnWrite};
    use std::sync::{
        atomic::{AtomicUsize, Ordering::SeqCst},
        Arc,
    };

    let copies = Arc::new(AtomicUsize::new(0));
    let deletes = Arc::new(AtomicUsize::new(0));

    let w: CopyOnWrite<u64> = {
        let copies = copies.clone();
        let deletes = deletes.clone();
        CopyOnWrite::from_box_with(
            Box::new(5u64),
            move |x: &u64| -> Result<Box<u64>, CopyError> {
                copies.fetch_add(1, SeqCst);
                Ok(Box::new(*x))
            },
            move |x: Box<u64>| {
                deletes.fetch_add(1, SeqCst);
                drop(x);
            },
        )
    };
    {
        let _copy = w.clone();
        assert_eq!(copies.load(SeqCst), 1);
    }
    assert_eq!(deletes.load(SeqCst), 1);
```

Copy policies may fail. [`CopyOnWrite::try_clone`], [`CopyOnWrite::try_assign`]
and [`CopyOnWrite::mutate`] then return a [`CopyError`] and leave every
`CopyOnWrite` involved exactly as it was. `Clone` panics instead.


# Conversions

Rust has no implementation inheritance, so "this type is a kind of that
type" is spelled [`AsBase`]. A `CopyOnWrite<U>` converts to a
`CopyOnWrite<T>` whenever `U: AsBase<T>`, without copying the object and
without losing its copy policy:

```
    use copy_on_write::CopyOnWrite;

    let s = CopyOnWrite::new(String::from("text"));
    let view: CopyOnWrite<str> = CopyOnWrite::from(&s);
    assert_eq!(&*view, "text");

    // both still see the same object...
    assert_eq!(s.as_ptr(), view.as_ptr());

    // ...until one of them writes
    let mut s = s;
    CopyOnWrite::mutate(&mut s).unwrap().push('!');
    assert_eq!(&*view, "text");
```

[`CopyOnWrite::project`] does the same for any part of an object picked out by
a pair of functions.


# Sharing

`clone` always copies. [`CopyOnWrite::share`] is the explicit cheap copy: both
sides point at the same holder until one of them calls `mutate`, which copies
the value only if it is still shared. The reference counts are atomic, so
shared copies may live on different threads; mutation itself is never shared.
*/
#![no_std]
#[cfg(test)]
extern crate std;

extern crate alloc;

mod base;
mod cow;
mod error;
mod holder;
pub mod policy;

pub use self::base::AsBase;
pub use self::cow::{make, CopyOnWrite};
pub use self::error::CopyError;
pub use self::policy::{Copier, DefaultCopy, DefaultDelete, Deleter, TryClone, TryCloneCopy};
