//! Errors raised by copy policies.
use alloc::{boxed::Box, string::String};
use core::{any, error::Error};

use thiserror::Error;

/// Failure to produce an independent copy of a held value.
///
/// Returned by [`CopyOnWrite::try_clone`], [`CopyOnWrite::try_assign`] and
/// [`CopyOnWrite::mutate`]. Whenever one of these is returned, both the source
/// and the destination of the failed operation are left exactly as they were.
///
/// [`CopyOnWrite::try_clone`]: crate::CopyOnWrite::try_clone
/// [`CopyOnWrite::try_assign`]: crate::CopyOnWrite::try_assign
/// [`CopyOnWrite::mutate`]: crate::CopyOnWrite::mutate
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CopyError {
    #[error("out of memory while copying a `{type_name}`")]
    OutOfMemory { type_name: &'static str },

    #[error("copying a `{type_name}` failed: {reason}")]
    Failed {
        type_name: &'static str,
        reason: String,
    },

    #[error("copy policy failed")]
    Policy(#[source] Box<dyn Error + Send + Sync>),
}

impl CopyError {
    pub fn out_of_memory<U: ?Sized>() -> Self {
        CopyError::OutOfMemory {
            type_name: any::type_name::<U>(),
        }
    }

    pub fn failed<U: ?Sized>(reason: impl Into<String>) -> Self {
        CopyError::Failed {
            type_name: any::type_name::<U>(),
            reason: reason.into(),
        }
    }

    /// Wrap an arbitrary error raised inside a user copy policy.
    pub fn policy<E>(err: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        CopyError::Policy(Box::new(err))
    }
}
