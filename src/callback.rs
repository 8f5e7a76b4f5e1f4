//! Type-erased participant callbacks.
//!
//! A [`Callback`] is a cheaply clonable handle to a zero-argument function that
//! returns a future. Synchronous work is wrapped in an already-resolved future,
//! so the registry only ever deals with one shape.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::future::{self, BoxFuture};
use futures::{Future, FutureExt};

use crate::CallbackError;

type CallbackFn = dyn Fn() -> BoxFuture<'static, Result<(), CallbackError>> + Send + Sync;

/// Shared handle to a participant callback.
///
/// Cloning is an `Arc` clone; two clones compare equal under [`Callback::ptr_eq`].
/// A fresh call to [`Callback::new`] or [`Callback::from_fn`] always produces a
/// distinct handle, even for the same closure body.
#[derive(Clone)]
pub struct Callback {
    inner: Arc<CallbackFn>,
}

impl Callback {
    /// Wraps an async closure.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use callback_sync::Callback;
    ///
    /// let refresh = Callback::new(|| async {
    ///     // reload data...
    ///     Ok(())
    /// });
    /// # let _ = refresh;
    /// ```
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CallbackError>> + Send + 'static,
    {
        Callback {
            inner: Arc::new(move || f().boxed()),
        }
    }

    /// Wraps a synchronous closure. The returned future is already resolved.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() -> Result<(), CallbackError> + Send + Sync + 'static,
    {
        Callback {
            inner: Arc::new(move || future::ready(f()).boxed()),
        }
    }

    /// Returns `true` if both handles point at the same callback.
    pub fn ptr_eq(&self, other: &Callback) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Invokes the callback and returns its completion future.
    ///
    /// Panics raised either while creating the future or while polling it are
    /// caught and reported as [`CallbackError::Panicked`].
    pub fn call(&self) -> BoxFuture<'static, Result<(), CallbackError>> {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.inner)())) {
            Ok(fut) => AssertUnwindSafe(fut)
                .catch_unwind()
                .map(|outcome| outcome.unwrap_or_else(|p| Err(CallbackError::from_panic(p))))
                .boxed(),
            Err(payload) => future::ready(Err(CallbackError::from_panic(payload))).boxed(),
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("ptr", &Arc::as_ptr(&self.inner).cast::<()>())
            .finish()
    }
}
