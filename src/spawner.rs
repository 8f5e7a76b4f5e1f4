//! Detached execution of started callbacks.
//!
//! Once a callback has been started it runs to completion even if whoever
//! awaited the sync gives up on it. The registry hands every started callback
//! to a [`Spawner`] and only waits for its result over a oneshot channel.
//!
//! Without an explicit spawner the registry uses the tokio runtime it is
//! called from. Outside any runtime the callback is polled inline by the
//! caller, which then also owns its cancellation.

use std::sync::Arc;

use futures::channel::oneshot;
use futures::future::BoxFuture;
use futures::FutureExt;

use crate::CallbackError;

/// Runs a detached task to completion.
pub trait Spawner: Send + Sync {
    fn spawn(&self, task: BoxFuture<'static, ()>);
}

impl Spawner for tokio::runtime::Handle {
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        // The join handle is dropped; the task keeps running.
        let _ = tokio::runtime::Handle::spawn(self, task);
    }
}

impl<F> Spawner for F
where
    F: Fn(BoxFuture<'static, ()>) + Send + Sync,
{
    fn spawn(&self, task: BoxFuture<'static, ()>) {
        self(task)
    }
}

/// Picks the injected spawner, else the ambient tokio runtime, else none.
pub(crate) fn resolve(injected: Option<&Arc<dyn Spawner>>) -> Option<Arc<dyn Spawner>> {
    injected.cloned().or_else(|| {
        tokio::runtime::Handle::try_current()
            .ok()
            .map(|handle| Arc::new(handle) as Arc<dyn Spawner>)
    })
}

/// Starts `work` on `spawner` and returns a future for its outcome.
///
/// Dropping the returned future does not cancel `work`. If the spawner drops
/// the task before it finishes, the outcome is [`CallbackError::Abandoned`].
pub(crate) fn detach(
    spawner: Option<Arc<dyn Spawner>>,
    work: BoxFuture<'static, Result<(), CallbackError>>,
) -> BoxFuture<'static, Result<(), CallbackError>> {
    let Some(spawner) = spawner else {
        return work;
    };

    let (tx, rx) = oneshot::channel();
    spawner.spawn(
        async move {
            let outcome = work.await;
            if tx.send(outcome).is_err() {
                tracing::debug!("callback finished after its sync caller went away");
            }
        }
        .boxed(),
    );
    rx.map(|received| received.unwrap_or(Err(CallbackError::Abandoned)))
        .boxed()
}
