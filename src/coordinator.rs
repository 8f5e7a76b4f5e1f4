//! Per-participant façade over a [`CallbackRegistry`].
//!
//! A [`SyncCoordinator`] binds one participant (id + callback) to one group of
//! one registry for its whole lifetime. The owner attaches it when the
//! participant becomes active and detaches it when it goes away; dropping the
//! coordinator detaches as well, so a participant can never outlive its owner
//! inside the registry.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use callback_sync::{Callback, CallbackRegistry, SyncCoordinator, SyncMode};
//!
//! # futures::executor::block_on(async {
//! let registry = Arc::new(CallbackRegistry::new());
//!
//! let table = SyncCoordinator::builder(Callback::from_fn(|| Ok(())))
//!     .id("table")
//!     .attach(&registry);
//! let chart = SyncCoordinator::builder(Callback::from_fn(|| Ok(())))
//!     .id("chart")
//!     .attach(&registry);
//!
//! // Runs the table's own callback, then refreshes the chart.
//! table.sync(SyncMode::Deferred).await.unwrap();
//! # drop(chart);
//! # });
//! ```

use std::sync::{Arc, Weak};

use crate::id::{IdGenerator, SequentialIds};
use crate::{Callback, CallbackError, CallbackRegistry, DEFAULT_GROUP};

/// How [`SyncCoordinator::sync`] runs the group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SyncMode {
    /// Invoke every live participant in the group, the caller included, as one batch.
    Immediate,
    /// Await the caller's own callback first, then invoke everyone else in the group.
    #[default]
    Deferred,
}

/// Builder for [`SyncCoordinator`].
pub struct CoordinatorBuilder {
    callback: Callback,
    id: Option<String>,
    group: Option<String>,
    ids: Option<Arc<dyn IdGenerator>>,
}

impl CoordinatorBuilder {
    /// Participant id. Generated when omitted.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Group name. [`DEFAULT_GROUP`] when omitted.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Generator used when no explicit id is given. Defaults to
    /// [`SequentialIds::global`].
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    /// Builds an unregistered coordinator.
    pub fn build(self, registry: &Arc<CallbackRegistry>) -> SyncCoordinator {
        let id = match (self.id, self.ids) {
            (Some(id), _) => id,
            (None, Some(ids)) => ids.next_id(),
            (None, None) => SequentialIds::global().next_id(),
        };

        SyncCoordinator {
            registry: Arc::downgrade(registry),
            group: self.group.unwrap_or_else(|| DEFAULT_GROUP.to_string()),
            id,
            callback: self.callback,
            attached: false,
        }
    }

    /// Builds the coordinator and registers it right away.
    pub fn attach(self, registry: &Arc<CallbackRegistry>) -> SyncCoordinator {
        let mut coordinator = self.build(registry);
        coordinator.attach();
        coordinator
    }
}

/// One participant's handle on a registry group.
///
/// The coordinator holds only a weak reference to the registry. Once the
/// registry is dropped every operation becomes a no-op.
#[derive(Debug)]
pub struct SyncCoordinator {
    registry: Weak<CallbackRegistry>,
    group: String,
    id: String,
    callback: Callback,
    attached: bool,
}

impl SyncCoordinator {
    pub fn builder(callback: Callback) -> CoordinatorBuilder {
        CoordinatorBuilder {
            callback,
            id: None,
            group: None,
            ids: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn callback(&self) -> &Callback {
        &self.callback
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Registers the participant's current callback.
    ///
    /// Attaching an attached coordinator re-registers the same callback, which
    /// leaves the registry unchanged.
    pub fn attach(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            tracing::debug!(group = %self.group, id = %self.id, "attach skipped, registry dropped");
            return;
        };
        registry.register(&self.group, &self.id, self.callback.clone());
        self.attached = true;
    }

    /// Unregisters the participant. Calling it again, or on a coordinator that
    /// was never attached, does nothing.
    pub fn detach(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.group, &self.id);
        }
    }

    /// Alias of [`SyncCoordinator::detach`].
    pub fn remove_self(&mut self) {
        self.detach();
    }

    /// Replaces the participant's callback.
    ///
    /// When attached, the new callback is registered immediately under the same
    /// id so a stale callback is never invoked. Passing the handle that is
    /// already bound does nothing.
    pub fn set_callback(&mut self, callback: Callback) {
        if self.callback.ptr_eq(&callback) {
            return;
        }
        self.callback = callback;
        if self.attached {
            self.attach();
        }
    }

    /// Triggers a group sync.
    ///
    /// In [`SyncMode::Deferred`] the participant's own callback is awaited first;
    /// if it fails the error is returned and no sibling is invoked. Otherwise
    /// every other live participant of the group is invoked and awaited.
    ///
    /// In [`SyncMode::Immediate`] the whole group, this participant included, is
    /// invoked as one batch and only this participant's own failure is returned.
    ///
    /// Sibling failures are never returned; they are logged and reported to the
    /// registry's trace callback. Syncing a detached coordinator does nothing.
    ///
    /// Callbacks run detached on the registry's spawner. Dropping this future,
    /// for example on a caller-side timeout, stops waiting but lets every
    /// callback that already started finish. In deferred mode siblings are only
    /// started once the awaited own callback succeeds, so giving up during that
    /// first step means the siblings are not invoked.
    pub async fn sync(&self, mode: SyncMode) -> Result<(), CallbackError> {
        if !self.attached {
            tracing::debug!(group = %self.group, id = %self.id, "sync skipped, not attached");
            return Ok(());
        }
        let Some(registry) = self.registry.upgrade() else {
            tracing::debug!(group = %self.group, id = %self.id, "sync skipped, registry dropped");
            return Ok(());
        };

        match mode {
            SyncMode::Immediate => {
                let report = registry.invoke_group::<&str>(&self.group, &[]).await;
                match report.failure_of(&self.id) {
                    Some(error) => Err(error.clone()),
                    None => Ok(()),
                }
            }
            SyncMode::Deferred => {
                registry.start(&self.callback).await?;
                registry
                    .invoke_group(&self.group, &[self.id.as_str()])
                    .await;
                Ok(())
            }
        }
    }

    /// Same as `sync(SyncMode::default())`.
    pub async fn sync_default(&self) -> Result<(), CallbackError> {
        self.sync(SyncMode::default()).await
    }
}

impl Drop for SyncCoordinator {
    fn drop(&mut self) {
        self.detach();
    }
}
