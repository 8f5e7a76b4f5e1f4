//! Group-keyed callback registry.
//!
//! The registry maps a group name to the callbacks of the participants that are
//! currently live in that group. It knows nothing about who calls it: self
//! exclusion is an explicit argument of [`CallbackRegistry::invoke_group`].
//!
//! # Examples
//!
//! ```
//! use callback_sync::{Callback, CallbackRegistry, DEFAULT_GROUP};
//!
//! # futures::executor::block_on(async {
//! let registry = CallbackRegistry::new();
//! registry.register(DEFAULT_GROUP, "1", Callback::from_fn(|| Ok(())));
//! registry.register(DEFAULT_GROUP, "2", Callback::from_fn(|| Ok(())));
//!
//! let report = registry.invoke_group(DEFAULT_GROUP, &["1"]).await;
//! assert_eq!(report.invoked, vec!["2".to_string()]);
//! # });
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use tracing::Instrument;

use crate::spawner::{self, Spawner};
use crate::{Callback, CallbackError, SyncEvent};

/// Name of the group used when none is specified.
pub const DEFAULT_GROUP: &str = "default";

/// Type alias for the user-supplied tracing callback.
///
/// The callback receives a reference to a [`SyncEvent`] every time the registry is
/// interacted with. It is never invoked while the group map is locked, so it may
/// call back into the registry.
pub type TraceCallback = dyn Fn(&SyncEvent) + Send + Sync + 'static;

type Groups = HashMap<String, HashMap<String, Callback>>;

/// Outcome of one [`CallbackRegistry::invoke_group`] pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvokeReport {
    /// Ids whose callbacks were started, sorted
    pub invoked: Vec<String>,
    /// Callbacks that failed, with their errors
    pub failed: Vec<(String, CallbackError)>,
}

impl InvokeReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// The failure recorded for `id`, if its callback ran and failed.
    pub fn failure_of(&self, id: &str) -> Option<&CallbackError> {
        self.failed
            .iter()
            .find(|(failed_id, _)| failed_id == id)
            .map(|(_, err)| err)
    }
}

/// An isolated synchronization domain.
///
/// Create one per domain and share it behind an `Arc`; coordinators keep only a
/// weak reference to it. All operations take `&self` and are safe to use from
/// multiple threads.
///
/// Started callbacks are detached onto a [`Spawner`] (the current tokio runtime
/// unless one is injected with [`CallbackRegistry::with_spawner`]), so they run
/// to completion even when the future awaiting the sync is dropped.
#[derive(Default)]
pub struct CallbackRegistry {
    groups: Mutex<Groups>,
    trace: Mutex<Option<Arc<TraceCallback>>>,
    spawner: Option<Arc<dyn Spawner>>,
}

impl CallbackRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry that runs started callbacks on `spawner`.
    ///
    /// # Example
    /// ```rust
    /// use callback_sync::CallbackRegistry;
    /// use futures::future::BoxFuture;
    ///
    /// let registry = CallbackRegistry::with_spawner(|task: BoxFuture<'static, ()>| {
    ///     std::thread::spawn(move || futures::executor::block_on(task));
    /// });
    /// # let _ = registry;
    /// ```
    pub fn with_spawner(spawner: impl Spawner + 'static) -> Self {
        CallbackRegistry {
            spawner: Some(Arc::new(spawner)),
            ..Self::default()
        }
    }

    // -------------------------------------------------------------------------------------------------
    // Tracing
    // -------------------------------------------------------------------------------------------------

    /// Sets a tracing callback that will be invoked on every registry interaction
    /// and for every callback failure during a group pass.
    ///
    /// # Example
    /// ```rust
    /// use callback_sync::CallbackRegistry;
    ///
    /// let registry = CallbackRegistry::new();
    /// registry.set_trace_callback(|event| println!("[sync-trace] {event}"));
    /// ```
    pub fn set_trace_callback(&self, callback: impl Fn(&SyncEvent) + Send + Sync + 'static) {
        let mut guard = self.trace.lock().unwrap_or_else(|p| p.into_inner());
        *guard = Some(Arc::new(callback));
    }

    /// Clears the tracing callback.
    pub fn clear_trace_callback(&self) {
        let mut guard = self.trace.lock().unwrap_or_else(|p| p.into_inner());
        *guard = None;
    }

    /// Clone out of the lock so the callback may replace itself.
    fn trace_callback(&self) -> Option<Arc<TraceCallback>> {
        self.trace.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    fn emit_event(&self, event: SyncEvent) {
        if let Some(callback) = self.trace_callback() {
            callback(&event);
        }
    }

    // -------------------------------------------------------------------------------------------------
    // Registry
    // -------------------------------------------------------------------------------------------------

    /// Every mutation completes before the guard drops, so a poisoned map is
    /// still consistent.
    fn groups(&self) -> MutexGuard<'_, Groups> {
        self.groups.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Inserts the callback for `id` within `group`, replacing any previous one.
    pub fn register(&self, group: &str, id: &str, callback: Callback) {
        let replaced = self
            .groups()
            .entry(group.to_string())
            .or_default()
            .insert(id.to_string(), callback)
            .is_some();

        tracing::debug!(group, id, replaced, "callback registered");
        self.emit_event(SyncEvent::Register {
            group: group.to_string(),
            id: id.to_string(),
        });
    }

    /// Removes the entry for `id` within `group`.
    ///
    /// Returns whether an entry was present. Removing an unknown entry is not an error.
    pub fn remove(&self, group: &str, id: &str) -> bool {
        let found = {
            let mut groups = self.groups();
            match groups.get_mut(group) {
                Some(participants) => {
                    let found = participants.remove(id).is_some();
                    if participants.is_empty() {
                        groups.remove(group);
                    }
                    found
                }
                None => false,
            }
        };

        tracing::debug!(group, id, found, "callback removed");
        self.emit_event(SyncEvent::Remove {
            group: group.to_string(),
            id: id.to_string(),
            found,
        });
        found
    }

    /// Starts `callback` detached from the caller and returns its outcome.
    ///
    /// Dropping the returned future does not cancel the callback, unless no
    /// spawner is available and it is polled inline.
    pub(crate) fn start(
        &self,
        callback: &Callback,
    ) -> BoxFuture<'static, Result<(), CallbackError>> {
        spawner::detach(spawner::resolve(self.spawner.as_ref()), callback.call())
    }

    /// Invokes every live callback in `group` whose id is not in `exclude`.
    ///
    /// The participants are snapshotted when the call is made; callbacks that
    /// register or remove participants while running affect only later passes.
    /// All callbacks are started together and awaited concurrently. A failing
    /// or panicking callback never stops its siblings; failures are logged,
    /// forwarded to the trace callback and collected in the returned report.
    /// An unknown group is treated as empty.
    ///
    /// Dropping the returned future stops waiting but does not cancel callbacks
    /// that were already started; their failures are still logged and traced.
    pub async fn invoke_group<S: AsRef<str>>(&self, group: &str, exclude: &[S]) -> InvokeReport {
        let (snapshot, excluded) = {
            let groups = self.groups();
            let mut snapshot = Vec::new();
            let mut excluded = 0;
            for (id, callback) in groups.get(group).into_iter().flatten() {
                if exclude.iter().any(|skip| skip.as_ref() == id) {
                    excluded += 1;
                } else {
                    snapshot.push((id.clone(), callback.clone()));
                }
            }
            (snapshot, excluded)
        };

        let span = tracing::debug_span!("invoke_group", group, invoked = snapshot.len());
        span.in_scope(|| tracing::debug!(excluded, "invoking group"));
        self.emit_event(SyncEvent::Invoke {
            group: group.to_string(),
            invoked: snapshot.len(),
            excluded,
        });

        let spawner = spawner::resolve(self.spawner.as_ref());
        let trace = self.trace_callback();
        let (ids, pending): (Vec<String>, Vec<_>) = snapshot
            .into_iter()
            .map(|(id, callback)| {
                let work = report_failure(group, &id, trace.clone(), callback.call())
                    .instrument(span.clone())
                    .boxed();
                (id, spawner::detach(spawner.clone(), work))
            })
            .unzip();
        let outcomes = join_all(pending).instrument(span).await;

        let mut report = InvokeReport::default();
        for (id, outcome) in ids.into_iter().zip(outcomes) {
            if let Err(error) = outcome {
                report.failed.push((id.clone(), error));
            }
            report.invoked.push(id);
        }
        report.invoked.sort();
        report.failed.sort_by(|a, b| a.0.cmp(&b.0));
        report
    }

    /// Checks whether `id` is currently live in `group`.
    pub fn contains(&self, group: &str, id: &str) -> bool {
        self.groups()
            .get(group)
            .is_some_and(|participants| participants.contains_key(id))
    }

    /// Returns the ids currently live in `group`, sorted.
    pub fn participants(&self, group: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .groups()
            .get(group)
            .map(|participants| participants.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Returns the names of groups with at least one participant, sorted.
    pub fn group_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of live participants in `group`.
    pub fn group_len(&self, group: &str) -> usize {
        self.groups().get(group).map_or(0, HashMap::len)
    }

    /// Number of live participants across all groups.
    pub fn len(&self) -> usize {
        self.groups().values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups().is_empty()
    }

    /// Drops every registration. Intended for tests.
    #[doc(hidden)]
    pub fn clear(&self) {
        self.groups().clear();
    }
}

/// Logs and traces a failed group callback where it finishes, so the report
/// survives the sync caller going away.
fn report_failure(
    group: &str,
    id: &str,
    trace: Option<Arc<TraceCallback>>,
    call: BoxFuture<'static, Result<(), CallbackError>>,
) -> BoxFuture<'static, Result<(), CallbackError>> {
    let group = group.to_string();
    let id = id.to_string();
    async move {
        let outcome = call.await;
        if let Err(error) = &outcome {
            tracing::warn!(id = %id, %error, "callback failed during group sync");
            if let Some(trace) = trace {
                trace(&SyncEvent::CallbackFailed {
                    group,
                    id,
                    error: error.clone(),
                });
            }
        }
        outcome
    }
    .boxed()
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let groups = self.groups();
        let mut map = f.debug_map();
        for (group, participants) in groups.iter() {
            let mut ids: Vec<&String> = participants.keys().collect();
            ids.sort();
            map.entry(group, &ids);
        }
        map.finish()
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
