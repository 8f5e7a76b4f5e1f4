//! # Callback Sync
//!
//! A grouped, in-process callback registry for keeping loosely coupled
//! participants in step.
//!
//! Participants register a callback under a group of a [`CallbackRegistry`]. Any
//! of them can later trigger a sync, which runs the callbacks of the other live
//! participants of its group. The typical case is a set of data views sharing a
//! source: when one view saves, every sibling view refreshes, but only after the
//! save has finished, and the view that saved is not refreshed twice.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use callback_sync::{Callback, CallbackRegistry, SyncCoordinator, SyncMode};
//!
//! # futures::executor::block_on(async {
//! let registry = Arc::new(CallbackRegistry::new());
//!
//! let editor = SyncCoordinator::builder(Callback::new(|| async {
//!     // save...
//!     Ok(())
//! }))
//! .group("orders")
//! .attach(&registry);
//!
//! let list = SyncCoordinator::builder(Callback::from_fn(|| {
//!     // reload...
//!     Ok(())
//! }))
//! .group("orders")
//! .attach(&registry);
//!
//! // The editor's callback completes before the list reloads.
//! editor.sync(SyncMode::Deferred).await.unwrap();
//! # drop(list);
//! # });
//! ```
//!
//! ## Features
//!
//! - **Group isolation**: a sync never reaches participants of another group
//! - **Ordered propagation**: deferred syncs finish the trigger's own work before siblings run
//! - **Failure isolation**: one failing callback never blocks its siblings
//! - **Scoped participation**: dropping a [`SyncCoordinator`] unregisters it
//! - **Detached callbacks**: a started callback finishes even if the sync caller gives up
//! - **Tracing support**: `tracing` events in an `invoke_group` span, plus an optional
//!   [`SyncEvent`] callback per registry
//!
//! ## Main Types
//!
//! - [`CallbackRegistry`] - group → participant → callback map with snapshot-based invocation
//! - [`SyncCoordinator`] - per-participant handle with attach/detach and `sync`
//! - [`Callback`] - shared, type-erased async callback
//! - [`IdGenerator`] - pluggable default-id source
//! - [`Spawner`] - where started callbacks run

mod callback;
mod coordinator;
mod id;
mod registry;
mod spawner;
mod sync_error;
mod sync_event;

pub use callback::Callback;
pub use coordinator::{CoordinatorBuilder, SyncCoordinator, SyncMode};
pub use id::{IdGenerator, RandomIds, SequentialIds};
pub use registry::{CallbackRegistry, InvokeReport, TraceCallback, DEFAULT_GROUP};
pub use spawner::Spawner;
pub use sync_error::CallbackError;
pub use sync_event::SyncEvent;
