use crate::CallbackError;

/// Events emitted by a [`CallbackRegistry`](crate::CallbackRegistry) during operations.
///
/// These events are passed to the tracing callback set via
/// [`CallbackRegistry::set_trace_callback`](crate::CallbackRegistry::set_trace_callback).
/// Failures of sibling callbacks during a sync are only ever reported here and
/// through `tracing`, never to the participant that triggered the sync.
///
/// # Examples
///
/// ```rust
/// use callback_sync::SyncEvent;
///
/// let event = SyncEvent::Register {
///     group: "default".to_string(),
///     id: "1".to_string(),
/// };
/// assert_eq!(event.to_string(), "register { group: default, id: 1 }");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A callback was registered (or replaced) for a participant.
    Register { group: String, id: String },

    /// A participant removal was requested.
    Remove {
        group: String,
        id: String,
        /// Whether an entry was actually present
        found: bool,
    },

    /// A group invocation pass started.
    Invoke {
        group: String,
        /// Number of callbacks in the snapshot
        invoked: usize,
        /// Number of live participants skipped by the exclusion list
        excluded: usize,
    },

    /// A callback failed during a group invocation pass.
    CallbackFailed {
        group: String,
        id: String,
        error: CallbackError,
    },
}

impl std::fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncEvent::Register { group, id } => {
                write!(f, "register {{ group: {group}, id: {id} }}")
            }
            SyncEvent::Remove { group, id, found } => write!(
                f,
                "remove {{ group: {group}, id: {id}, found: {found} }}"
            ),
            SyncEvent::Invoke {
                group,
                invoked,
                excluded,
            } => write!(
                f,
                "invoke {{ group: {group}, invoked: {invoked}, excluded: {excluded} }}"
            ),
            SyncEvent::CallbackFailed { group, id, error } => write!(
                f,
                "callback failed {{ group: {group}, id: {id}, error: {error} }}"
            ),
        }
    }
}
