//! Participant id generation.
//!
//! Coordinators built without an explicit id ask an [`IdGenerator`] for one.
//! The default is a process-wide [`SequentialIds`] counter, so ids handed out
//! by independent coordinators never collide within a process. Tests inject
//! their own generator to get deterministic ids.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

/// Source of participant ids.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Process-wide counter used when no generator is supplied.
static GLOBAL_IDS: LazyLock<Arc<SequentialIds>> = LazyLock::new(|| Arc::new(SequentialIds::new()));

/// Monotonic counter ids: `"1"`, `"2"`, ... or `"view-1"`, `"view-2"`, ... with a prefix.
#[derive(Debug, Default)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        SequentialIds {
            prefix: prefix.into(),
            next: AtomicU64::new(0),
        }
    }

    /// The shared generator coordinators fall back to.
    pub fn global() -> Arc<SequentialIds> {
        GLOBAL_IDS.clone()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}{}", self.prefix, n)
    }
}

/// Random v4 UUID ids, for participants whose ids must not be guessable
/// from creation order.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

impl<F> IdGenerator for F
where
    F: Fn() -> String + Send + Sync,
{
    fn next_id(&self) -> String {
        self()
    }
}
