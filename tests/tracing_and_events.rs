//! Integration tests for tracing and event monitoring.
//!
//! The trace callback is the side channel through which sibling failures are
//! reported, since they never reach the participant that triggered a sync.

use callback_sync::{
    Callback, CallbackError, CallbackRegistry, SyncCoordinator, SyncEvent, SyncMode,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, timeout};

fn collect_events(registry: &CallbackRegistry) -> Arc<Mutex<Vec<SyncEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();
    registry.set_trace_callback(move |event| {
        events_clone.lock().unwrap().push(event.clone());
    });
    events
}

#[tokio::test]
async fn test_lifecycle_is_traced() {
    let registry = Arc::new(CallbackRegistry::new());
    let events = collect_events(&registry);

    let mut one = SyncCoordinator::builder(Callback::from_fn(|| Ok(())))
        .id("1")
        .attach(&registry);
    one.sync(SyncMode::Deferred).await.unwrap();
    one.detach();

    let captured: Vec<String> = events
        .lock()
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        captured,
        vec![
            "register { group: default, id: 1 }",
            "invoke { group: default, invoked: 0, excluded: 1 }",
            "remove { group: default, id: 1, found: true }",
        ]
    );
}

#[tokio::test]
async fn test_sibling_failure_reaches_trace_callback() {
    let registry = Arc::new(CallbackRegistry::new());
    let one = SyncCoordinator::builder(Callback::from_fn(|| Ok(())))
        .id("1")
        .attach(&registry);
    let _two = SyncCoordinator::builder(Callback::from_fn(|| Err("stale cache".into())))
        .id("2")
        .attach(&registry);
    let events = collect_events(&registry);

    assert_eq!(one.sync(SyncMode::Deferred).await, Ok(()));

    let captured = events.lock().unwrap();
    assert!(captured.contains(&SyncEvent::CallbackFailed {
        group: "default".to_string(),
        id: "2".to_string(),
        error: CallbackError::failed("stale cache"),
    }));
}

#[tokio::test]
async fn test_own_failure_in_deferred_mode_is_returned_not_traced() {
    let registry = Arc::new(CallbackRegistry::new());
    let one = SyncCoordinator::builder(Callback::from_fn(|| Err("save failed".into())))
        .id("1")
        .attach(&registry);
    let events = collect_events(&registry);

    assert_eq!(
        one.sync(SyncMode::Deferred).await,
        Err(CallbackError::failed("save failed"))
    );
    assert!(events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_clear_trace_callback() {
    let registry = Arc::new(CallbackRegistry::new());
    let events = collect_events(&registry);

    registry.register("g", "1", Callback::from_fn(|| Ok(())));
    registry.clear_trace_callback();
    registry.remove("g", "1");
    registry.invoke_group::<&str>("g", &[]).await;

    assert_eq!(events.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_trace_callback_replacement() {
    let registry = Arc::new(CallbackRegistry::new());
    let first = collect_events(&registry);

    registry.register("g", "1", Callback::from_fn(|| Ok(())));

    let second = collect_events(&registry);
    registry.register("g", "2", Callback::from_fn(|| Ok(())));

    assert_eq!(first.lock().unwrap().len(), 1);
    assert_eq!(second.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_remove_of_unknown_entry_is_traced_as_not_found() {
    let registry = Arc::new(CallbackRegistry::new());
    let events = collect_events(&registry);

    assert!(!registry.remove("ghost", "1"));

    let captured = events.lock().unwrap();
    assert_eq!(
        *captured,
        vec![SyncEvent::Remove {
            group: "ghost".to_string(),
            id: "1".to_string(),
            found: false,
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_late_sibling_failure_is_traced_after_caller_gave_up() {
    let registry = Arc::new(CallbackRegistry::new());
    let events = collect_events(&registry);

    let one = SyncCoordinator::builder(Callback::from_fn(|| Ok(())))
        .id("1")
        .attach(&registry);
    let _two = SyncCoordinator::builder(Callback::new(|| async {
        sleep(Duration::from_secs(3)).await;
        Err::<(), _>(CallbackError::failed("late"))
    }))
    .id("2")
    .attach(&registry);

    let outcome = timeout(Duration::from_secs(1), one.sync(SyncMode::Deferred)).await;
    assert!(outcome.is_err());

    sleep(Duration::from_secs(10)).await;
    let failed = events
        .lock()
        .unwrap()
        .iter()
        .any(|event| matches!(event, SyncEvent::CallbackFailed { id, .. } if id == "2"));
    assert!(failed);
}
