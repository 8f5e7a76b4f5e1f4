//! Sibling views refreshing after an editor saves.
//!
//! Demonstrates:
//! - Attaching participants to groups of one registry
//! - Deferred sync: the editor's save finishes before the views reload
//! - Immediate sync: the whole group reloads as one batch
//! - Sibling failures reported through the trace callback, not to the trigger
//!
//! Run with: `RUST_LOG=debug cargo run --example view_refresh`

use std::sync::Arc;
use std::time::Duration;

use callback_sync::{
    Callback, CallbackError, CallbackRegistry, SyncCoordinator, SyncEvent, SyncMode,
};
use tracing_subscriber::EnvFilter;

fn view(name: &'static str) -> Callback {
    Callback::new(move || async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        println!("   {name}: reloaded");
        Ok(())
    })
}

#[tokio::main]
async fn main() -> Result<(), CallbackError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== callback-sync: View Refresh ===\n");

    let registry = Arc::new(CallbackRegistry::new());
    registry.set_trace_callback(|event| {
        if let SyncEvent::CallbackFailed { .. } = event {
            println!("   [trace] {event}");
        }
    });

    // -------------------------------------------------------------------------
    // 1. Attach participants
    // -------------------------------------------------------------------------
    println!("1. Attaching participants...");

    let editor = SyncCoordinator::builder(Callback::new(|| async {
        println!("   editor: saving");
        tokio::time::sleep(Duration::from_millis(200)).await;
        println!("   editor: saved");
        Ok(())
    }))
    .id("editor")
    .group("orders")
    .attach(&registry);

    let _table = SyncCoordinator::builder(view("table"))
        .id("table")
        .group("orders")
        .attach(&registry);
    let _chart = SyncCoordinator::builder(view("chart"))
        .id("chart")
        .group("orders")
        .attach(&registry);
    let _inbox = SyncCoordinator::builder(view("inbox"))
        .id("inbox")
        .group("messages")
        .attach(&registry);

    println!("   {registry:?}");

    // -------------------------------------------------------------------------
    // 2. Deferred sync
    // -------------------------------------------------------------------------
    println!("\n2. Deferred sync from the editor...");
    editor.sync(SyncMode::Deferred).await?;

    // -------------------------------------------------------------------------
    // 3. Immediate sync
    // -------------------------------------------------------------------------
    println!("\n3. Immediate sync from the editor...");
    editor.sync(SyncMode::Immediate).await?;

    // -------------------------------------------------------------------------
    // 4. A failing sibling
    // -------------------------------------------------------------------------
    println!("\n4. Sync with a failing sibling...");
    let _broken = SyncCoordinator::builder(Callback::from_fn(|| Err("backend offline".into())))
        .id("broken")
        .group("orders")
        .attach(&registry);
    editor.sync(SyncMode::Deferred).await?;
    println!("   editor sync still succeeded");

    println!("\n=== Done ===");
    Ok(())
}
