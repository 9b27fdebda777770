//! Plain slave demo: lifecycle hooks around an in-memory store, with a
//! subscriber auditing every state write.
//!
//! Run with: `cargo run --example hooks`

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use lackey::{Event, EventKind, Lifecycle, Slave, Subscribe, WorkError};

/// Pretends to manage a store that needs orderly setup and teardown.
struct Store;

#[async_trait]
impl Lifecycle for Store {
    async fn on_starting(&self) -> Result<(), WorkError> {
        println!("store: opening");
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(())
    }

    async fn on_pausing(&self) -> Result<(), WorkError> {
        println!("store: draining writers");
        Ok(())
    }

    async fn on_resuming(&self) -> Result<(), WorkError> {
        println!("store: accepting writers");
        Ok(())
    }

    async fn on_stopping(&self) -> Result<(), WorkError> {
        println!("store: flushing");
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(())
    }
}

/// Logs the observable state history, duplicates included.
struct Audit;

#[async_trait]
impl Subscribe for Audit {
    async fn on_event(&self, event: &Event) {
        if event.kind != EventKind::StateChanged {
            return;
        }
        let slave = event.slave.as_deref().unwrap_or("unnamed");
        match (event.from, event.state) {
            (Some(from), Some(state)) => println!("audit: `{slave}` {from} -> {state}"),
            _ => println!("audit: `{slave}` state write"),
        }
    }

    fn name(&self) -> &'static str {
        "audit"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let slave = Slave::builder("store")
        .lifecycle(Arc::new(Store))
        .subscriber(Arc::new(Audit))
        .build();

    // === Full sweep: start, pause, resume, stop ===
    slave.start().await?;
    slave.pause().await?;
    slave.resume().await?;
    slave.stop().await?;

    // Refused: the store is already stopped.
    if let Err(err) = slave.stop().await {
        println!("refused: {err}");
    }

    slave.dispose().await?;
    println!("disposed: {}", slave.is_disposed());

    // Give the audit queue a moment to drain before exiting.
    tokio::time::sleep(Duration::from_millis(100)).await;
    Ok(())
}
