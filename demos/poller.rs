//! Loop slave demo: a polling worker driven through its whole lifecycle.
//!
//! Run with: `cargo run --example poller`

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use lackey::{CycleFn, DiagnosticSink, LoopConfig, LoopSlave, SinkLevel, Vacation, WorkError};

/// Prints every lifecycle record the slave produces.
struct Stdout;

impl DiagnosticSink for Stdout {
    fn write(&self, level: SinkLevel, message: &str) {
        println!("[{level}] {message}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // === Build ===
    let fetched = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&fetched);

    let slave = LoopSlave::builder(
        "poller",
        CycleFn::arc(move |ctx| {
            let counter = Arc::clone(&counter);
            async move {
                if ctx.is_cancelled() {
                    return Err(WorkError::Canceled);
                }
                let n = counter.fetch_add(1, Ordering::Relaxed) + 1;
                println!("poll #{n}");
                Ok(Vacation::Rest(Duration::from_millis(200)))
            }
        }),
    )
    .config(LoopConfig {
        retry_delay: Duration::from_millis(500),
    })
    .sink(Arc::new(Stdout))
    .build();

    // === Drive ===
    slave.start().await?;
    tokio::time::sleep(Duration::from_millis(700)).await;

    slave.pause().await?;
    println!("-- paused at {} polls --", fetched.load(Ordering::Relaxed));
    tokio::time::sleep(Duration::from_millis(500)).await;

    slave.resume().await?;
    slave.kick();
    tokio::time::sleep(Duration::from_millis(300)).await;

    // === Shutdown ===
    slave.stop().await?;
    slave.dispose().await?;
    println!("-- done after {} polls --", fetched.load(Ordering::Relaxed));
    Ok(())
}
