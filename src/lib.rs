//! # lackey
//!
//! **Lackey** is a lifecycle engine for long-lived background components.
//!
//! It drives components ("slaves") through start/stop/pause/resume with a
//! three-phase transition protocol, strict preconditions, and an observable
//! state history. A loop variant runs a worker cycle under the same rules,
//! with pause/stop coordination down to the single cycle.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!           start / stop / pause / resume / dispose
//!                           │
//!                           ▼
//! ┌────────────────────────────────────────────────────────────┐
//! │  Slave (lifecycle engine)                                  │
//! │  - control lock (serializes operations)                    │
//! │  - state cell (watch channel, observable history)          │
//! │  - Lifecycle hooks (before / commit / after per operation) │
//! │  - Bus (broadcast events)                                  │
//! └──────────┬──────────────────────────────┬──────────────────┘
//!            │ state writes / failures      │ hooks (loop variant)
//!            ▼                              ▼
//! ┌─────────────────────┐       ┌────────────────────────────┐
//! │  Bus (broadcast)    │       │  LoopDriver                │
//! └──────────┬──────────┘       │  (watch / ack / release    │
//!            ▼                  │   handshake with worker)   │
//! ┌─────────────────────┐       └──────────┬─────────────────┘
//! │  listener task      │                  ▼
//! │  SubscriberSet      │       ┌────────────────────────────┐
//! │  (per-sub queues)   │       │  Worker (spawned per run)  │
//! └─────┬─────────┬─────┘       │  checkpoint ─► cycle ─►    │
//!       ▼         ▼             │  vacation ─► checkpoint    │
//!   sub1.on    sub2.on          └──────────┬─────────────────┘
//!   _event()   _event()                    ▼
//!                                    Cycle::run(ctx)
//! ```
//!
//! ### Transition protocol
//! ```text
//! apply(op) {
//!   ├─► acquire control lock (waits out an in-flight transition)
//!   ├─► disposed?  pausing supported?  precondition?
//!   ├─► write the origin state again (observable re-announcement)
//!   ├─► run on_before_*  ── Err ─► state unchanged, error out
//!   ├─► write the transitional state
//!   ├─► run on_*         ── Err ─► write the origin back, error out
//!   ├─► write the target state
//!   └─► run on_after_*   ── Err ─► target kept, error out
//! }
//!
//! One start, as seen on the event bus:
//!   Stopped, Stopped, Starting, Running
//! ```
//!
//! | operation | legal from      | path                           |
//! |-----------|-----------------|--------------------------------|
//! | start     | Stopped         | Stopped -> Starting -> Running |
//! | stop      | Running, Paused | origin -> Stopping -> Stopped  |
//! | pause     | Running         | Running -> Pausing -> Paused   |
//! | resume    | Paused          | Paused -> Resuming -> Running  |
//!
//! Dispose is legal from any state: it stops a running or paused slave first,
//! then permanently retires the instance (idempotent, reads stay usable).
//!
//! ## Features
//! | Area            | Description                                                          | Key types / traits                                             |
//! |-----------------|----------------------------------------------------------------------|----------------------------------------------------------------|
//! | **Engine**      | Drive components through their lifecycle with strict preconditions.  | [`Slave`], [`SlaveBuilder`], [`StateWait`]                     |
//! | **Hooks**       | Before/commit/after extension points for every operation.            | [`Lifecycle`]                                                  |
//! | **Loop**        | Repeat a cycle between control checkpoints; kick, retry on failure.  | [`LoopSlave`], [`Cycle`], [`CycleFn`], [`Vacation`], [`LoopConfig`] |
//! | **Events**      | Observe every state write and failure on a broadcast bus.            | [`Event`], [`EventKind`], [`Subscribe`], [`SubscriberSet`]     |
//! | **Diagnostics** | Render lifecycle events into leveled records.                        | [`DiagnosticSink`], [`SinkLevel`], [`SinkWriter`]              |
//! | **Time**        | Injectable time source: real timers, or manually advanced in tests.  | [`Clock`], [`SystemClock`], [`ManualClock`]                    |
//! | **Errors**      | Typed errors for control operations and work execution.              | [`SlaveError`], [`WorkError`]                                  |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] sink _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use lackey::{Lifecycle, Slave, SlaveState, WorkError};
//!
//! struct Cache;
//!
//! #[async_trait]
//! impl Lifecycle for Cache {
//!     async fn on_starting(&self) -> Result<(), WorkError> {
//!         // open files, warm buffers...
//!         Ok(())
//!     }
//!
//!     async fn on_stopping(&self) -> Result<(), WorkError> {
//!         // flush and close...
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), lackey::SlaveError> {
//!     let slave = Slave::builder("cache")
//!         .lifecycle(Arc::new(Cache))
//!         .build();
//!
//!     let mut events = slave.events();
//!
//!     slave.start().await?;
//!     assert_eq!(slave.state(), SlaveState::Running);
//!
//!     slave.pause().await?;
//!     slave.resume().await?;
//!     slave.stop().await?;
//!     slave.dispose().await?;
//!
//!     while let Ok(ev) = events.try_recv() {
//!         println!("[{}] {:?}", ev.seq, ev.kind);
//!     }
//!     Ok(())
//! }
//! ```
mod clock;
mod error;
mod events;
mod looper;
mod slave;
mod state;
mod subscribers;

// ---- Public re-exports ----

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{SlaveError, WorkError};
pub use events::{Event, EventKind};
pub use looper::{Cycle, CycleFn, CycleRef, LoopConfig, LoopSlave, LoopSlaveBuilder, Vacation};
pub use slave::{Lifecycle, Slave, SlaveBuilder, StateWait};
pub use state::{Operation, Phase, SlaveState};
pub use subscribers::{DiagnosticSink, SinkLevel, SinkWriter, Subscribe, SubscriberSet};

// Optional: expose a simple built-in stdout sink (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
