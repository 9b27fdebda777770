//! # LoopSlave: a slave wrapped around a repeating cycle.
//!
//! Construction wires three parts together: a [`Slave`] engine, a
//! [`LoopDriver`] sitting in the engine's lifecycle seam, and the worker task
//! the driver spawns per run. The engine keeps full ownership of states,
//! preconditions and events; the driver translates transitions into worker
//! commands.
//!
//! ```text
//!   LoopSlave ── start/stop/pause/resume/dispose ──► Slave (engine)
//!       │                                              │ hooks
//!       │ kick                                         ▼
//!       └────────────────────────────────────────► LoopDriver ──► worker
//! ```
//!
//! Because the driver occupies the lifecycle seam, the loop variant does not
//! accept user hooks. Per-run behavior belongs in the [`Cycle`](crate::Cycle)
//! itself, which can watch its
//! [`CancellationToken`](tokio_util::sync::CancellationToken) for the
//! difference between a pause (token untouched) and a stop (token cancelled).

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::broadcast;

use crate::clock::{Clock, SystemClock};
use crate::error::SlaveError;
use crate::events::{Bus, Event};
use crate::slave::{DEFAULT_BUS_CAPACITY, Lifecycle, NameCell, Slave, StateWait};
use crate::state::SlaveState;
use crate::subscribers::{DiagnosticSink, Subscribe};

use super::config::LoopConfig;
use super::cycle::CycleRef;
use super::driver::LoopDriver;

/// A slave that runs a [`Cycle`](crate::Cycle) in a loop while `Running`.
///
/// The loop honors every engine rule: cycles begin only once `Running` is
/// committed, pause and stop wait for the in-flight cycle to reach a
/// checkpoint, and a stopped loop can be started again with a fresh worker.
/// Failed cycles never kill the loop; they are published as
/// [`CycleFailed`](crate::EventKind::CycleFailed) events and retried after
/// [`LoopConfig::retry_delay`].
///
/// ## Example
/// ```rust
/// use lackey::{CycleFn, LoopSlave, Vacation};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::time::Duration;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), lackey::SlaveError> {
///     let polled = Arc::new(AtomicU32::new(0));
///     let counter = Arc::clone(&polled);
///
///     let slave = LoopSlave::builder(
///         "poller",
///         CycleFn::arc(move |_ctx| {
///             let counter = Arc::clone(&counter);
///             async move {
///                 counter.fetch_add(1, Ordering::Relaxed);
///                 Ok(Vacation::Rest(Duration::from_millis(10)))
///             }
///         }),
///     )
///     .build();
///
///     slave.start().await?;
///     tokio::time::sleep(Duration::from_millis(50)).await;
///     slave.stop().await?;
///
///     assert!(polled.load(Ordering::Relaxed) >= 1);
///     slave.dispose().await?;
///     Ok(())
/// }
/// ```
pub struct LoopSlave {
    slave: Slave,
    driver: Arc<LoopDriver>,
}

impl LoopSlave {
    /// Starts building a loop slave around the given cycle.
    pub fn builder(name: impl Into<String>, cycle: CycleRef) -> LoopSlaveBuilder {
        LoopSlaveBuilder::new(name, cycle)
    }

    /// See [`Slave::start`]. Cycles begin once `Running` is committed.
    pub async fn start(&self) -> Result<(), SlaveError> {
        self.slave.start().await
    }

    /// See [`Slave::stop`]. Cancels the run scope, then waits for the
    /// in-flight cycle and joins the worker.
    pub async fn stop(&self) -> Result<(), SlaveError> {
        self.slave.stop().await
    }

    /// See [`Slave::pause`]. Waits for the in-flight cycle; its cancellation
    /// token stays untouched.
    pub async fn pause(&self) -> Result<(), SlaveError> {
        self.slave.pause().await
    }

    /// See [`Slave::resume`]. The first cycle after a resume runs
    /// immediately, with no leftover rest in front of it.
    pub async fn resume(&self) -> Result<(), SlaveError> {
        self.slave.resume().await
    }

    /// See [`Slave::dispose`]. Tears the worker down on the way.
    pub async fn dispose(&self) -> Result<(), SlaveError> {
        self.slave.dispose().await
    }

    /// Requests an immediate next cycle, cutting any vacation short.
    ///
    /// The request is buffered: a kick landing mid-cycle shortens the
    /// vacation that follows it.
    pub fn kick(&self) {
        self.driver.kick();
    }

    /// Current engine state.
    pub fn state(&self) -> SlaveState {
        self.slave.state()
    }

    /// Current name, if any.
    pub fn name(&self) -> Option<String> {
        self.slave.name()
    }

    /// Renames the slave; worker events pick the new name up immediately.
    pub fn set_name(&self, name: Option<String>) -> Result<(), SlaveError> {
        self.slave.set_name(name)
    }

    /// Whether disposal has completed.
    pub fn is_disposed(&self) -> bool {
        self.slave.is_disposed()
    }

    /// Whether pause/resume are legal for this instance.
    pub fn is_pausing_supported(&self) -> bool {
        self.slave.is_pausing_supported()
    }

    /// New receiver for the lifecycle event stream.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.slave.events()
    }

    /// See [`Slave::wait_for_state`].
    pub async fn wait_for_state(&self, timeout: Duration) -> StateWait {
        self.slave.wait_for_state(timeout).await
    }
}

/// Configures and assembles a [`LoopSlave`].
///
/// Unlike [`SlaveBuilder`](crate::SlaveBuilder), there is no `lifecycle`
/// knob: the loop driver owns that seam.
pub struct LoopSlaveBuilder {
    name: String,
    cycle: CycleRef,
    config: LoopConfig,
    pausable: bool,
    sink: Option<Arc<dyn DiagnosticSink>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    clock: Option<Arc<dyn Clock>>,
    bus_capacity: usize,
}

impl LoopSlaveBuilder {
    pub(crate) fn new(name: impl Into<String>, cycle: CycleRef) -> Self {
        Self {
            name: name.into(),
            cycle,
            config: LoopConfig::default(),
            pausable: true,
            sink: None,
            subscribers: Vec::new(),
            clock: None,
            bus_capacity: DEFAULT_BUS_CAPACITY,
        }
    }

    /// Loop tuning. Defaults to [`LoopConfig::default`].
    #[must_use]
    pub fn config(mut self, config: LoopConfig) -> Self {
        self.config = config;
        self
    }

    /// Whether pause/resume are supported. Defaults to `true`.
    #[must_use]
    pub fn pausable(mut self, pausable: bool) -> Self {
        self.pausable = pausable;
        self
    }

    /// Diagnostic sink; wired as a subscriber.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Adds an event subscriber. May be called multiple times.
    #[must_use]
    pub fn subscriber(mut self, sub: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(sub);
        self
    }

    /// Time source for vacations, retries and waits. Defaults to
    /// [`SystemClock`].
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Capacity of the broadcast event bus. Defaults to 1024, clamped to >= 1.
    #[must_use]
    pub fn bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = capacity;
        self
    }

    /// Assembles the loop slave in the `Stopped` state. No worker exists
    /// until the first start.
    #[must_use]
    pub fn build(self) -> LoopSlave {
        let name_cell: NameCell = Arc::new(RwLock::new(Some(self.name.clone())));
        let bus = Bus::new(self.bus_capacity);
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let driver = Arc::new(LoopDriver::new(
            self.cycle,
            self.config,
            bus.clone(),
            Arc::clone(&clock),
            Arc::clone(&name_cell),
        ));

        let mut builder = Slave::builder(self.name)
            .pausable(self.pausable)
            .lifecycle(Arc::clone(&driver) as Arc<dyn Lifecycle>)
            .clock(clock)
            .with_bus(bus)
            .with_name_cell(name_cell);
        if let Some(sink) = self.sink {
            builder = builder.sink(sink);
        }
        for sub in self.subscribers {
            builder = builder.subscriber(sub);
        }

        LoopSlave {
            slave: builder.build(),
            driver,
        }
    }
}
