//! # Builder wiring for [`Slave`].
//!
//! Collects hooks, diagnostics and plumbing overrides, then assembles the
//! engine. The builder is where the event pipeline gets connected: when a
//! sink or subscribers are attached, `build()` spawns a listener task that
//! drains the slave's bus into a [`SubscriberSet`].

use std::sync::{Arc, RwLock};

use tokio::sync::broadcast::error::RecvError;

use crate::clock::{Clock, SystemClock};
use crate::events::Bus;
use crate::subscribers::{DiagnosticSink, SinkWriter, Subscribe, SubscriberSet};

use super::engine::{NameCell, Slave};
use super::hooks::{Inert, Lifecycle};

pub(crate) const DEFAULT_BUS_CAPACITY: usize = 1024;

/// Configures and assembles a [`Slave`].
///
/// ```rust
/// use lackey::{Slave, SlaveState};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let slave = Slave::builder("indexer").pausable(false).build();
///     assert_eq!(slave.state(), SlaveState::Stopped);
///     assert!(!slave.is_pausing_supported());
/// }
/// ```
pub struct SlaveBuilder {
    name: String,
    pausable: bool,
    hooks: Option<Arc<dyn Lifecycle>>,
    sink: Option<Arc<dyn DiagnosticSink>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    clock: Option<Arc<dyn Clock>>,
    bus_capacity: usize,
    bus: Option<Bus>,
    name_cell: Option<NameCell>,
}

impl SlaveBuilder {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pausable: true,
            hooks: None,
            sink: None,
            subscribers: Vec::new(),
            clock: None,
            bus_capacity: DEFAULT_BUS_CAPACITY,
            bus: None,
            name_cell: None,
        }
    }

    /// Whether pause/resume are supported. Defaults to `true`.
    #[must_use]
    pub fn pausable(mut self, pausable: bool) -> Self {
        self.pausable = pausable;
        self
    }

    /// Lifecycle hooks to run on every transition. Defaults to no-ops.
    #[must_use]
    pub fn lifecycle(mut self, hooks: Arc<dyn Lifecycle>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Diagnostic sink; wired as a [`SinkWriter`] subscriber.
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

    /// Time source for waits and delays. Defaults to [`SystemClock`].
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

    /// Reuses an existing bus instead of creating one. The loop variant shares
    /// its bus between the engine and the worker this way.
    pub(crate) fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Reuses an existing name cell, keeping the label live across holders.
    pub(crate) fn with_name_cell(mut self, cell: NameCell) -> Self {
        self.name_cell = Some(cell);
        self
    }

    /// Assembles the slave in the `Stopped` state.
    ///
    /// Spawns the subscriber listener when a sink or subscribers are attached,
    /// so in that case it must run inside a Tokio runtime.
    #[must_use]
    pub fn build(self) -> Slave {
        let name_cell = self
            .name_cell
            .unwrap_or_else(|| Arc::new(RwLock::new(Some(self.name))));
        let bus = self.bus.unwrap_or_else(|| Bus::new(self.bus_capacity));
        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let hooks: Arc<dyn Lifecycle> = self.hooks.unwrap_or_else(|| Arc::new(Inert));

        let mut subs = self.subscribers;
        if let Some(sink) = self.sink {
            subs.push(Arc::new(SinkWriter::new(sink)));
        }
        if !subs.is_empty() {
            spawn_listener(&bus, SubscriberSet::new(subs));
        }

        Slave::from_parts(name_cell, self.pausable, hooks, bus, clock)
    }
}

/// Drains the bus into the set until every bus sender is gone, then shuts the
/// workers down. Lagged receivers skip ahead rather than stalling the slave.
fn spawn_listener(bus: &Bus, set: SubscriberSet) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => set.emit(&event),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        set.shutdown().await;
    });
}
