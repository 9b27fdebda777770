//! # Slave: the lifecycle state machine.
//!
//! - [`engine`] owns the state cell and drives the three-phase protocol.
//! - [`hooks`] declares the [`Lifecycle`] extension points.
//! - [`builder`] assembles a slave and wires its event pipeline.
//!
//! ```text
//!   Slave::builder("name") ──► SlaveBuilder ──► Slave (Stopped)
//!                                 │
//!                                 └── sink / subscribers ──► listener task
//! ```

mod builder;
mod engine;
mod hooks;

pub use builder::SlaveBuilder;
pub use engine::{Slave, StateWait};
pub use hooks::Lifecycle;

pub(crate) use builder::DEFAULT_BUS_CAPACITY;
pub(crate) use engine::{NameCell, read_label};
