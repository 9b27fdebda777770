//! # Looper: the loop-coordination variant.
//!
//! - [`cycle`] declares the unit of repeated work and its rest policy.
//! - [`worker`] is the spawned task that alternates cycles and vacations.
//! - [`driver`] sits in the engine's lifecycle seam and runs the handshake.
//! - [`slave`] ties it all together behind [`LoopSlave`].
//! - [`config`] holds the loop tuning knobs.
//!
//! ```text
//!   control side                worker side
//!   ────────────                ───────────
//!   LoopSlave ─► Slave ─► LoopDriver ══ watch/ack/release ══ Worker ─► Cycle
//! ```

mod config;
mod cycle;
mod driver;
mod slave;
mod worker;

pub use config::LoopConfig;
pub use cycle::{Cycle, CycleFn, CycleRef, Vacation};
pub use slave::{LoopSlave, LoopSlaveBuilder};
