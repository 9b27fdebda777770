//! Lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the lifecycle engine and the loop
//! worker.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: the engine's transition runner (state writes, hook
//!   failures, disposal) and the loop worker (cycle failures).
//! - **Consumers**: the subscriber listener spawned at build time (fans out
//!   to the [`SubscriberSet`](crate::SubscriberSet)), plus any receiver
//!   obtained from `events()`.

mod bus;
mod event;

pub(crate) use bus::Bus;
pub use event::{Event, EventKind};
