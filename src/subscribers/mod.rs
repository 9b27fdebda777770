//! # Event subscribers and the diagnostic sink boundary.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`]
//! fan-out, and the [`DiagnosticSink`] adapter used to bridge lifecycle
//! events into an external logger.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   engine / worker ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                                   │
//!                                                    ┌──────────────┼──────────────┐
//!                                                    ▼              ▼              ▼
//!                                               SinkWriter      custom sub     custom sub
//!                                                    │
//!                                                    ▼
//!                                          DiagnosticSink::write(level, message)
//! ```
//!
//! ## Subscriber types
//! - **Passive subscribers** observe and react to events (logging, metrics,
//!   alerts).
//! - **SinkWriter** renders events into leveled text for the injected sink.

mod set;
mod sink;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

pub use set::SubscriberSet;
pub use sink::{DiagnosticSink, SinkLevel, SinkWriter};
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
