//! # Lifecycle events emitted by the engine and the loop worker.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **State events**: every write to the state cell, including the redundant
//!   re-announcement the before phase performs.
//! - **Failure events**: hook failures (with the phase and the state the
//!   protocol left behind) and cycle failures (with the retry delay).
//! - **Terminal events**: disposal.
//!
//! The [`Event`] struct carries optional metadata such as the slave name, the
//! operation and phase, the states involved, and a human-readable reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use lackey::{Event, EventKind, Operation, Phase, SlaveState};
//!
//! let ev = Event::new(EventKind::HookFailed)
//!     .with_slave("poller")
//!     .with_op(Operation::Stop)
//!     .with_phase(Phase::Commit)
//!     .with_state(SlaveState::Running)
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::HookFailed);
//! assert_eq!(ev.slave.as_deref(), Some("poller"));
//! assert_eq!(ev.state, Some(SlaveState::Running));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::state::{Operation, Phase, SlaveState};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === State events ===
    /// The state cell was written.
    ///
    /// Published for every write, so a transition produces three of these
    /// (origin re-announced, transitional, target) and a rolled-back commit
    /// produces the rollback write too. `from == state` marks the before
    /// phase's re-announcement.
    ///
    /// Sets:
    /// - `slave`: instance name
    /// - `from`: previous state
    /// - `state`: new state
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    StateChanged,

    // === Failure events ===
    /// A before/commit/after hook failed. Published before the error
    /// surfaces to the caller.
    ///
    /// Sets:
    /// - `slave`: instance name
    /// - `op`: the control operation
    /// - `phase`: which hook failed
    /// - `state`: where the protocol left the state (unchanged, rolled back,
    ///   or kept, per phase)
    /// - `reason`: failure message
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    HookFailed,

    /// A loop cycle failed (error or caught panic). The worker retries after
    /// the delay; lifecycle state is untouched.
    ///
    /// Sets:
    /// - `slave`: instance name
    /// - `reason`: failure message
    /// - `delay_ms`: retry wait before the next cycle (ms)
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    CycleFailed,

    // === Terminal events ===
    /// Disposal completed; the instance accepts only reads from now on.
    ///
    /// Sets:
    /// - `slave`: instance name
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    Disposed,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,

    /// Name of the slave, if applicable.
    pub slave: Option<Arc<str>>,
    /// Control operation involved.
    pub op: Option<Operation>,
    /// Protocol phase involved.
    pub phase: Option<Phase>,
    /// Previous state (state events only).
    pub from: Option<SlaveState>,
    /// Current/resulting state.
    pub state: Option<SlaveState>,
    /// Human-readable reason (hook/cycle failure message).
    pub reason: Option<Arc<str>>,
    /// Retry delay before the next cycle in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Event classification.
    pub kind: EventKind,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            kind,
            at: SystemTime::now(),
            slave: None,
            op: None,
            phase: None,
            from: None,
            state: None,
            reason: None,
            delay_ms: None,
        }
    }

    /// Attaches the slave name.
    #[inline]
    pub fn with_slave(mut self, slave: impl Into<Arc<str>>) -> Self {
        self.slave = Some(slave.into());
        self
    }

    /// Attaches the control operation.
    #[inline]
    pub fn with_op(mut self, op: Operation) -> Self {
        self.op = Some(op);
        self
    }

    /// Attaches the protocol phase.
    #[inline]
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Attaches the previous state.
    #[inline]
    pub fn with_from(mut self, from: SlaveState) -> Self {
        self.from = Some(from);
        self
    }

    /// Attaches the current/resulting state.
    #[inline]
    pub fn with_state(mut self, state: SlaveState) -> Self {
        self.state = Some(state);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a retry delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Returns `true` for the re-announcement write the before phase performs.
    #[inline]
    pub fn is_reannouncement(&self) -> bool {
        matches!(self.kind, EventKind::StateChanged) && self.from == self.state
    }
}
