//! # The worker task behind a loop slave.
//!
//! One worker is spawned per run (start to stop). It alternates cycles and
//! vacations, and rendezvouses with the control side at **checkpoints**: the
//! points between cycles where commands are honored.
//!
//! ```text
//!   spawn ──► gate (Hold) ──► checkpoint ──Run──► cycle ──► vacation ─┐
//!                               ▲  │                                  │
//!                               │  ├─Suspend─► ack ► park ► released ─┤
//!                               │  └─Halt───► ack ► park ► exit       │
//!                               └─────────────────────────────────────┘
//! ```
//!
//! ## Rules
//! - Commands arrive on a watch channel; the worker only *reads* them at
//!   checkpoints, so an in-flight cycle always finishes (or cancels) first.
//! - `Suspend` and `Halt` are acknowledged over the ack channel, then the
//!   worker parks until the control side releases it. The release comes after
//!   the engine has committed the new state, which keeps cycles from running
//!   against a half-finished transition.
//! - A vacation ends early on a kick, on any command change, or when every
//!   command sender is gone (the slave was dropped).
//! - Cycle panics are caught here; they are reported like failures and the
//!   worker keeps going.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{Notify, mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::error::WorkError;
use crate::events::{Bus, Event, EventKind};
use crate::slave::{NameCell, read_label};

use super::cycle::{CycleRef, Vacation};

/// What the control side wants the worker to do next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    /// Stay at the gate; the start transition has not committed yet.
    Hold,
    /// Run cycles.
    Run,
    /// Finish the current cycle, acknowledge, park until released.
    Suspend,
    /// Finish the current cycle, acknowledge, park, then exit.
    Halt,
}

pub(crate) struct Worker {
    pub(crate) cycle: CycleRef,
    pub(crate) bus: Bus,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) name: NameCell,
    pub(crate) retry_delay: Duration,
    pub(crate) scope: CancellationToken,
    pub(crate) cmd_rx: watch::Receiver<Command>,
    pub(crate) ack_tx: mpsc::Sender<()>,
    pub(crate) release: Arc<Notify>,
    pub(crate) kick: Arc<Notify>,
}

impl Worker {
    pub(crate) async fn run(mut self) {
        if !self.wait_while(Command::Hold).await {
            return;
        }

        loop {
            match self.control() {
                None => return,
                Some(Command::Run) => {}
                Some(Command::Hold) => {
                    if !self.wait_while(Command::Hold).await {
                        return;
                    }
                    continue;
                }
                Some(Command::Suspend) => {
                    if !self.park_at_checkpoint().await {
                        return;
                    }
                    if !self.wait_while(Command::Suspend).await {
                        return;
                    }
                    continue;
                }
                Some(Command::Halt) => {
                    let _ = self.park_at_checkpoint().await;
                    return;
                }
            }

            let ctx = self.scope.child_token();
            let outcome = std::panic::AssertUnwindSafe(self.cycle.run(ctx))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(Vacation::Immediate)) => {}
                Ok(Ok(Vacation::Rest(rest))) => self.vacation(rest).await,
                Ok(Err(WorkError::Canceled)) => {}
                Ok(Err(err)) => {
                    self.report_failure(err.to_string());
                    self.vacation(self.retry_delay).await;
                }
                Err(payload) => {
                    self.report_failure(panic_reason(payload));
                    self.vacation(self.retry_delay).await;
                }
            }
        }
    }

    /// Latest command, marking it seen. `None` once every sender is gone.
    fn control(&mut self) -> Option<Command> {
        if self.cmd_rx.has_changed().is_err() {
            return None;
        }
        Some(*self.cmd_rx.borrow_and_update())
    }

    /// Blocks while the command equals `held`. False when the channel closes.
    async fn wait_while(&mut self, held: Command) -> bool {
        loop {
            match self.control() {
                None => return false,
                Some(cmd) if cmd == held => {
                    if self.cmd_rx.changed().await.is_err() {
                        return false;
                    }
                }
                Some(_) => return true,
            }
        }
    }

    /// Acknowledges the pending command and parks until released. The permit
    /// semantics of [`Notify`] cover a release that arrives before the park.
    async fn park_at_checkpoint(&mut self) -> bool {
        if self.ack_tx.send(()).await.is_err() {
            return false;
        }
        self.release.notified().await;
        true
    }

    async fn vacation(&mut self, rest: Duration) {
        if rest.is_zero() {
            return;
        }
        tokio::select! {
            () = self.clock.sleep(rest) => {}
            () = self.kick.notified() => {}
            _ = self.cmd_rx.changed() => {}
        }
    }

    fn report_failure(&self, reason: String) {
        self.bus.publish(
            Event::new(EventKind::CycleFailed)
                .with_slave(read_label(&self.name))
                .with_reason(reason)
                .with_delay(self.retry_delay),
        );
    }
}

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("cycle panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("cycle panicked: {s}")
    } else {
        "cycle panicked".to_string()
    }
}
