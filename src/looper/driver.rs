//! # LoopDriver: the control side of the worker handshake.
//!
//! The driver implements [`Lifecycle`], so the engine's three-phase protocol
//! is what drives the worker:
//!
//! | transition phase      | driver action                               |
//! |-----------------------|---------------------------------------------|
//! | `on_starting`         | spawn the worker, gated on `Hold`           |
//! | `on_after_started`    | send `Run` (Running is committed by now)    |
//! | `on_pausing`          | send `Suspend`, await the ack               |
//! | `on_after_paused`     | release the parked worker                   |
//! | `on_after_resumed`    | send `Run`                                  |
//! | `on_stopping`         | cancel the run scope, send `Halt`, await ack|
//! | `on_after_stopped`    | release, join the worker                    |
//!
//! Awaiting the ack inside the commit hooks is what makes pause and stop wait
//! for the in-flight cycle: the engine does not move past `Pausing`/`Stopping`
//! until the worker has reached a checkpoint.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::error::WorkError;
use crate::events::Bus;
use crate::slave::{Lifecycle, NameCell};

use super::config::LoopConfig;
use super::cycle::CycleRef;
use super::worker::{Command, Worker};

/// Channels and handles of the currently spawned worker. Present from the
/// start commit until the stop after-phase.
struct Active {
    cmd_tx: watch::Sender<Command>,
    ack_rx: mpsc::Receiver<()>,
    release: Arc<Notify>,
    scope: CancellationToken,
    join: JoinHandle<()>,
}

pub(crate) struct LoopDriver {
    cycle: CycleRef,
    config: LoopConfig,
    bus: Bus,
    clock: Arc<dyn Clock>,
    name: NameCell,
    kick: Arc<Notify>,
    active: Mutex<Option<Active>>,
}

impl LoopDriver {
    pub(crate) fn new(
        cycle: CycleRef,
        config: LoopConfig,
        bus: Bus,
        clock: Arc<dyn Clock>,
        name: NameCell,
    ) -> Self {
        Self {
            cycle,
            config,
            bus,
            clock,
            name,
            kick: Arc::new(Notify::new()),
            active: Mutex::new(None),
        }
    }

    /// Requests an immediate next cycle. The permit is buffered, so a kick
    /// landing mid-cycle shortens the vacation that follows it.
    pub(crate) fn kick(&self) {
        self.kick.notify_one();
    }
}

#[async_trait]
impl Lifecycle for LoopDriver {
    async fn on_starting(&self) -> Result<(), WorkError> {
        let mut guard = self.active.lock().await;
        let (cmd_tx, cmd_rx) = watch::channel(Command::Hold);
        let (ack_tx, ack_rx) = mpsc::channel(1);
        let release = Arc::new(Notify::new());
        let scope = CancellationToken::new();

        let worker = Worker {
            cycle: Arc::clone(&self.cycle),
            bus: self.bus.clone(),
            clock: Arc::clone(&self.clock),
            name: Arc::clone(&self.name),
            retry_delay: self.config.retry_delay,
            scope: scope.clone(),
            cmd_rx,
            ack_tx,
            release: Arc::clone(&release),
            kick: Arc::clone(&self.kick),
        };
        let join = tokio::spawn(worker.run());

        *guard = Some(Active { cmd_tx, ack_rx, release, scope, join });
        Ok(())
    }

    async fn on_after_started(&self) -> Result<(), WorkError> {
        let guard = self.active.lock().await;
        if let Some(active) = guard.as_ref() {
            let _ = active.cmd_tx.send(Command::Run);
        }
        Ok(())
    }

    async fn on_pausing(&self) -> Result<(), WorkError> {
        let mut guard = self.active.lock().await;
        if let Some(active) = guard.as_mut() {
            let _ = active.cmd_tx.send(Command::Suspend);
            let _ = active.ack_rx.recv().await;
        }
        Ok(())
    }

    async fn on_after_paused(&self) -> Result<(), WorkError> {
        let guard = self.active.lock().await;
        if let Some(active) = guard.as_ref() {
            active.release.notify_one();
        }
        Ok(())
    }

    async fn on_after_resumed(&self) -> Result<(), WorkError> {
        let guard = self.active.lock().await;
        if let Some(active) = guard.as_ref() {
            let _ = active.cmd_tx.send(Command::Run);
        }
        Ok(())
    }

    async fn on_stopping(&self) -> Result<(), WorkError> {
        let mut guard = self.active.lock().await;
        if let Some(active) = guard.as_mut() {
            // Pause leaves the scope alone; stop does not.
            active.scope.cancel();
            let _ = active.cmd_tx.send(Command::Halt);
            let _ = active.ack_rx.recv().await;
        }
        Ok(())
    }

    async fn on_after_stopped(&self) -> Result<(), WorkError> {
        let taken = self.active.lock().await.take();
        if let Some(active) = taken {
            active.release.notify_one();
            let _ = active.join.await;
        }
        Ok(())
    }
}

impl Drop for LoopDriver {
    fn drop(&mut self) {
        // Dropping the channels is what makes the worker exit; cancelling the
        // scope just hurries an in-flight cycle along.
        if let Ok(mut guard) = self.active.try_lock() {
            if let Some(active) = guard.take() {
                active.scope.cancel();
            }
        }
    }
}
