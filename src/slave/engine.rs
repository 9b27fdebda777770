//! # The lifecycle engine.
//!
//! [`Slave`] owns the state cell, the disposal flag, the name, and the control
//! lock, and drives every transition through the same three-phase protocol:
//!
//! ```text
//!              ┌─────────────────────────────────────────────────────────┐
//!  apply(op):  │ lock control  (waits out any in-flight transition)      │
//!              │ disposed? capability? precondition?                     │
//!              │                                                         │
//!              │ 1. before:  write origin (re-announce), run hook        │
//!              │      └─ fail: state unchanged, error out                │
//!              │ 2. commit:  write transitional, run hook                │
//!              │      └─ fail: write origin back, error out              │
//!              │ 3. after:   write target, run hook                      │
//!              │      └─ fail: target kept, error out                    │
//!              └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules
//! - The control lock serializes start/stop/pause/resume/dispose. Acquiring it
//!   is the wait for an in-flight transition: preconditions always evaluate
//!   against the post-wait state.
//! - Every state write is published as a [`StateChanged`](crate::EventKind)
//!   event, including the before phase's re-announcement. That is what makes
//!   the observable history of a start read `Stopped, Stopped, Starting,
//!   Running`.
//! - Hook failures surface verbatim, after the state has been adjusted per the
//!   failing phase and a [`HookFailed`](crate::EventKind) event was published.
//! - `state()` and `name()` never touch the control lock; they are safe to
//!   call from anywhere, at any time, including after disposal.

use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use tokio::sync::{Mutex, broadcast, watch};

use crate::clock::Clock;
use crate::error::{SlaveError, WorkError};
use crate::events::{Bus, Event, EventKind};
use crate::state::{Operation, Phase, SlaveState, Transition};

use super::builder::SlaveBuilder;
use super::hooks::Lifecycle;

/// Shared name cell. Guarded by its own short lock so reads never wait behind
/// a control operation.
pub(crate) type NameCell = Arc<RwLock<Option<String>>>;

/// Snapshot of the name for labels in errors, events and sink records.
pub(crate) fn read_label(name: &NameCell) -> String {
    name.read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .unwrap_or_else(|| "unnamed".to_string())
}

/// Outcome of [`Slave::wait_for_state`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateWait {
    /// A state write arrived within the timeout; carries the state observed.
    Reached(SlaveState),
    /// No state write arrived in time.
    TimedOut,
}

/// A lifecycle-managed background component.
///
/// Constructed in `Stopped`; driven exclusively by [`start`](Slave::start),
/// [`stop`](Slave::stop), [`pause`](Slave::pause), [`resume`](Slave::resume)
/// and [`dispose`](Slave::dispose). All of them can be called from any task;
/// they serialize on the control lock.
///
/// ## Example
/// ```rust
/// use lackey::{Slave, SlaveState};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> Result<(), lackey::SlaveError> {
///     let slave = Slave::builder("poller").build();
///     assert_eq!(slave.state(), SlaveState::Stopped);
///
///     slave.start().await?;
///     assert_eq!(slave.state(), SlaveState::Running);
///
///     slave.stop().await?;
///     slave.dispose().await?;
///     assert!(slave.is_disposed());
///     Ok(())
/// }
/// ```
pub struct Slave {
    name: NameCell,
    control: Mutex<()>,
    state_tx: watch::Sender<SlaveState>,
    disposed: AtomicBool,
    pausable: bool,
    hooks: Arc<dyn Lifecycle>,
    bus: Bus,
    clock: Arc<dyn Clock>,
}

impl Slave {
    /// Starts building a slave with the given name.
    pub fn builder(name: impl Into<String>) -> SlaveBuilder {
        SlaveBuilder::new(name)
    }

    pub(crate) fn from_parts(
        name: NameCell,
        pausable: bool,
        hooks: Arc<dyn Lifecycle>,
        bus: Bus,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (state_tx, _) = watch::channel(SlaveState::Stopped);
        Self {
            name,
            control: Mutex::new(()),
            state_tx,
            disposed: AtomicBool::new(false),
            pausable,
            hooks,
            bus,
            clock,
        }
    }

    /// Current name, if any. Never fails, including after disposal.
    pub fn name(&self) -> Option<String> {
        self.name
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Renames the slave. Rejected once disposed.
    pub fn set_name(&self, name: Option<String>) -> Result<(), SlaveError> {
        if self.is_disposed() {
            return Err(SlaveError::Disposed { slave: self.label() });
        }
        *self.name.write().unwrap_or_else(PoisonError::into_inner) = name;
        Ok(())
    }

    /// Current state. Never blocks on the control lock.
    pub fn state(&self) -> SlaveState {
        *self.state_tx.borrow()
    }

    /// Whether disposal has completed. Monotonic.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(AtomicOrdering::Acquire)
    }

    /// Whether pause/resume are legal for this instance.
    pub fn is_pausing_supported(&self) -> bool {
        self.pausable
    }

    /// New receiver for the lifecycle event stream. Observes only events
    /// published after the call.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Stopped -> Running.
    pub async fn start(&self) -> Result<(), SlaveError> {
        self.apply(Operation::Start).await
    }

    /// Running or Paused -> Stopped.
    pub async fn stop(&self) -> Result<(), SlaveError> {
        self.apply(Operation::Stop).await
    }

    /// Running -> Paused. Requires pausing support.
    pub async fn pause(&self) -> Result<(), SlaveError> {
        self.apply(Operation::Pause).await
    }

    /// Paused -> Running. Requires pausing support.
    pub async fn resume(&self) -> Result<(), SlaveError> {
        self.apply(Operation::Resume).await
    }

    /// Drives the slave to `Stopped` and marks it disposed. Idempotent.
    ///
    /// A failure raised by the internal stop sequence is returned to the
    /// caller, but disposal still completes: `is_disposed()` reads true and
    /// the state is `Stopped` afterwards, no matter what.
    pub async fn dispose(&self) -> Result<(), SlaveError> {
        let _control = self.control.lock().await;
        if self.is_disposed() {
            return Ok(());
        }

        let result = match self.state() {
            SlaveState::Stopped => Ok(()),
            state @ (SlaveState::Running | SlaveState::Paused) => {
                match Transition::plan(Operation::Stop, state) {
                    Some(plan) => self.run_transition(Operation::Stop, plan).await,
                    None => Ok(()),
                }
            }
            // The control lock keeps the state stable; anything transitional
            // here is a torn transition, drive it straight down.
            _ => {
                self.set_state(SlaveState::Stopped);
                Ok(())
            }
        };

        if self.state() != SlaveState::Stopped {
            self.set_state(SlaveState::Stopped);
        }
        self.disposed.store(true, AtomicOrdering::Release);
        self.bus
            .publish(Event::new(EventKind::Disposed).with_slave(self.label()));
        result
    }

    /// Waits for the next state write, up to `timeout`.
    ///
    /// Returns [`StateWait::TimedOut`] rather than failing; disposal does not
    /// disturb a waiter beyond the state writes it performs.
    pub async fn wait_for_state(&self, timeout: Duration) -> StateWait {
        let mut rx = self.state_tx.subscribe();
        tokio::select! {
            changed = rx.changed() => match changed {
                Ok(()) => StateWait::Reached(*rx.borrow()),
                Err(_) => StateWait::TimedOut,
            },
            _ = self.clock.sleep(timeout) => StateWait::TimedOut,
        }
    }

    fn label(&self) -> String {
        read_label(&self.name)
    }

    fn set_state(&self, next: SlaveState) {
        let prev = self.state_tx.send_replace(next);
        self.bus.publish(
            Event::new(EventKind::StateChanged)
                .with_slave(self.label())
                .with_from(prev)
                .with_state(next),
        );
    }

    async fn apply(&self, op: Operation) -> Result<(), SlaveError> {
        let _control = self.control.lock().await;
        if self.is_disposed() {
            return Err(SlaveError::Disposed { slave: self.label() });
        }
        if op.requires_pausing() && !self.pausable {
            return Err(SlaveError::PausingUnsupported { slave: self.label() });
        }
        let current = self.state();
        let Some(plan) = Transition::plan(op, current) else {
            return Err(SlaveError::InvalidTransition {
                op,
                state: current,
                slave: self.label(),
            });
        };
        self.run_transition(op, plan).await
    }

    /// Runs the three phases for an already validated transition. Caller holds
    /// the control lock.
    async fn run_transition(&self, op: Operation, t: Transition) -> Result<(), SlaveError> {
        self.set_state(t.origin);
        if let Err(err) = self.run_hook(op, Phase::Before).await {
            self.publish_hook_failure(op, Phase::Before, t.origin, &err);
            return Err(err.into());
        }

        self.set_state(t.transitional);
        if let Err(err) = self.run_hook(op, Phase::Commit).await {
            self.set_state(t.origin);
            self.publish_hook_failure(op, Phase::Commit, t.origin, &err);
            return Err(err.into());
        }

        self.set_state(t.target);
        if let Err(err) = self.run_hook(op, Phase::After).await {
            self.publish_hook_failure(op, Phase::After, t.target, &err);
            return Err(err.into());
        }
        Ok(())
    }

    async fn run_hook(&self, op: Operation, phase: Phase) -> Result<(), WorkError> {
        match (op, phase) {
            (Operation::Start, Phase::Before) => self.hooks.on_before_starting().await,
            (Operation::Start, Phase::Commit) => self.hooks.on_starting().await,
            (Operation::Start, Phase::After) => self.hooks.on_after_started().await,
            (Operation::Stop, Phase::Before) => self.hooks.on_before_stopping().await,
            (Operation::Stop, Phase::Commit) => self.hooks.on_stopping().await,
            (Operation::Stop, Phase::After) => self.hooks.on_after_stopped().await,
            (Operation::Pause, Phase::Before) => self.hooks.on_before_pausing().await,
            (Operation::Pause, Phase::Commit) => self.hooks.on_pausing().await,
            (Operation::Pause, Phase::After) => self.hooks.on_after_paused().await,
            (Operation::Resume, Phase::Before) => self.hooks.on_before_resuming().await,
            (Operation::Resume, Phase::Commit) => self.hooks.on_resuming().await,
            (Operation::Resume, Phase::After) => self.hooks.on_after_resumed().await,
        }
    }

    fn publish_hook_failure(
        &self,
        op: Operation,
        phase: Phase,
        state: SlaveState,
        err: &WorkError,
    ) {
        self.bus.publish(
            Event::new(EventKind::HookFailed)
                .with_slave(self.label())
                .with_op(op)
                .with_phase(phase)
                .with_state(state)
                .with_reason(err.to_string()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use tokio::time::Instant;

    /// Hooks whose behavior tests script per extension point.
    #[derive(Default)]
    struct Scripted {
        fail_on: StdMutex<Option<&'static str>>,
        delay_on: StdMutex<Option<(&'static str, Duration)>>,
        calls: StdMutex<Vec<&'static str>>,
    }

    impl Scripted {
        fn fail(&self, hook: &'static str) {
            *self.fail_on.lock().unwrap() = Some(hook);
        }

        fn delay(&self, hook: &'static str, d: Duration) {
            *self.delay_on.lock().unwrap() = Some((hook, d));
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        async fn observe(&self, hook: &'static str) -> Result<(), WorkError> {
            self.calls.lock().unwrap().push(hook);
            let delay = match *self.delay_on.lock().unwrap() {
                Some((h, d)) if h == hook => Some(d),
                _ => None,
            };
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }
            let fails = matches!(*self.fail_on.lock().unwrap(), Some(h) if h == hook);
            if fails {
                Err(WorkError::Fail { error: format!("{hook} scripted failure") })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl Lifecycle for Scripted {
        async fn on_before_starting(&self) -> Result<(), WorkError> {
            self.observe("on_before_starting").await
        }
        async fn on_starting(&self) -> Result<(), WorkError> {
            self.observe("on_starting").await
        }
        async fn on_after_started(&self) -> Result<(), WorkError> {
            self.observe("on_after_started").await
        }
        async fn on_before_stopping(&self) -> Result<(), WorkError> {
            self.observe("on_before_stopping").await
        }
        async fn on_stopping(&self) -> Result<(), WorkError> {
            self.observe("on_stopping").await
        }
        async fn on_after_stopped(&self) -> Result<(), WorkError> {
            self.observe("on_after_stopped").await
        }
        async fn on_before_pausing(&self) -> Result<(), WorkError> {
            self.observe("on_before_pausing").await
        }
        async fn on_pausing(&self) -> Result<(), WorkError> {
            self.observe("on_pausing").await
        }
        async fn on_after_paused(&self) -> Result<(), WorkError> {
            self.observe("on_after_paused").await
        }
        async fn on_before_resuming(&self) -> Result<(), WorkError> {
            self.observe("on_before_resuming").await
        }
        async fn on_resuming(&self) -> Result<(), WorkError> {
            self.observe("on_resuming").await
        }
        async fn on_after_resumed(&self) -> Result<(), WorkError> {
            self.observe("on_after_resumed").await
        }
    }

    fn scripted_slave(name: &str) -> (Arc<Slave>, Arc<Scripted>) {
        let hooks = Arc::new(Scripted::default());
        let slave = Slave::builder(name)
            .lifecycle(Arc::clone(&hooks) as Arc<dyn Lifecycle>)
            .build();
        (Arc::new(slave), hooks)
    }

    fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        events
    }

    fn states_of(events: &[Event]) -> Vec<SlaveState> {
        events
            .iter()
            .filter(|e| e.kind == EventKind::StateChanged)
            .filter_map(|e| e.state)
            .collect()
    }

    fn hook_failures(events: &[Event]) -> Vec<Event> {
        events
            .iter()
            .filter(|e| e.kind == EventKind::HookFailed)
            .cloned()
            .collect()
    }

    #[tokio::test]
    async fn test_constructed_stopped_not_disposed() {
        let slave = Slave::builder("fresh").build();
        assert_eq!(slave.state(), SlaveState::Stopped);
        assert!(!slave.is_disposed());
        assert!(slave.is_pausing_supported());
        assert_eq!(slave.name().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_start_history_shows_duplicate_stopped() {
        let (slave, _hooks) = scripted_slave("a");
        let mut rx = slave.events();

        let mut history = vec![slave.state()];
        slave.start().await.expect("start must succeed");
        assert_eq!(slave.state(), SlaveState::Running);

        let events = drain(&mut rx);
        history.extend(states_of(&events));
        assert_eq!(
            history,
            vec![
                SlaveState::Stopped,
                SlaveState::Stopped,
                SlaveState::Starting,
                SlaveState::Running,
            ],
            "the second Stopped is the before phase's re-announcement"
        );
        assert!(events[0].is_reannouncement());
    }

    #[tokio::test]
    async fn test_round_trip_history_repeats() {
        let (slave, _hooks) = scripted_slave("rt");
        let mut rx = slave.events();
        let expected = vec![
            SlaveState::Stopped,
            SlaveState::Starting,
            SlaveState::Running,
            SlaveState::Running,
            SlaveState::Stopping,
            SlaveState::Stopped,
        ];

        for round in 0..2 {
            slave.start().await.expect("start must succeed");
            slave.stop().await.expect("stop must succeed");
            let pattern = states_of(&drain(&mut rx));
            assert_eq!(pattern, expected, "history diverged on round {round}");
        }
    }

    #[tokio::test]
    async fn test_hooks_run_in_phase_order() {
        let (slave, hooks) = scripted_slave("order");
        slave.start().await.expect("start must succeed");
        assert_eq!(
            hooks.calls(),
            vec!["on_before_starting", "on_starting", "on_after_started"]
        );
    }

    #[tokio::test]
    async fn test_precondition_failures_leave_state_untouched() {
        // (operation to refuse, states to try it from)
        let cases: [(&str, &[SlaveState]); 4] = [
            ("start", &[SlaveState::Running, SlaveState::Paused]),
            ("stop", &[SlaveState::Stopped]),
            ("pause", &[SlaveState::Stopped, SlaveState::Paused]),
            ("resume", &[SlaveState::Stopped, SlaveState::Running]),
        ];

        for (op_name, froms) in cases {
            for &from in froms {
                let (slave, _hooks) = scripted_slave("matrix");
                if from != SlaveState::Stopped {
                    slave.start().await.expect("setup start");
                }
                if from == SlaveState::Paused {
                    slave.pause().await.expect("setup pause");
                }
                assert_eq!(slave.state(), from, "setup for {op_name} from {from}");

                let mut rx = slave.events();
                let result = match op_name {
                    "start" => slave.start().await,
                    "stop" => slave.stop().await,
                    "pause" => slave.pause().await,
                    _ => slave.resume().await,
                };

                match result {
                    Err(SlaveError::InvalidTransition { state, .. }) => {
                        assert_eq!(state, from, "{op_name} must report the resolved state")
                    }
                    other => panic!("{op_name} from {from} must be refused, got {other:?}"),
                }
                assert_eq!(slave.state(), from, "{op_name} must not move the state");
                assert!(
                    states_of(&drain(&mut rx)).is_empty(),
                    "{op_name} refusal must not write the state cell"
                );
            }
        }
    }

    #[tokio::test]
    async fn test_pause_and_resume_refused_without_capability() {
        let slave = Slave::builder("rigid").pausable(false).build();
        slave.start().await.expect("start must succeed");

        let paused = slave.pause().await;
        assert!(
            matches!(paused, Err(SlaveError::PausingUnsupported { ref slave }) if slave == "rigid"),
            "got {paused:?}"
        );
        let resumed = slave.resume().await;
        assert!(matches!(resumed, Err(SlaveError::PausingUnsupported { .. })));
        assert_eq!(slave.state(), SlaveState::Running);
        assert!(!slave.is_pausing_supported());
    }

    #[tokio::test]
    async fn test_commit_failure_rolls_back_to_running() {
        let (slave, hooks) = scripted_slave("c");
        slave.start().await.expect("start must succeed");
        hooks.fail("on_stopping");
        let mut rx = slave.events();

        let err = slave.stop().await.expect_err("stop must fail");
        assert_eq!(err.to_string(), "execution failed: on_stopping scripted failure");
        assert_eq!(slave.state(), SlaveState::Running, "commit failure must roll back");

        let events = drain(&mut rx);
        assert_eq!(
            states_of(&events),
            vec![SlaveState::Running, SlaveState::Stopping, SlaveState::Running],
            "re-announce, transitional, rollback"
        );
        let failures = hook_failures(&events);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].op, Some(Operation::Stop));
        assert_eq!(failures[0].phase, Some(Phase::Commit));
        assert_eq!(failures[0].state, Some(SlaveState::Running));
    }

    #[tokio::test]
    async fn test_commit_failure_rolls_back_for_every_operation() {
        // (commit hook, setup ops, origin it must return to)
        let cases: [(&'static str, &[&str], SlaveState); 4] = [
            ("on_starting", &[], SlaveState::Stopped),
            ("on_stopping", &["start"], SlaveState::Running),
            ("on_pausing", &["start"], SlaveState::Running),
            ("on_resuming", &["start", "pause"], SlaveState::Paused),
        ];

        for (hook, setup, origin) in cases {
            let (slave, hooks) = scripted_slave("rollback");
            for op in setup {
                match *op {
                    "start" => slave.start().await.expect("setup start"),
                    _ => slave.pause().await.expect("setup pause"),
                }
            }
            hooks.fail(hook);

            let result = match hook {
                "on_starting" => slave.start().await,
                "on_stopping" => slave.stop().await,
                "on_pausing" => slave.pause().await,
                _ => slave.resume().await,
            };

            assert!(
                matches!(result, Err(SlaveError::Hook(_))),
                "{hook} failure must surface as a hook error"
            );
            assert_eq!(slave.state(), origin, "{hook} failure must restore the origin");
        }
    }

    #[tokio::test]
    async fn test_after_failure_keeps_target() {
        let (slave, hooks) = scripted_slave("d");
        slave.start().await.expect("start must succeed");
        hooks.fail("on_after_stopped");
        let mut rx = slave.events();

        let err = slave.stop().await.expect_err("stop must fail");
        assert!(matches!(err, SlaveError::Hook(WorkError::Fail { .. })));
        assert_eq!(slave.state(), SlaveState::Stopped, "target must be kept");

        let events = drain(&mut rx);
        let failures = hook_failures(&events);
        assert_eq!(failures[0].phase, Some(Phase::After));
        assert_eq!(failures[0].state, Some(SlaveState::Stopped));
    }

    #[tokio::test]
    async fn test_after_failure_keeps_running_on_start() {
        let (slave, hooks) = scripted_slave("d2");
        hooks.fail("on_after_started");
        slave.start().await.expect_err("start must fail");
        assert_eq!(slave.state(), SlaveState::Running);
    }

    #[tokio::test]
    async fn test_before_failure_never_reaches_transitional() {
        let (slave, hooks) = scripted_slave("b4");
        slave.start().await.expect("start must succeed");
        hooks.fail("on_before_stopping");
        let mut rx = slave.events();

        slave.stop().await.expect_err("stop must fail");
        assert_eq!(slave.state(), SlaveState::Running);

        let events = drain(&mut rx);
        assert_eq!(
            states_of(&events),
            vec![SlaveState::Running],
            "only the re-announcement may be written"
        );
        let failures = hook_failures(&events);
        assert_eq!(failures[0].phase, Some(Phase::Before));
        assert_eq!(failures[0].state, Some(SlaveState::Running));
        assert!(
            !hooks.calls().contains(&"on_stopping"),
            "commit hook must not run after a before failure"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_during_start_blocks_until_resolution() {
        let (slave, hooks) = scripted_slave("b");
        hooks.delay("on_starting", Duration::from_secs(1));

        let first = {
            let s = Arc::clone(&slave);
            tokio::spawn(async move { s.start().await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(slave.state(), SlaveState::Starting, "commit must be in flight");

        let waited = Instant::now();
        let second = slave.start().await;
        let blocked = waited.elapsed();

        match second {
            Err(SlaveError::InvalidTransition { op, state, .. }) => {
                assert_eq!(op, Operation::Start);
                assert_eq!(state, SlaveState::Running, "precondition must see the post-wait state");
            }
            other => panic!("second start must be refused, got {other:?}"),
        }
        assert_eq!(blocked, Duration::from_millis(900));
        first
            .await
            .expect("first start must join")
            .expect("first start must succeed");
    }

    #[tokio::test]
    async fn test_dispose_is_idempotent() {
        let (slave, _hooks) = scripted_slave("di");
        slave.start().await.expect("start must succeed");

        slave.dispose().await.expect("first dispose must succeed");
        assert!(slave.is_disposed());
        assert_eq!(slave.state(), SlaveState::Stopped);

        slave.dispose().await.expect("second dispose must be a no-op");
        assert!(slave.is_disposed());
    }

    #[tokio::test]
    async fn test_disposed_rejects_mutation_allows_reads() {
        let (slave, _hooks) = scripted_slave("dr");
        slave.dispose().await.expect("dispose must succeed");

        assert!(matches!(slave.start().await, Err(SlaveError::Disposed { .. })));
        assert!(matches!(slave.stop().await, Err(SlaveError::Disposed { .. })));
        assert!(matches!(slave.pause().await, Err(SlaveError::Disposed { .. })));
        assert!(matches!(slave.resume().await, Err(SlaveError::Disposed { .. })));
        assert!(matches!(
            slave.set_name(Some("renamed".into())),
            Err(SlaveError::Disposed { .. })
        ));

        assert_eq!(slave.name().as_deref(), Some("dr"));
        assert_eq!(slave.state(), SlaveState::Stopped);
    }

    #[tokio::test]
    async fn test_dispose_from_stopped_skips_hooks() {
        let (slave, hooks) = scripted_slave("dq");
        slave.dispose().await.expect("dispose must succeed");
        assert!(hooks.calls().is_empty(), "no stop transition was needed");
    }

    #[tokio::test]
    async fn test_dispose_runs_full_stop_from_paused() {
        let (slave, _hooks) = scripted_slave("dp");
        slave.start().await.expect("start");
        slave.pause().await.expect("pause");
        let mut rx = slave.events();

        slave.dispose().await.expect("dispose must succeed");
        let events = drain(&mut rx);
        assert_eq!(
            states_of(&events),
            vec![SlaveState::Paused, SlaveState::Stopping, SlaveState::Stopped]
        );
        assert!(events.iter().any(|e| e.kind == EventKind::Disposed));
    }

    #[tokio::test]
    async fn test_dispose_surfaces_stop_failure_but_completes() {
        let (slave, hooks) = scripted_slave("df");
        slave.start().await.expect("start must succeed");
        hooks.fail("on_stopping");
        let mut rx = slave.events();

        let err = slave.dispose().await.expect_err("internal stop failure must surface");
        assert!(matches!(err, SlaveError::Hook(_)));
        assert!(slave.is_disposed(), "disposal must complete regardless");
        assert_eq!(slave.state(), SlaveState::Stopped, "state must be forced down");

        let events = drain(&mut rx);
        assert_eq!(
            states_of(&events),
            vec![
                SlaveState::Running,
                SlaveState::Stopping,
                SlaveState::Running,
                SlaveState::Stopped,
            ],
            "rollback happens first, then the forced final write"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_state_observes_next_write() {
        let (slave, _hooks) = scripted_slave("w");
        let waiter = {
            let s = Arc::clone(&slave);
            tokio::spawn(async move { s.wait_for_state(Duration::from_secs(5)).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        slave.start().await.expect("start must succeed");
        let got = waiter.await.expect("waiter must join");
        assert_eq!(
            got,
            StateWait::Reached(SlaveState::Stopped),
            "the first write is the before phase's re-announcement"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_state_times_out_quietly() {
        let (slave, _hooks) = scripted_slave("wt");
        let got = slave.wait_for_state(Duration::from_millis(50)).await;
        assert_eq!(got, StateWait::TimedOut);
    }

    #[tokio::test]
    async fn test_errors_carry_the_current_name() {
        let (slave, _hooks) = scripted_slave("korn");
        let err = slave.stop().await.expect_err("stop from stopped must fail");
        assert!(matches!(err, SlaveError::InvalidTransition { ref slave, .. } if slave == "korn"));

        slave.set_name(None).expect("rename must succeed");
        let err = slave.stop().await.expect_err("stop from stopped must fail");
        assert!(
            matches!(err, SlaveError::InvalidTransition { ref slave, .. } if slave == "unnamed")
        );
    }
}
