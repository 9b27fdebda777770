//! # Lifecycle states and the transition table.
//!
//! [`SlaveState`] splits into two disjoint subsets:
//!
//! - **Stable**: [`Stopped`](SlaveState::Stopped), [`Running`](SlaveState::Running),
//!   [`Paused`](SlaveState::Paused). A slave can remain in a stable state indefinitely.
//! - **Transitional**: [`Starting`](SlaveState::Starting), [`Stopping`](SlaveState::Stopping),
//!   [`Pausing`](SlaveState::Pausing), [`Resuming`](SlaveState::Resuming). These exist only
//!   while a control operation's commit phase is in flight.
//!
//! ```text
//!              start                      pause
//!   Stopped ──────────► Starting ──► Running ──────────► Pausing ──► Paused
//!      ▲                   │            ▲  │                │           │
//!      │    (rollback)     ▼            │  │ stop           ▼           │ resume
//!      └───────────────────┘            │  └──► Stopping    Running     ▼
//!                                       │           │      (rollback)  Resuming ──► Running
//!                                       │           ▼
//!                                       └────── Stopped
//! ```
//!
//! Every transitional state has exactly one target stable state and one origin
//! it rolls back to if the commit-phase hook fails. The origin of `Stopping`
//! depends on where the stop was issued from (`Running` or `Paused`), so the
//! full plan is computed per call by [`Transition::plan`].

use std::fmt;

/// Current position of a slave in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlaveState {
    /// Initial state, and the terminal state of every stop/dispose. Stable.
    Stopped,
    /// A start operation's commit phase is in flight. Transitional.
    Starting,
    /// The slave is doing its work. Stable.
    Running,
    /// A pause operation's commit phase is in flight. Transitional.
    Pausing,
    /// Cycling is suspended until resume or stop. Stable.
    Paused,
    /// A resume operation's commit phase is in flight. Transitional.
    Resuming,
    /// A stop operation's commit phase is in flight. Transitional.
    Stopping,
}

impl SlaveState {
    /// Returns `true` for a state the slave can legitimately remain in.
    pub fn is_stable(&self) -> bool {
        matches!(
            self,
            SlaveState::Stopped | SlaveState::Running | SlaveState::Paused
        )
    }

    /// Returns `true` for a state that exists only while a commit phase runs.
    pub fn is_transitional(&self) -> bool {
        !self.is_stable()
    }
}

impl fmt::Display for SlaveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SlaveState::Stopped => "stopped",
            SlaveState::Starting => "starting",
            SlaveState::Running => "running",
            SlaveState::Pausing => "pausing",
            SlaveState::Paused => "paused",
            SlaveState::Resuming => "resuming",
            SlaveState::Stopping => "stopping",
        };
        f.write_str(s)
    }
}

/// One of the four state-changing control operations.
///
/// Dispose is not listed here: it is an idempotent wrapper that reuses the
/// [`Operation::Stop`] transition internally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Stopped -> Running.
    Start,
    /// Running or Paused -> Stopped.
    Stop,
    /// Running -> Paused.
    Pause,
    /// Paused -> Running.
    Resume,
}

impl Operation {
    /// Returns `true` for the operations that are legal only on a slave
    /// constructed with pausing support.
    pub fn requires_pausing(&self) -> bool {
        matches!(self, Operation::Pause | Operation::Resume)
    }

    /// Transitional state this operation holds while its commit phase runs.
    pub fn transitional(&self) -> SlaveState {
        match self {
            Operation::Start => SlaveState::Starting,
            Operation::Stop => SlaveState::Stopping,
            Operation::Pause => SlaveState::Pausing,
            Operation::Resume => SlaveState::Resuming,
        }
    }

    /// Name of the extension point invoked for this operation at `phase`.
    ///
    /// Used verbatim in diagnostic records, so the strings match the
    /// [`Lifecycle`](crate::Lifecycle) method names.
    pub fn hook_name(&self, phase: Phase) -> &'static str {
        match (self, phase) {
            (Operation::Start, Phase::Before) => "on_before_starting",
            (Operation::Start, Phase::Commit) => "on_starting",
            (Operation::Start, Phase::After) => "on_after_started",
            (Operation::Stop, Phase::Before) => "on_before_stopping",
            (Operation::Stop, Phase::Commit) => "on_stopping",
            (Operation::Stop, Phase::After) => "on_after_stopped",
            (Operation::Pause, Phase::Before) => "on_before_pausing",
            (Operation::Pause, Phase::Commit) => "on_pausing",
            (Operation::Pause, Phase::After) => "on_after_paused",
            (Operation::Resume, Phase::Before) => "on_before_resuming",
            (Operation::Resume, Phase::Commit) => "on_resuming",
            (Operation::Resume, Phase::After) => "on_after_resumed",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operation::Start => "start",
            Operation::Stop => "stop",
            Operation::Pause => "pause",
            Operation::Resume => "resume",
        };
        f.write_str(s)
    }
}

/// Position inside the three-phase protocol at which a hook runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Runs while the state is still the precondition state. Failure aborts
    /// with the state unchanged.
    Before,
    /// Runs while the state is transitional. Failure rolls back to the origin.
    Commit,
    /// Runs after the target state is committed. Failure keeps the target.
    After,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Before => "before",
            Phase::Commit => "commit",
            Phase::After => "after",
        };
        f.write_str(s)
    }
}

/// The resolved plan for one legal transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Transition {
    /// Stable state the operation departs from, and rolls back to on a
    /// commit-phase failure.
    pub(crate) origin: SlaveState,
    /// Transitional state held while the commit-phase hook runs.
    pub(crate) transitional: SlaveState,
    /// Stable state committed before the after-phase hook runs.
    pub(crate) target: SlaveState,
}

impl Transition {
    /// Computes the transition plan for `op` departing from `current`.
    ///
    /// Returns `None` when `current` does not satisfy the operation's
    /// precondition. `current` must be stable; callers evaluate preconditions
    /// only under the control lock, where transitional states cannot be
    /// observed.
    pub(crate) fn plan(op: Operation, current: SlaveState) -> Option<Transition> {
        match (op, current) {
            (Operation::Start, SlaveState::Stopped) => Some(Transition {
                origin: SlaveState::Stopped,
                transitional: SlaveState::Starting,
                target: SlaveState::Running,
            }),
            (Operation::Stop, SlaveState::Running | SlaveState::Paused) => Some(Transition {
                origin: current,
                transitional: SlaveState::Stopping,
                target: SlaveState::Stopped,
            }),
            (Operation::Pause, SlaveState::Running) => Some(Transition {
                origin: SlaveState::Running,
                transitional: SlaveState::Pausing,
                target: SlaveState::Paused,
            }),
            (Operation::Resume, SlaveState::Paused) => Some(Transition {
                origin: SlaveState::Paused,
                transitional: SlaveState::Resuming,
                target: SlaveState::Running,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STABLE: [SlaveState; 3] = [SlaveState::Stopped, SlaveState::Running, SlaveState::Paused];
    const OPS: [Operation; 4] = [
        Operation::Start,
        Operation::Stop,
        Operation::Pause,
        Operation::Resume,
    ];

    #[test]
    fn test_stable_and_transitional_are_disjoint() {
        let all = [
            SlaveState::Stopped,
            SlaveState::Starting,
            SlaveState::Running,
            SlaveState::Pausing,
            SlaveState::Paused,
            SlaveState::Resuming,
            SlaveState::Stopping,
        ];
        for s in all {
            assert_ne!(
                s.is_stable(),
                s.is_transitional(),
                "state {s} must be exactly one of stable/transitional"
            );
        }
    }

    #[test]
    fn test_plan_legality_matches_precondition_table() {
        for op in OPS {
            for state in STABLE {
                let legal = matches!(
                    (op, state),
                    (Operation::Start, SlaveState::Stopped)
                        | (Operation::Stop, SlaveState::Running)
                        | (Operation::Stop, SlaveState::Paused)
                        | (Operation::Pause, SlaveState::Running)
                        | (Operation::Resume, SlaveState::Paused)
                );
                assert_eq!(
                    Transition::plan(op, state).is_some(),
                    legal,
                    "unexpected legality for {op} from {state}"
                );
            }
        }
    }

    #[test]
    fn test_plan_never_accepts_transitional_origin() {
        let transitional = [
            SlaveState::Starting,
            SlaveState::Stopping,
            SlaveState::Pausing,
            SlaveState::Resuming,
        ];
        for op in OPS {
            for state in transitional {
                assert!(
                    Transition::plan(op, state).is_none(),
                    "{op} must not plan from transitional {state}"
                );
            }
        }
    }

    #[test]
    fn test_stop_origin_tracks_departure_state() {
        let from_running = Transition::plan(Operation::Stop, SlaveState::Running)
            .expect("stop from running must be legal");
        assert_eq!(from_running.origin, SlaveState::Running);

        let from_paused = Transition::plan(Operation::Stop, SlaveState::Paused)
            .expect("stop from paused must be legal");
        assert_eq!(from_paused.origin, SlaveState::Paused);

        for t in [from_running, from_paused] {
            assert_eq!(t.transitional, SlaveState::Stopping);
            assert_eq!(t.target, SlaveState::Stopped);
        }
    }

    #[test]
    fn test_plan_shapes_are_consistent() {
        for op in OPS {
            for state in STABLE {
                if let Some(t) = Transition::plan(op, state) {
                    assert_eq!(t.origin, state, "{op} origin must equal departure state");
                    assert!(t.origin.is_stable());
                    assert!(t.transitional.is_transitional());
                    assert!(t.target.is_stable());
                    assert_eq!(t.transitional, op.transitional());
                }
            }
        }
    }

    #[test]
    fn test_hook_names_follow_operation_and_phase() {
        assert_eq!(Operation::Start.hook_name(Phase::Before), "on_before_starting");
        assert_eq!(Operation::Start.hook_name(Phase::Commit), "on_starting");
        assert_eq!(Operation::Start.hook_name(Phase::After), "on_after_started");
        assert_eq!(Operation::Stop.hook_name(Phase::After), "on_after_stopped");
        assert_eq!(Operation::Pause.hook_name(Phase::Commit), "on_pausing");
        assert_eq!(Operation::Resume.hook_name(Phase::Before), "on_before_resuming");
    }

    #[test]
    fn test_display_is_lowercase() {
        assert_eq!(SlaveState::Stopped.to_string(), "stopped");
        assert_eq!(SlaveState::Resuming.to_string(), "resuming");
        assert_eq!(Operation::Pause.to_string(), "pause");
        assert_eq!(Phase::Commit.to_string(), "commit");
    }

    #[test]
    fn test_capability_guard_covers_pause_and_resume_only() {
        assert!(Operation::Pause.requires_pausing());
        assert!(Operation::Resume.requires_pausing());
        assert!(!Operation::Start.requires_pausing());
        assert!(!Operation::Stop.requires_pausing());
    }
}
