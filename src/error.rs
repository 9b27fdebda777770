//! Error types used by the lifecycle engine and by user-supplied work.
//!
//! This module defines two main error enums:
//!
//! - [`SlaveError`] — errors raised by control operations (start/stop/pause/resume,
//!   the name setter, dispose).
//! - [`WorkError`] — errors raised by user-supplied lifecycle hooks and loop cycles.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//! A hook failure is never wrapped or rephrased: it surfaces through
//! [`SlaveError::Hook`] transparently, after the engine has finished its state
//! bookkeeping and written a diagnostic record.

use thiserror::Error;

use crate::state::{Operation, SlaveState};

/// # Errors produced by control operations.
///
/// These represent refusals and failures of the lifecycle protocol itself.
/// Every variant carries the instance name so call sites handling several
/// slaves can attribute the failure.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SlaveError {
    /// The slave's stable state did not satisfy the operation's precondition.
    ///
    /// The state reported here is the one observed after any in-flight
    /// transition resolved, not the state at call time.
    #[error("cannot {op} `{slave}` while {state}")]
    InvalidTransition {
        /// The operation that was refused.
        op: Operation,
        /// The stable state the slave was in when the precondition ran.
        state: SlaveState,
        /// The instance name.
        slave: String,
    },

    /// A mutating operation was invoked after disposal.
    #[error("`{slave}` is disposed")]
    Disposed {
        /// The instance name.
        slave: String,
    },

    /// Pause or resume was invoked on a slave constructed without pausing
    /// support.
    #[error("`{slave}` does not support pausing")]
    PausingUnsupported {
        /// The instance name.
        slave: String,
    },

    /// A before/commit/after hook failed. The underlying error propagates
    /// verbatim; the state has already been adjusted per the phase rules.
    #[error(transparent)]
    Hook(#[from] WorkError),
}

impl SlaveError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use lackey::{Operation, SlaveError, SlaveState};
    ///
    /// let err = SlaveError::InvalidTransition {
    ///     op: Operation::Pause,
    ///     state: SlaveState::Stopped,
    ///     slave: "poller".into(),
    /// };
    /// assert_eq!(err.as_label(), "invalid_transition");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SlaveError::InvalidTransition { .. } => "invalid_transition",
            SlaveError::Disposed { .. } => "slave_disposed",
            SlaveError::PausingUnsupported { .. } => "pausing_unsupported",
            SlaveError::Hook(e) => e.as_label(),
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SlaveError::InvalidTransition { op, state, slave } => {
                format!("{op} refused for `{slave}`: state is {state}")
            }
            SlaveError::Disposed { slave } => format!("`{slave}` is disposed"),
            SlaveError::PausingUnsupported { slave } => {
                format!("`{slave}` does not support pausing")
            }
            SlaveError::Hook(e) => e.as_message(),
        }
    }
}

/// # Errors produced by user-supplied work.
///
/// Lifecycle hooks and loop cycles return these. [`WorkError::Canceled`] from
/// a cycle whose token was cancelled is a graceful outcome, not a failure.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WorkError {
    /// The hook or cycle failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The work observed its cancellation token and unwound.
    #[error("context cancelled")]
    Canceled,
}

impl WorkError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use lackey::WorkError;
    ///
    /// let err = WorkError::Fail { error: "boom".into() };
    /// assert_eq!(err.as_label(), "work_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkError::Fail { .. } => "work_failed",
            WorkError::Canceled => "work_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            WorkError::Fail { error } => format!("error: {error}"),
            WorkError::Canceled => "context cancelled".to_string(),
        }
    }

    /// Indicates whether the work unwound because its token was cancelled.
    ///
    /// The loop engine treats a cancelled cycle as a graceful exit and
    /// publishes no failure record for it.
    ///
    /// # Example
    /// ```
    /// use lackey::WorkError;
    ///
    /// assert!(WorkError::Canceled.is_canceled());
    /// assert!(!WorkError::Fail { error: "boom".into() }.is_canceled());
    /// ```
    pub fn is_canceled(&self) -> bool {
        matches!(self, WorkError::Canceled)
    }
}
