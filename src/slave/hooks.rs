//! # Lifecycle hooks: the extension points a concrete slave implements.
//!
//! Every control operation invokes an ordered list of three named extension
//! points on the [`Lifecycle`] capability interface:
//!
//! ```text
//! start:   on_before_starting -> on_starting  -> on_after_started
//! stop:    on_before_stopping -> on_stopping  -> on_after_stopped
//! pause:   on_before_pausing  -> on_pausing   -> on_after_paused
//! resume:  on_before_resuming -> on_resuming  -> on_after_resumed
//! ```
//!
//! ## Rules
//! - **before**: runs while the state still equals the precondition state.
//!   Failure aborts the operation with the state unchanged.
//! - **commit** (the middle hook): runs while the transitional state is held.
//!   Failure rolls the state back to the origin.
//! - **after**: runs once the target state is committed. Failure surfaces to
//!   the caller but the state stays at the target.
//!
//! All twelve default to no-ops, so an implementation overrides only the
//! points it cares about. Behavior is composed through this one interface;
//! there is no hook inheritance chain.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use lackey::{Lifecycle, WorkError};
//!
//! struct Pump;
//!
//! #[async_trait]
//! impl Lifecycle for Pump {
//!     async fn on_starting(&self) -> Result<(), WorkError> {
//!         // open connections, prime caches...
//!         Ok(())
//!     }
//!
//!     async fn on_after_stopped(&self) -> Result<(), WorkError> {
//!         // release what on_starting acquired
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::WorkError;

/// Capability interface for user lifecycle logic.
///
/// Invoked only from inside the control lock, so at most one hook of one
/// instance runs at a time and the state reads the hook performs are stable.
#[async_trait]
pub trait Lifecycle: Send + Sync + 'static {
    // === Start ===
    /// Before phase of start; state is still `Stopped`.
    async fn on_before_starting(&self) -> Result<(), WorkError> {
        Ok(())
    }
    /// Commit phase of start; state is `Starting`.
    async fn on_starting(&self) -> Result<(), WorkError> {
        Ok(())
    }
    /// After phase of start; state is `Running`.
    async fn on_after_started(&self) -> Result<(), WorkError> {
        Ok(())
    }

    // === Stop ===
    /// Before phase of stop; state is still `Running` or `Paused`.
    async fn on_before_stopping(&self) -> Result<(), WorkError> {
        Ok(())
    }
    /// Commit phase of stop; state is `Stopping`.
    async fn on_stopping(&self) -> Result<(), WorkError> {
        Ok(())
    }
    /// After phase of stop; state is `Stopped`.
    async fn on_after_stopped(&self) -> Result<(), WorkError> {
        Ok(())
    }

    // === Pause ===
    /// Before phase of pause; state is still `Running`.
    async fn on_before_pausing(&self) -> Result<(), WorkError> {
        Ok(())
    }
    /// Commit phase of pause; state is `Pausing`.
    async fn on_pausing(&self) -> Result<(), WorkError> {
        Ok(())
    }
    /// After phase of pause; state is `Paused`.
    async fn on_after_paused(&self) -> Result<(), WorkError> {
        Ok(())
    }

    // === Resume ===
    /// Before phase of resume; state is still `Paused`.
    async fn on_before_resuming(&self) -> Result<(), WorkError> {
        Ok(())
    }
    /// Commit phase of resume; state is `Resuming`.
    async fn on_resuming(&self) -> Result<(), WorkError> {
        Ok(())
    }
    /// After phase of resume; state is `Running`.
    async fn on_after_resumed(&self) -> Result<(), WorkError> {
        Ok(())
    }
}

/// Default hooks for slaves built without user lifecycle logic.
pub(crate) struct Inert;

#[async_trait]
impl Lifecycle for Inert {}
