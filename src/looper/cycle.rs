//! # Cycle abstraction and function-backed cycle implementation.
//!
//! This module defines the [`Cycle`] trait (one unit of repeated work, async,
//! cancelable) and a convenient function-backed implementation [`CycleFn`].
//! The common handle type is [`CycleRef`], an `Arc<dyn Cycle>` shared with the
//! worker task.
//!
//! A cycle receives a [`CancellationToken`] scoped to the current run: it is
//! cancelled by stop and dispose, but **not** by pause. Cycles should check it
//! at await points and bail out with [`WorkError::Canceled`] to let a stop
//! complete promptly.

use std::{future::Future, sync::Mutex, time::Duration};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::WorkError;

/// # Shared handle to a cycle object.
///
/// This is the type the loop builder takes and the worker holds.
pub type CycleRef = std::sync::Arc<dyn Cycle>;

/// What the worker should do once a cycle returns successfully.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vacation {
    /// Run the next cycle right away.
    Immediate,
    /// Rest for the given duration first. The rest is cut short by a kick or
    /// by any control operation.
    Rest(Duration),
}

/// # One unit of repeated work.
///
/// The worker calls [`run`](Cycle::run) over and over while the slave is
/// running, resting between calls per the returned [`Vacation`]. A failing
/// cycle does not stop the loop: the failure is published and the worker
/// retries after the configured delay.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use lackey::{Cycle, Vacation, WorkError};
/// use std::time::Duration;
///
/// struct Poll;
///
/// #[async_trait]
/// impl Cycle for Poll {
///     async fn run(&self, ctx: CancellationToken) -> Result<Vacation, WorkError> {
///         if ctx.is_cancelled() {
///             return Err(WorkError::Canceled);
///         }
///         // fetch, drain, compact...
///         Ok(Vacation::Rest(Duration::from_secs(5)))
///     }
/// }
/// ```
#[async_trait]
pub trait Cycle: Send + Sync + 'static {
    /// Executes one cycle until completion or cancellation.
    ///
    /// Returning [`WorkError::Canceled`] is the graceful way out; it is not
    /// reported as a failure.
    async fn run(&self, ctx: CancellationToken) -> Result<Vacation, WorkError>;
}

/// # Function-backed cycle implementation.
///
/// [`CycleFn`] wraps a closure `Fnc: FnMut(CancellationToken) -> Fut`.
/// The closure is protected by a [`Mutex`] to allow calling `run(&self, ...)`
/// repeatedly even though the closure is `FnMut`. Use [`CycleFn::arc`] for a
/// one-liner that returns a [`CycleRef`].
///
/// The mutex is held only while the closure creates the future, never across
/// the future's execution. State the returned future touches still needs its
/// own synchronization (`Arc<Mutex<_>>`, atomics, ...).
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use lackey::{CycleFn, CycleRef, Vacation, WorkError};
///
/// let c: CycleRef = CycleFn::arc(|_ctx: CancellationToken| async {
///     // do one round of work...
///     Ok::<_, WorkError>(Vacation::Immediate)
/// });
/// ```
#[derive(Debug)]
pub struct CycleFn<Fnc, Fut>
where
    Fnc: FnMut(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<Vacation, WorkError>> + Send + 'static,
{
    /// Underlying function (guarded by a mutex to allow `FnMut` with `&self`).
    func: Mutex<Fnc>,
}

impl<Fnc, Fut> CycleFn<Fnc, Fut>
where
    Fnc: FnMut(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<Vacation, WorkError>> + Send + 'static,
{
    /// Creates a new function-backed cycle.
    ///
    /// Prefer [`CycleFn::arc`] when you immediately need a [`CycleRef`].
    pub fn new(func: Fnc) -> Self {
        Self { func: Mutex::new(func) }
    }

    /// Creates the cycle and returns it as a shared handle (`Arc<dyn Cycle>`).
    pub fn arc(func: Fnc) -> CycleRef {
        std::sync::Arc::new(Self::new(func))
    }
}

#[async_trait]
impl<Fnc, Fut> Cycle for CycleFn<Fnc, Fut>
where
    Fnc: FnMut(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<Vacation, WorkError>> + Send + 'static,
{
    async fn run(&self, ctx: CancellationToken) -> Result<Vacation, WorkError> {
        let fut = {
            let mut f = self.func.lock().map_err(|_| WorkError::Fail {
                error: "mutex poisoned".into(),
            })?;
            (f)(ctx)
        };
        fut.await
    }
}
