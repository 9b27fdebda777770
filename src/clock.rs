//! # Injectable time source.
//!
//! Every component that sleeps or measures elapsed time goes through [`Clock`]
//! instead of calling the timer directly, so tests can substitute a
//! deterministic source:
//!
//! - [`SystemClock`] — the default, backed by the tokio timer.
//! - [`ManualClock`] — virtual time that only moves when the test calls
//!   [`advance`](ManualClock::advance).
//!
//! There is no process-wide clock: the source is passed in at construction
//! and owned by the instance that uses it.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::Instant;

/// Monotonic time source used for vacations, retry waits and state-wait
/// timeouts.
#[async_trait]
pub trait Clock: Send + Sync + 'static {
    /// Current instant, for measuring elapsed time.
    fn now(&self) -> Instant;

    /// Suspends the caller for `dur`.
    async fn sleep(&self, dur: Duration);
}

/// Wall clock backed by the tokio timer.
///
/// Under `tokio::time::pause` this advances with the runtime's virtual time,
/// which is what the timing tests in this crate rely on.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, dur: Duration) {
        tokio::time::sleep(dur).await;
    }
}

struct Sleeper {
    deadline: Duration,
    notify: Arc<Notify>,
}

struct ManualState {
    elapsed: Duration,
    sleepers: Vec<Sleeper>,
}

/// Deterministic clock for tests: time stands still until
/// [`advance`](ManualClock::advance) moves it.
///
/// Sleeps registered against it complete exactly when the advanced total
/// passes their deadline. Dropped sleeps are cleaned up lazily once their
/// deadline is crossed.
pub struct ManualClock {
    epoch: Instant,
    inner: Mutex<ManualState>,
}

impl ManualClock {
    /// Creates a clock with zero elapsed virtual time.
    pub fn new() -> Self {
        ManualClock {
            epoch: Instant::now(),
            inner: Mutex::new(ManualState {
                elapsed: Duration::ZERO,
                sleepers: Vec::new(),
            }),
        }
    }

    /// Moves virtual time forward by `dur` and wakes every sleeper whose
    /// deadline has passed.
    pub fn advance(&self, dur: Duration) {
        let due: Vec<Arc<Notify>> = {
            let mut st = self.lock();
            st.elapsed += dur;
            let now = st.elapsed;
            let mut woken = Vec::new();
            st.sleepers.retain(|s| {
                if s.deadline <= now {
                    woken.push(Arc::clone(&s.notify));
                    false
                } else {
                    true
                }
            });
            woken
        };
        for notify in due {
            notify.notify_one();
        }
    }

    /// Total virtual time advanced so far.
    pub fn elapsed(&self) -> Duration {
        self.lock().elapsed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        ManualClock::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.epoch + self.lock().elapsed
    }

    async fn sleep(&self, dur: Duration) {
        let (deadline, notify) = {
            let mut st = self.lock();
            let deadline = st.elapsed + dur;
            if deadline <= st.elapsed {
                return;
            }
            let notify = Arc::new(Notify::new());
            st.sleepers.push(Sleeper {
                deadline,
                notify: Arc::clone(&notify),
            });
            (deadline, notify)
        };
        loop {
            notify.notified().await;
            if self.lock().elapsed >= deadline {
                return;
            }
        }
    }
}
