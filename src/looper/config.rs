//! Loop tuning knobs.

use std::time::Duration;

/// Tuning for the worker loop of a [`LoopSlave`](crate::LoopSlave).
///
/// ```rust
/// use lackey::LoopConfig;
/// use std::time::Duration;
///
/// let cfg = LoopConfig { retry_delay: Duration::from_millis(250) };
/// assert!(cfg.retry_delay > LoopConfig::default().retry_delay);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct LoopConfig {
    /// Rest before the next attempt after a failed (or panicked) cycle.
    /// Fixed, not a backoff: a loop that keeps failing keeps retrying at this
    /// pace until stopped.
    pub retry_delay: Duration,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_millis(100),
        }
    }
}
