//! # Diagnostic sink: the external-logger boundary.
//!
//! The engine never depends on a logging backend. It publishes events, and
//! [`SinkWriter`] (a regular [`Subscribe`] implementation) renders them into
//! leveled text records for whatever [`DiagnosticSink`] was injected at
//! construction. If no sink is injected, nothing is rendered and the records
//! are dropped.
//!
//! ```text
//!   Bus ──► listener ──► SubscriberSet ──► SinkWriter ──► DiagnosticSink::write(level, message)
//! ```
//!
//! ## Record shapes
//! ```text
//! [debug] `poller` state stopped -> starting
//! [error] `poller` on_stopping failed during stopping: execution failed: boom; reverted to running
//! [warn]  `poller` cycle failed: execution failed: socket closed; next attempt in 100ms
//! [info]  `poller` disposed
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::state::{Phase, SlaveState};

use super::Subscribe;

/// Severity of a diagnostic record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SinkLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for SinkLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SinkLevel::Trace => "trace",
            SinkLevel::Debug => "debug",
            SinkLevel::Info => "info",
            SinkLevel::Warn => "warn",
            SinkLevel::Error => "error",
        };
        f.write_str(s)
    }
}

/// Minimal capability the engine requires from an external logger.
///
/// Implementations must not panic and should return quickly; records are
/// written from a subscriber worker task, so a slow sink delays only its own
/// queue, never the engine.
pub trait DiagnosticSink: Send + Sync + 'static {
    /// Writes one leveled record.
    fn write(&self, level: SinkLevel, message: &str);
}

/// Subscriber that renders lifecycle events into sink records.
///
/// Wired automatically when a sink is passed to a builder; can also be added
/// by hand as an ordinary subscriber.
pub struct SinkWriter {
    sink: Arc<dyn DiagnosticSink>,
}

impl SinkWriter {
    /// Creates a writer over the given sink.
    #[must_use]
    pub fn new(sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { sink }
    }
}

fn state_str(state: Option<SlaveState>) -> String {
    state.map_or_else(|| "?".to_string(), |s| s.to_string())
}

#[async_trait]
impl Subscribe for SinkWriter {
    async fn on_event(&self, e: &Event) {
        let slave = e.slave.as_deref().unwrap_or("unnamed");
        let reason = e.reason.as_deref().unwrap_or("unknown");

        let (level, message) = match e.kind {
            EventKind::StateChanged => {
                let level = if e.is_reannouncement() {
                    SinkLevel::Trace
                } else {
                    SinkLevel::Debug
                };
                (
                    level,
                    format!(
                        "`{slave}` state {} -> {}",
                        state_str(e.from),
                        state_str(e.state)
                    ),
                )
            }
            EventKind::HookFailed => {
                let hook = match (e.op, e.phase) {
                    (Some(op), Some(phase)) => op.hook_name(phase),
                    _ => "hook",
                };
                let message = match (e.op, e.phase) {
                    (Some(op), Some(Phase::Before)) => format!(
                        "`{slave}` {hook} failed: {reason}; {op} aborted, state {} unchanged",
                        state_str(e.state)
                    ),
                    (Some(op), Some(Phase::Commit)) => format!(
                        "`{slave}` {hook} failed during {}: {reason}; reverted to {}",
                        op.transitional(),
                        state_str(e.state)
                    ),
                    (_, Some(Phase::After)) => format!(
                        "`{slave}` {hook} failed: {reason}; state kept at {}",
                        state_str(e.state)
                    ),
                    _ => format!("`{slave}` {hook} failed: {reason}"),
                };
                (SinkLevel::Error, message)
            }
            EventKind::CycleFailed => (
                SinkLevel::Warn,
                format!(
                    "`{slave}` cycle failed: {reason}; next attempt in {}ms",
                    e.delay_ms.unwrap_or(0)
                ),
            ),
            EventKind::Disposed => (SinkLevel::Info, format!("`{slave}` disposed")),
        };

        self.sink.write(level, &message);
    }

    fn name(&self) -> &'static str {
        "SinkWriter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Operation;
    use std::sync::Mutex;

    struct RecordingSink {
        records: Mutex<Vec<(SinkLevel, String)>>,
    }

    impl RecordingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self { records: Mutex::new(Vec::new()) })
        }
        fn take(&self) -> Vec<(SinkLevel, String)> {
            std::mem::take(&mut self.records.lock().expect("sink lock"))
        }
    }

    impl DiagnosticSink for RecordingSink {
        fn write(&self, level: SinkLevel, message: &str) {
            self.records
                .lock()
                .expect("sink lock")
                .push((level, message.to_string()));
        }
    }

    #[tokio::test]
    async fn test_commit_failure_names_hook_and_origin() {
        let sink = RecordingSink::new();
        let writer = SinkWriter::new(Arc::clone(&sink) as Arc<dyn DiagnosticSink>);

        let ev = Event::new(EventKind::HookFailed)
            .with_slave("poller")
            .with_op(Operation::Stop)
            .with_phase(Phase::Commit)
            .with_state(SlaveState::Running)
            .with_reason("execution failed: boom");
        writer.on_event(&ev).await;

        let records = sink.take();
        assert_eq!(records.len(), 1);
        let (level, message) = &records[0];
        assert_eq!(*level, SinkLevel::Error);
        assert!(message.contains("on_stopping"), "message: {message}");
        assert!(message.contains("during stopping"), "message: {message}");
        assert!(message.contains("reverted to running"), "message: {message}");
    }

    #[tokio::test]
    async fn test_state_change_levels() {
        let sink = RecordingSink::new();
        let writer = SinkWriter::new(Arc::clone(&sink) as Arc<dyn DiagnosticSink>);

        let dup = Event::new(EventKind::StateChanged)
            .with_slave("poller")
            .with_from(SlaveState::Stopped)
            .with_state(SlaveState::Stopped);
        let real = Event::new(EventKind::StateChanged)
            .with_slave("poller")
            .with_from(SlaveState::Stopped)
            .with_state(SlaveState::Starting);
        writer.on_event(&dup).await;
        writer.on_event(&real).await;

        let records = sink.take();
        assert_eq!(records[0].0, SinkLevel::Trace);
        assert_eq!(records[1].0, SinkLevel::Debug);
        assert!(records[1].1.contains("stopped -> starting"));
    }

    #[tokio::test]
    async fn test_cycle_failure_mentions_retry_delay() {
        let sink = RecordingSink::new();
        let writer = SinkWriter::new(Arc::clone(&sink) as Arc<dyn DiagnosticSink>);

        let ev = Event::new(EventKind::CycleFailed)
            .with_slave("drainer")
            .with_reason("socket closed")
            .with_delay(std::time::Duration::from_millis(100));
        writer.on_event(&ev).await;

        let records = sink.take();
        assert_eq!(records[0].0, SinkLevel::Warn);
        assert!(records[0].1.contains("next attempt in 100ms"));
    }
}
