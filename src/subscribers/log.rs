//! # LogWriter — simple stdout sink
//!
//! A minimal [`DiagnosticSink`] that prints records to stdout.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [debug] `poller` state stopped -> starting
//! [debug] `poller` state starting -> running
//! [warn] `poller` cycle failed: execution failed: boom; next attempt in 100ms
//! [info] `poller` disposed
//! ```

use super::sink::{DiagnosticSink, SinkLevel};

/// Stdout sink, demo/reference only.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DiagnosticSink for LogWriter {
    fn write(&self, level: SinkLevel, message: &str) {
        println!("[{level}] {message}");
    }
}
