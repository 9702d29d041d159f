//! Where worker failures are reported.

use crate::Error;

/// Tracing target of events emitted by [`TracingSink`].
pub const SINK_TARGET: &str = "rotalog::sink";

/// Receives failures the worker could not surface to `log()` callers.
pub trait ErrorSink: Send + Sync + 'static {
    fn report(&self, error: &Error);
}

/// Reports failures as `tracing` error events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, error: &Error) {
        tracing::error!(target: SINK_TARGET, error = %error, "file logger failure");
    }
}

impl<F> ErrorSink for F
where
    F: Fn(&Error) + Send + Sync + 'static,
{
    fn report(&self, error: &Error) {
        self(error)
    }
}
