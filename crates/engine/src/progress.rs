//! Progress delivery.
//!
//! Delivery is best-effort: a failing sink is logged and the run goes on.

use crate::types::ProgressEvent;
use inquest_core::{AppError, AppResult};
use tokio::sync::mpsc::UnboundedSender;

/// Receives one event per iteration.
pub trait ProgressSink: Send + Sync {
    fn deliver(&self, event: &ProgressEvent) -> AppResult<()>;
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn deliver(&self, event: &ProgressEvent) -> AppResult<()> {
        self(event);
        Ok(())
    }
}

impl ProgressSink for UnboundedSender<ProgressEvent> {
    fn deliver(&self, event: &ProgressEvent) -> AppResult<()> {
        self.send(event.clone())
            .map_err(|_| AppError::Other("Progress receiver dropped".to_string()))
    }
}

/// Sink that discards events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn deliver(&self, _event: &ProgressEvent) -> AppResult<()> {
        Ok(())
    }
}

/// Deliver an event, logging instead of failing.
pub(crate) fn emit(sink: &dyn ProgressSink, event: &ProgressEvent) {
    if let Err(e) = sink.deliver(event) {
        tracing::warn!(iteration = event.iteration, "Failed to deliver progress: {}", e);
    }
}
