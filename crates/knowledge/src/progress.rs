//! Structured progress reporting for ingestion.
//!
//! Ingestion runs in three phases (`load`, `split`, `index`) and emits one event
//! as each phase starts and another when it finishes.

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Progress event emitted during ingestion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionProgress {
    /// Phase of the operation: "load", "split", "index"
    pub phase: String,

    /// Units done in this phase (bytes read, chunks produced or indexed)
    pub current: u64,

    /// Total expected work, when known
    pub total: Option<u64>,

    /// Human-readable message
    pub message: String,

    /// Seconds since the reporter was created
    pub elapsed_secs: Option<f64>,
}

impl IngestionProgress {
    pub fn new(
        phase: impl Into<String>,
        current: u64,
        total: Option<u64>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            phase: phase.into(),
            current,
            total,
            message: message.into(),
            elapsed_secs: None,
        }
    }

    /// Percentage complete (0.0 - 100.0), when the total is known.
    pub fn percentage(&self) -> Option<f64> {
        self.total.map(|t| {
            if t > 0 {
                (self.current as f64 / t as f64) * 100.0
            } else {
                0.0
            }
        })
    }

    /// Format as a simple user-facing line.
    pub fn format_simple(&self) -> String {
        let progress = match self.total {
            Some(total) => format!("{}/{}", self.current, total),
            None => self.current.to_string(),
        };
        let pct = self
            .percentage()
            .map(|p| format!(" ({:.0}%)", p))
            .unwrap_or_default();

        format!("[{}] {}{} - {}", self.phase, progress, pct, self.message)
    }
}

/// Callback for progress events.
pub type ProgressCallback = Arc<dyn Fn(IngestionProgress) + Send + Sync>;

/// Progress reporter that emits events through a callback.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    start_time: Instant,
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("enabled", &self.callback.is_some())
            .finish()
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::noop()
    }
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            start_time: Instant::now(),
        }
    }

    /// Reporter that only logs.
    pub fn noop() -> Self {
        Self {
            callback: None,
            start_time: Instant::now(),
        }
    }

    pub fn emit(&self, mut event: IngestionProgress) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        event.elapsed_secs = Some(elapsed);

        tracing::debug!(
            phase = %event.phase,
            current = event.current,
            total = ?event.total,
            message = %event.message,
            elapsed_secs = elapsed,
            "Ingestion progress"
        );

        if let Some(callback) = &self.callback {
            callback(event);
        }
    }

    pub fn load(&self, bytes: u64, file: &str) {
        self.emit(IngestionProgress::new(
            "load",
            bytes,
            Some(bytes),
            format!("reading {}", file),
        ));
    }

    pub fn split(&self, chunks: u64, estimated: Option<u64>) {
        self.emit(IngestionProgress::new(
            "split",
            chunks,
            estimated,
            format!("{} chunks created", chunks),
        ));
    }

    pub fn index(&self, current: u64, total: u64, collection: &str) {
        self.emit(IngestionProgress::new(
            "index",
            current,
            Some(total),
            format!("collection={}", collection),
        ));
    }
}
