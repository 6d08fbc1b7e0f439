//! Session controller.
//!
//! At most one interrogation runs per controller. The active slot holds the
//! session id, its cancellation token and its answer source; it is freed when
//! the run finishes (only if it still belongs to that run) or synchronously by
//! [`SessionController::stop`], before any asynchronous cleanup is scheduled.

use crate::answer_source::AnswerSource;
use crate::interrogator::Interrogator;
use crate::progress::{emit, ProgressSink};
use crate::types::{InterrogationOutcome, ProgressEvent};
use chrono::{DateTime, Utc};
use inquest_core::{AppError, AppResult};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Everything one run needs.
pub struct SessionConfig {
    pub hypothesis: String,
    pub max_iterations: usize,
    pub interrogator: Arc<Interrogator>,
    pub source: Arc<dyn AnswerSource>,
    pub progress: Arc<dyn ProgressSink>,
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Running,
    Completed,
    Failed,
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: String,
    pub status: SessionStatus,
    pub iterations_completed: usize,
    pub max_iterations: usize,
    pub started_at: DateTime<Utc>,
}

struct ActiveSession {
    id: String,
    token: CancellationToken,
    source: Arc<dyn AnswerSource>,
    iterations: Arc<AtomicUsize>,
    max_iterations: usize,
    started_at: DateTime<Utc>,
}

impl ActiveSession {
    fn snapshot(&self, status: SessionStatus) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id.clone(),
            status,
            iterations_completed: self.iterations.load(Ordering::SeqCst),
            max_iterations: self.max_iterations,
            started_at: self.started_at,
        }
    }
}

#[derive(Default)]
struct Registry {
    active: Option<ActiveSession>,
    last_finished: Option<SessionSnapshot>,
}

/// A started run.
#[derive(Debug)]
pub struct SessionHandle {
    id: String,
    outcome: oneshot::Receiver<AppResult<InterrogationOutcome>>,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wait for the run to end. A stopped run ends with a `cancelled` outcome
    /// once its in-flight call returns.
    pub async fn wait(self) -> AppResult<InterrogationOutcome> {
        self.outcome
            .await
            .map_err(|_| AppError::Other(format!("Session {} ended without a result", self.id)))?
    }
}

/// Owns the single active session.
#[derive(Clone, Default)]
pub struct SessionController {
    registry: Arc<Mutex<Registry>>,
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> AppResult<MutexGuard<'_, Registry>> {
        self.registry
            .lock()
            .map_err(|_| AppError::Other("Session registry lock poisoned".to_string()))
    }

    /// Start a run. Fails with a concurrency error, changing nothing, while
    /// another session is active or when called outside a Tokio runtime.
    pub fn start(&self, config: SessionConfig) -> AppResult<SessionHandle> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            AppError::Other(format!("Sessions need a Tokio runtime: {}", e))
        })?;

        let id = Uuid::new_v4().to_string();
        let token = CancellationToken::new();
        let iterations = Arc::new(AtomicUsize::new(0));

        {
            let mut registry = self.registry()?;
            if let Some(active) = &registry.active {
                return Err(AppError::Concurrency(format!(
                    "Session {} is already running",
                    active.id
                )));
            }
            registry.active = Some(ActiveSession {
                id: id.clone(),
                token: token.clone(),
                source: Arc::clone(&config.source),
                iterations: Arc::clone(&iterations),
                max_iterations: config.max_iterations,
                started_at: Utc::now(),
            });
        }

        tracing::info!(session_id = %id, "Session started");

        let (tx, rx) = oneshot::channel();
        let controller = self.clone();
        let session_id = id.clone();
        runtime.spawn(async move {
            let sink = CountingSink {
                inner: config.progress,
                iterations,
            };
            let result = config
                .interrogator
                .interrogate(
                    &config.hypothesis,
                    config.source.as_ref(),
                    config.max_iterations,
                    &token,
                    &sink,
                )
                .await;

            controller.finish(&session_id, &result);
            // The handle may have been dropped
            let _ = tx.send(result);
        });

        Ok(SessionHandle { id, outcome: rx })
    }

    /// Stop the active session `id`. The slot is free when this returns; the
    /// run stops at its next iteration boundary and the answer source's
    /// `reset_chat` runs in the background.
    pub fn stop(&self, id: &str) -> AppResult<()> {
        let stopped = {
            let mut registry = self.registry()?;
            if registry.active.as_ref().is_some_and(|a| a.id == id) {
                registry.active.take()
            } else {
                None
            }
        };

        let Some(session) = stopped else {
            return Err(AppError::Concurrency(format!(
                "No active session with id {}",
                id
            )));
        };

        session.token.cancel();
        tracing::info!(session_id = %id, "Session stopped");

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let source = session.source;
                let session_id = session.id;
                runtime.spawn(async move {
                    if let Err(e) = source.reset_chat().await {
                        tracing::warn!(%session_id, "Answer source cleanup failed: {}", e);
                    }
                });
            }
            Err(_) => tracing::warn!(session_id = %id, "No runtime; skipping answer source cleanup"),
        }

        Ok(())
    }

    /// Whether `id` is the active session.
    pub fn is_active(&self, id: &str) -> bool {
        self.registry()
            .map(|r| r.active.as_ref().is_some_and(|a| a.id == id))
            .unwrap_or(false)
    }

    /// The active session, if any.
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.registry()
            .ok()?
            .active
            .as_ref()
            .map(|a| a.snapshot(SessionStatus::Running))
    }

    /// The most recent session that finished on its own.
    pub fn last_finished(&self) -> Option<SessionSnapshot> {
        self.registry().ok()?.last_finished.clone()
    }

    fn finish(&self, id: &str, result: &AppResult<InterrogationOutcome>) {
        let status = match result {
            Ok(_) => SessionStatus::Completed,
            Err(_) => SessionStatus::Failed,
        };

        let Ok(mut registry) = self.registry() else {
            tracing::warn!(session_id = %id, "Session registry unavailable at completion");
            return;
        };

        // A stopped session's slot may already belong to a newer one
        if registry.active.as_ref().is_some_and(|a| a.id == id) {
            if let Some(active) = registry.active.take() {
                registry.last_finished = Some(active.snapshot(status));
            }
        }

        match result {
            Ok(outcome) => tracing::info!(
                session_id = %id,
                status = %outcome.status,
                iterations = outcome.iterations,
                "Session finished"
            ),
            Err(e) => tracing::warn!(session_id = %id, "Session failed: {}", e),
        }
    }
}

/// Counts delivered iterations before forwarding.
struct CountingSink {
    inner: Arc<dyn ProgressSink>,
    iterations: Arc<AtomicUsize>,
}

impl ProgressSink for CountingSink {
    fn deliver(&self, event: &ProgressEvent) -> AppResult<()> {
        self.iterations.store(event.iteration, Ordering::SeqCst);
        emit(self.inner.as_ref(), event);
        Ok(())
    }
}
