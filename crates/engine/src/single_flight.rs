//! Single-flight guard for expensive idempotent work.
//!
//! The slot is `Idle`, `Pending` with a shared handle every concurrent caller
//! awaits, or `Done` with the cached value. A failed attempt returns the slot to
//! `Idle` and hands the same error to each of its waiters; the next call starts
//! a fresh attempt. Each attempt carries a generation number so an attempt that
//! finishes after a [`SingleFlight::reset`] cannot overwrite the slot.

use futures::future::{BoxFuture, FutureExt, Shared};
use inquest_core::{AppError, AppResult};
use std::future::Future;
use std::sync::{Mutex, MutexGuard};

type Attempt<T> = Shared<BoxFuture<'static, AppResult<T>>>;

enum Slot<T> {
    Idle,
    Pending { generation: u64, attempt: Attempt<T> },
    Done(T),
}

struct State<T> {
    slot: Slot<T>,
    generation: u64,
}

/// Observable state of a [`SingleFlight`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightStatus {
    NotStarted,
    InProgress,
    Done,
}

/// At most one in-flight initialization, shared by all concurrent callers.
pub struct SingleFlight<T> {
    state: Mutex<State<T>>,
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                slot: Slot::Idle,
                generation: 0,
            }),
        }
    }
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, State<T>>> {
        self.state
            .lock()
            .map_err(|_| AppError::Other("Single-flight lock poisoned".to_string()))
    }

    /// Return the cached value, join the attempt in flight, or start one with
    /// `init`.
    pub async fn get_or_init<F, Fut>(&self, init: F) -> AppResult<T>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = AppResult<T>> + Send + 'static,
    {
        let (generation, attempt) = {
            let mut guard = self.lock()?;
            let state = &mut *guard;
            match &state.slot {
                Slot::Done(value) => return Ok(value.clone()),
                Slot::Pending {
                    generation,
                    attempt,
                } => (*generation, attempt.clone()),
                Slot::Idle => {
                    state.generation += 1;
                    let generation = state.generation;
                    let attempt = init().boxed().shared();
                    state.slot = Slot::Pending {
                        generation,
                        attempt: attempt.clone(),
                    };
                    tracing::debug!(generation, "Started single-flight attempt");
                    (generation, attempt)
                }
            }
        };

        let result = attempt.await;

        let mut state = self.lock()?;
        let current = matches!(
            &state.slot,
            Slot::Pending { generation: g, .. } if *g == generation
        );
        if current {
            state.slot = match &result {
                Ok(value) => Slot::Done(value.clone()),
                Err(e) => {
                    tracing::debug!(generation, "Single-flight attempt failed: {}", e);
                    Slot::Idle
                }
            };
        }

        result
    }

    /// Forget any cached value or pending attempt, returning the cached value.
    pub fn reset(&self) -> AppResult<Option<T>> {
        let mut state = self.lock()?;
        match std::mem::replace(&mut state.slot, Slot::Idle) {
            Slot::Done(value) => Ok(Some(value)),
            Slot::Idle | Slot::Pending { .. } => Ok(None),
        }
    }

    pub fn status(&self) -> AppResult<FlightStatus> {
        Ok(match self.lock()?.slot {
            Slot::Idle => FlightStatus::NotStarted,
            Slot::Pending { .. } => FlightStatus::InProgress,
            Slot::Done(_) => FlightStatus::Done,
        })
    }
}
