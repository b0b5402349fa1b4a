//! Single-flight guard for user-triggered flow calls.
//!
//! A screen that offers "Find Best Matches" or "Assess Needs" must not send
//! a second request while one is pending, and must ignore a reply that
//! arrives after the user moved on. [`InvocationTrigger`] models that:
//!
//! ```text
//! Idle ──fire──► Requesting ──► Succeeded | DegradedSucceeded | Failed
//!   ▲                │                          │
//!   ├── discard ─────┤                          │
//!   ├── cancelled ───┘                          │
//!   └──────────────── acknowledge ──────────────┘
//! ```
//!
//! The three finished states keep the trigger enabled: `fire` is accepted
//! from any of them, so they behave as idle with the last result attached.
//! [`InvocationTrigger::acknowledge`] clears that result.
//!
//! Discarding does not abort the network call. The reply is dropped when it
//! arrives because its generation is no longer current. Dropping a pending
//! `fire` future (task aborted, `select!` lost, timeout) releases the
//! trigger the same way.

use crate::error::Result;
use crate::flow::FlowOutcome;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvocationState {
    #[default]
    Idle,
    Requesting,
    Succeeded,
    /// The result is the canned fallback.
    DegradedSucceeded,
    Failed,
}

/// What happened to one `fire`.
#[derive(Debug)]
pub enum Fired<T> {
    /// The call ran and its result is current.
    Done(Result<FlowOutcome<T>>),
    /// Another call was in flight. Nothing was sent.
    Busy,
    /// The call finished after [`InvocationTrigger::discard`]; its result was dropped.
    Stale,
}

#[derive(Debug, Default)]
struct Inner {
    state: InvocationState,
    in_flight: bool,
    generation: u64,
}

/// Allows at most one pending invocation at a time.
#[derive(Debug, Default)]
pub struct InvocationTrigger {
    inner: Mutex<Inner>,
}

impl InvocationTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> InvocationState {
        self.lock().state
    }

    /// Whether `fire` would send a request right now.
    pub fn is_enabled(&self) -> bool {
        !self.lock().in_flight
    }

    /// Run `call` unless another invocation is pending.
    ///
    /// `call` is not polled when the trigger is busy, so a flow future passed
    /// here never reaches the backend in that case.
    pub async fn fire<T, Fut>(&self, call: Fut) -> Fired<T>
    where
        Fut: Future<Output = Result<FlowOutcome<T>>>,
    {
        let pending = {
            let mut inner = self.lock();
            if inner.in_flight {
                tracing::debug!("invocation already in flight, ignoring trigger");
                return Fired::Busy;
            }
            inner.in_flight = true;
            inner.state = InvocationState::Requesting;
            Pending {
                trigger: self,
                generation: inner.generation,
                settled: false,
            }
        };

        let result = call.await;
        pending.settle(result)
    }

    /// Return a finished trigger to `Idle`, dropping the record of the last
    /// outcome. No-op while a call is in flight.
    pub fn acknowledge(&self) {
        let mut inner = self.lock();
        if !inner.in_flight {
            inner.state = InvocationState::Idle;
        }
    }

    /// Forget the pending invocation, if any, and return to `Idle`.
    ///
    /// A reply that arrives later is reported as [`Fired::Stale`].
    pub fn discard(&self) {
        let mut inner = self.lock();
        inner.generation = inner.generation.wrapping_add(1);
        inner.in_flight = false;
        inner.state = InvocationState::Idle;
    }
}

/// Marks one `fire` as in flight until it settles or is dropped.
struct Pending<'a> {
    trigger: &'a InvocationTrigger,
    generation: u64,
    settled: bool,
}

impl Pending<'_> {
    fn settle<T>(mut self, result: Result<FlowOutcome<T>>) -> Fired<T> {
        self.settled = true;
        let mut inner = self.trigger.lock();
        if inner.generation != self.generation {
            tracing::debug!(generation = self.generation, "dropping reply from a discarded invocation");
            return Fired::Stale;
        }
        inner.in_flight = false;
        inner.state = match &result {
            Ok(outcome) if outcome.is_degraded() => InvocationState::DegradedSucceeded,
            Ok(_) => InvocationState::Succeeded,
            Err(_) => InvocationState::Failed,
        };
        Fired::Done(result)
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut inner = self.trigger.lock();
        if inner.generation == self.generation {
            tracing::debug!(generation = self.generation, "invocation cancelled before it settled");
            inner.in_flight = false;
            inner.state = InvocationState::Idle;
        }
    }
}
