// Copyright 2024 The Tessera Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use super::{CancelReason, Disposition, IllegalStateError, Outcome};
use crate::interface::BackendError;

type DoneCallback<T> = Box<dyn FnOnce(&Outcome<T>) + Send>;
type CancelHook = Box<dyn FnOnce(CancelReason) + Send>;

enum State<T> {
    Pending {
        callbacks: Vec<DoneCallback<T>>,
        wakers: Vec<Waker>,
        cancel_hooks: Vec<CancelHook>,
    },
    Done(Arc<Outcome<T>>),
}

struct Shared<T> {
    state: Mutex<State<T>>,
}

impl<T> Shared<T> {
    fn pending() -> Self {
        Shared {
            state: Mutex::new(State::Pending {
                callbacks: Vec::new(),
                wakers: Vec::new(),
                cancel_hooks: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Performs the single terminal transition. Callbacks, cancel hooks and
    /// wakers are drained under the lock but invoked outside of it, so a
    /// callback may safely touch the future again.
    fn transition(&self, outcome: Outcome<T>) -> Result<(), IllegalStateError> {
        let (outcome, callbacks, wakers, cancel_hooks) = {
            let mut state = self.lock();
            match &mut *state {
                State::Done(existing) => {
                    return Err(IllegalStateError {
                        existing: existing.disposition(),
                        attempted: outcome.disposition(),
                    });
                }
                State::Pending {
                    callbacks,
                    wakers,
                    cancel_hooks,
                } => {
                    let callbacks = std::mem::take(callbacks);
                    let wakers = std::mem::take(wakers);
                    let cancel_hooks = std::mem::take(cancel_hooks);
                    let outcome = Arc::new(outcome);
                    *state = State::Done(outcome.clone());
                    (outcome, callbacks, wakers, cancel_hooks)
                }
            }
        };

        if let Outcome::Cancelled(reason) = outcome.as_ref() {
            for hook in cancel_hooks {
                hook(*reason);
            }
        }
        for callback in callbacks {
            callback(outcome.as_ref());
        }
        for waker in wakers {
            waker.wake();
        }
        Ok(())
    }
}

/// Consumer handle of a deferred single-value result.
///
/// Cloning shares the same underlying completion; any number of consumers may
/// register [`on_done`](OpFuture::on_done) callbacks or await the future.
pub struct OpFuture<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for OpFuture<T> {
    fn clone(&self) -> Self {
        OpFuture {
            shared: self.shared.clone(),
        }
    }
}

/// Producer handle of an [`OpFuture`]. Exactly one terminal transition is
/// permitted; dropping the completer without transitioning fails the future
/// with [`BackendError::Aborted`].
pub struct Completer<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Completer<T> {
    pub fn resolve(&self, value: T) -> Result<(), IllegalStateError> {
        self.shared.transition(Outcome::Resolved(value))
    }

    pub fn fail(&self, error: BackendError) -> Result<(), IllegalStateError> {
        self.shared.transition(Outcome::Failed(error))
    }

    pub fn cancel(&self, reason: CancelReason) -> Result<(), IllegalStateError> {
        self.shared.transition(Outcome::Cancelled(reason))
    }

    /// Completes with an already-built outcome, preserving its disposition.
    pub fn complete(&self, outcome: Outcome<T>) -> Result<(), IllegalStateError> {
        self.shared.transition(outcome)
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        // Only takes effect when the producer never transitioned.
        let _ = self.shared.transition(Outcome::Failed(BackendError::Aborted));
    }
}

impl<T> OpFuture<T> {
    /// Creates a pending future together with its unique producer handle.
    pub fn pending() -> (Completer<T>, OpFuture<T>) {
        let shared = Arc::new(Shared::pending());
        (
            Completer {
                shared: shared.clone(),
            },
            OpFuture { shared },
        )
    }

    pub fn resolved(value: T) -> OpFuture<T> {
        OpFuture {
            shared: Arc::new(Shared {
                state: Mutex::new(State::Done(Arc::new(Outcome::Resolved(value)))),
            }),
        }
    }

    pub fn failed(error: BackendError) -> OpFuture<T> {
        OpFuture {
            shared: Arc::new(Shared {
                state: Mutex::new(State::Done(Arc::new(Outcome::Failed(error)))),
            }),
        }
    }

    pub fn cancelled(reason: CancelReason) -> OpFuture<T> {
        OpFuture {
            shared: Arc::new(Shared {
                state: Mutex::new(State::Done(Arc::new(Outcome::Cancelled(reason)))),
            }),
        }
    }

    /// Registers a completion callback.
    ///
    /// Callbacks registered while pending fire in registration order during
    /// the terminal transition. Registering on an already-completed future
    /// invokes the callback inline, synchronously, with the known outcome.
    pub fn on_done<F>(&self, callback: F)
    where
        F: FnOnce(&Outcome<T>) + Send + 'static,
    {
        let fire_now = {
            let mut state = self.shared.lock();
            match &mut *state {
                State::Pending { callbacks, .. } => {
                    callbacks.push(Box::new(callback));
                    None
                }
                State::Done(outcome) => Some((callback, outcome.clone())),
            }
        };
        if let Some((callback, outcome)) = fire_now {
            callback(outcome.as_ref());
        }
    }

    /// Registers a hook that runs only if the future ends up cancelled, used
    /// by producers to tear down in-flight work. Fires inline when the future
    /// is already cancelled.
    pub fn on_cancelled<F>(&self, hook: F)
    where
        F: FnOnce(CancelReason) + Send + 'static,
    {
        let fire_now = {
            let mut state = self.shared.lock();
            match &mut *state {
                State::Pending { cancel_hooks, .. } => {
                    cancel_hooks.push(Box::new(hook));
                    None
                }
                State::Done(outcome) => match outcome.as_ref() {
                    Outcome::Cancelled(reason) => Some((hook, *reason)),
                    _ => None,
                },
            }
        };
        if let Some((hook, reason)) = fire_now {
            hook(reason);
        }
    }

    /// Consumer-initiated best-effort cancellation. Returns whether the
    /// cancellation took effect; a future that already reached a terminal
    /// state is left untouched.
    pub fn cancel(&self, reason: CancelReason) -> bool {
        self.shared.transition(Outcome::Cancelled(reason)).is_ok()
    }

    /// Terminal disposition, if the future has completed.
    pub fn disposition(&self) -> Option<Disposition> {
        match &*self.shared.lock() {
            State::Pending { .. } => None,
            State::Done(outcome) => Some(outcome.disposition()),
        }
    }

    pub fn is_done(&self) -> bool {
        self.disposition().is_some()
    }
}

impl<T> OpFuture<T>
where
    T: Send + Sync + 'static,
{
    /// Bridges a task to a future: the task's result resolves or fails the
    /// future, and cancelling the future aborts the task. A result produced
    /// after cancellation is discarded (the backend ran to completion but
    /// nobody is listening anymore).
    pub fn spawn<Fut>(fut: Fut) -> OpFuture<T>
    where
        Fut: Future<Output = Result<T, BackendError>> + Send + 'static,
    {
        Self::spawn_outcome(async move {
            match fut.await {
                Ok(value) => Outcome::Resolved(value),
                Err(error) => Outcome::Failed(error),
            }
        })
    }

    /// Like [`spawn`](OpFuture::spawn) for producers that need to surface
    /// cancellation as a first-class outcome.
    pub fn spawn_outcome<Fut>(fut: Fut) -> OpFuture<T>
    where
        Fut: Future<Output = Outcome<T>> + Send + 'static,
    {
        let (completer, op) = Self::pending();
        let handle = tokio::spawn(async move {
            let attempted = completer.complete(fut.await);
            if let Err(state) = attempted {
                log::debug!("discarding task outcome, future already {}", state.existing);
            }
        });
        let abort = handle.abort_handle();
        op.on_cancelled(move |_| abort.abort());
        op
    }
}

impl<T> OpFuture<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Derives a future whose value is `transform` applied to this future's
    /// resolved value. `transform` is never invoked for a failed or cancelled
    /// upstream; both propagate as-is. An `Err` from `transform` fails the
    /// derived future. Cancelling the derived future does not reach back into
    /// the upstream producer.
    pub fn transform<U, F>(&self, transform: F) -> OpFuture<U>
    where
        U: Send + Sync + 'static,
        F: FnOnce(T) -> Result<U, BackendError> + Send + 'static,
    {
        let (completer, derived) = OpFuture::pending();
        self.on_done(move |outcome| {
            let attempted = match outcome {
                Outcome::Resolved(value) => match transform(value.clone()) {
                    Ok(mapped) => completer.resolve(mapped),
                    Err(error) => completer.fail(error),
                },
                Outcome::Failed(error) => completer.fail(error.clone()),
                Outcome::Cancelled(reason) => completer.cancel(*reason),
            };
            if attempted.is_err() {
                // The derived future was cancelled independently.
                log::debug!("dropping upstream outcome for a cancelled derived future");
            }
        });
        derived
    }

    /// Derives a future that fails with [`BackendError::Timeout`] when this
    /// future has not completed within `duration`. On timeout the upstream is
    /// cancelled best-effort as superseded.
    pub fn with_timeout(&self, duration: Duration) -> OpFuture<T> {
        let (completer, derived) = OpFuture::pending();
        let completer = Arc::new(completer);

        let on_upstream_done = completer.clone();
        self.on_done(move |outcome| {
            let _ = on_upstream_done.complete(outcome.clone());
        });

        let upstream = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            if completer.fail(BackendError::Timeout).is_ok() {
                upstream.cancel(CancelReason::Superseded);
            }
        });

        derived
    }
}

impl<T: Clone> Future for OpFuture<T> {
    type Output = Outcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.shared.lock();
        match &mut *state {
            State::Done(outcome) => Poll::Ready(outcome.as_ref().clone()),
            State::Pending { wakers, .. } => {
                if !wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}
