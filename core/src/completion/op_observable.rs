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
use std::task::{Context, Poll};

use futures::Stream;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::interface::BackendError;

enum Signal<T> {
    Item(T),
    Completed,
    Failed(BackendError),
}

/// The consumer cancelled the observable or dropped it; the producer should
/// stop emitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("observable consumer is gone")]
pub struct SinkClosed;

/// Full producer handle of an [`OpObservable`].
///
/// Items are emitted with [`next`](Emitter::next); the terminal signal is
/// emitted by consuming the handle with [`complete`](Emitter::complete) or
/// [`fail`](Emitter::fail), so a second terminal signal (or an item after the
/// terminal) is unrepresentable.
pub struct Emitter<T> {
    tx: mpsc::UnboundedSender<Signal<T>>,
}

impl<T> Emitter<T> {
    pub fn next(&self, item: T) -> Result<(), SinkClosed> {
        self.tx.send(Signal::Item(item)).map_err(|_| SinkClosed)
    }

    pub fn complete(self) {
        let _ = self.tx.send(Signal::Completed);
    }

    pub fn fail(self, error: BackendError) {
        let _ = self.tx.send(Signal::Failed(error));
    }

    pub fn is_cancelled(&self) -> bool {
        self.tx.is_closed()
    }

    /// Item-only handle for producers that hand emission off to helpers while
    /// retaining the terminal signal themselves.
    pub fn sink(&self) -> ItemSink<T> {
        ItemSink {
            tx: self.tx.clone(),
        }
    }
}

/// Clonable item-only producer handle; cannot terminate the sequence.
pub struct ItemSink<T> {
    tx: mpsc::UnboundedSender<Signal<T>>,
}

impl<T> Clone for ItemSink<T> {
    fn clone(&self) -> Self {
        ItemSink {
            tx: self.tx.clone(),
        }
    }
}

impl<T> ItemSink<T> {
    pub fn next(&self, item: T) -> Result<(), SinkClosed> {
        self.tx.send(Signal::Item(item)).map_err(|_| SinkClosed)
    }

    pub fn is_cancelled(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of a deferred sequence: a `Stream` of items terminated by
/// completion (end of stream) or by exactly one `Err` item.
///
/// Within one observable, delivery order is exactly production order. The
/// sequence is not restartable; a new logical query creates a new observable.
pub struct OpObservable<T> {
    rx: mpsc::UnboundedReceiver<Signal<T>>,
    terminated: bool,
}

impl<T> OpObservable<T> {
    /// Creates a pending observable together with its producer handle.
    pub fn pending() -> (Emitter<T>, OpObservable<T>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Emitter { tx },
            OpObservable {
                rx,
                terminated: false,
            },
        )
    }

    /// An already-failed observable, yielding its error as the only item.
    pub fn failed(error: BackendError) -> OpObservable<T> {
        let (emitter, observable) = Self::pending();
        emitter.fail(error);
        observable
    }

    /// An empty, already-completed observable.
    pub fn completed() -> OpObservable<T> {
        let (emitter, observable) = Self::pending();
        emitter.complete();
        observable
    }

    /// Consumer-initiated cancellation: the producer observes the closed
    /// channel on its next emission and is expected to stop.
    pub fn cancel(&mut self) {
        self.rx.close();
        self.terminated = true;
    }
}

impl<T> OpObservable<T>
where
    T: Send + 'static,
{
    /// Spawns a producer task. Items go through the provided sink; the task's
    /// result emits the terminal completion or failure signal.
    pub fn spawn<F, Fut>(producer: F) -> OpObservable<T>
    where
        F: FnOnce(ItemSink<T>) -> Fut,
        Fut: Future<Output = Result<(), BackendError>> + Send + 'static,
    {
        let (emitter, observable) = Self::pending();
        let fut = producer(emitter.sink());
        tokio::spawn(async move {
            match fut.await {
                Ok(()) => emitter.complete(),
                Err(error) => emitter.fail(error),
            }
        });
        observable
    }
}

impl<T> Stream for OpObservable<T> {
    type Item = Result<T, BackendError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.terminated {
            return Poll::Ready(None);
        }
        match this.rx.poll_recv(cx) {
            Poll::Ready(Some(Signal::Item(item))) => Poll::Ready(Some(Ok(item))),
            Poll::Ready(Some(Signal::Completed)) => {
                this.terminated = true;
                this.rx.close();
                Poll::Ready(None)
            }
            Poll::Ready(Some(Signal::Failed(error))) => {
                this.terminated = true;
                this.rx.close();
                Poll::Ready(Some(Err(error)))
            }
            // Producer dropped without a terminal signal.
            Poll::Ready(None) => {
                this.terminated = true;
                Poll::Ready(Some(Err(BackendError::Aborted)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
