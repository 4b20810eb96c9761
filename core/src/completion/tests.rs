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

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::StreamExt;

use super::{CancelReason, Disposition, OpFuture, OpObservable, Outcome};
use crate::interface::BackendError;

#[tokio::test]
async fn resolve_delivers_value_to_every_consumer() {
    let (completer, fut) = OpFuture::pending();
    let other = fut.clone();

    completer.resolve(7).unwrap();

    assert_eq!(fut.clone().await, Outcome::Resolved(7));
    assert_eq!(other.await, Outcome::Resolved(7));
    assert_eq!(fut.disposition(), Some(Disposition::Resolved));
}

#[tokio::test]
async fn second_transition_is_rejected() {
    let (completer, fut) = OpFuture::pending();
    completer.resolve(1).unwrap();

    let rejected = completer.fail(BackendError::failure("late")).unwrap_err();
    assert_eq!(rejected.existing, Disposition::Resolved);
    assert_eq!(rejected.attempted, Disposition::Failed);

    assert_eq!(fut.await, Outcome::Resolved(1));
}

#[tokio::test]
async fn callbacks_fire_in_registration_order() {
    let (completer, fut) = OpFuture::pending();
    let order = Arc::new(Mutex::new(Vec::new()));

    for i in 0..3 {
        let order = order.clone();
        fut.on_done(move |_: &Outcome<u32>| order.lock().unwrap().push(i));
    }
    completer.resolve(0).unwrap();

    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
}

#[tokio::test]
async fn late_callback_fires_inline() {
    let fut = OpFuture::resolved(42);
    let fired = Arc::new(AtomicBool::new(false));

    let flag = fired.clone();
    fut.on_done(move |outcome| {
        assert_eq!(*outcome, Outcome::Resolved(42));
        flag.store(true, Ordering::SeqCst);
    });

    // No await in between: registration on a completed future is synchronous.
    assert!(fired.load(Ordering::SeqCst));
}

#[tokio::test]
async fn dropped_completer_fails_with_aborted() {
    let (completer, fut) = OpFuture::<u32>::pending();
    drop(completer);

    assert_eq!(fut.await, Outcome::Failed(BackendError::Aborted));
}

#[tokio::test]
async fn cancel_fires_hooks_and_wins_only_once() {
    let (completer, fut) = OpFuture::<u32>::pending();
    let seen = Arc::new(Mutex::new(None));

    let hook_seen = seen.clone();
    fut.on_cancelled(move |reason| {
        *hook_seen.lock().unwrap() = Some(reason);
    });

    assert!(fut.cancel(CancelReason::CallerRequested));
    assert!(!fut.cancel(CancelReason::Shutdown));
    assert_eq!(*seen.lock().unwrap(), Some(CancelReason::CallerRequested));

    // The producer races the cancellation and loses.
    let rejected = completer.resolve(1).unwrap_err();
    assert_eq!(rejected.existing, Disposition::Cancelled);

    assert_eq!(
        fut.await,
        Outcome::Cancelled(CancelReason::CallerRequested)
    );
}

#[tokio::test]
async fn cancel_hook_on_already_cancelled_future_fires_inline() {
    let fut = OpFuture::<u32>::cancelled(CancelReason::Shutdown);
    let seen = Arc::new(Mutex::new(None));

    let hook_seen = seen.clone();
    fut.on_cancelled(move |reason| {
        *hook_seen.lock().unwrap() = Some(reason);
    });

    assert_eq!(*seen.lock().unwrap(), Some(CancelReason::Shutdown));
}

#[tokio::test]
async fn cancel_hooks_do_not_fire_on_resolve() {
    let (completer, fut) = OpFuture::pending();
    let fired = Arc::new(AtomicBool::new(false));

    let flag = fired.clone();
    fut.on_cancelled(move |_| flag.store(true, Ordering::SeqCst));
    completer.resolve(5).unwrap();

    assert!(!fired.load(Ordering::SeqCst));
    assert!(!fut.cancel(CancelReason::CallerRequested));
    assert!(!fired.load(Ordering::SeqCst));
}

#[tokio::test]
async fn spawn_resolves_with_task_result() {
    let fut = OpFuture::spawn(async { Ok(11) });
    assert_eq!(fut.await, Outcome::Resolved(11));
}

#[tokio::test]
async fn spawn_surfaces_task_error() {
    let fut = OpFuture::<u32>::spawn(async { Err(BackendError::failure("boom")) });
    assert_eq!(
        fut.await,
        Outcome::Failed(BackendError::failure("boom"))
    );
}

#[tokio::test]
async fn cancelling_a_spawned_future_aborts_the_task() {
    let completed = Arc::new(AtomicBool::new(false));
    let task_flag = completed.clone();

    let fut = OpFuture::spawn(async move {
        tokio::time::sleep(Duration::from_secs(60)).await;
        task_flag.store(true, Ordering::SeqCst);
        Ok(1)
    });

    assert!(fut.cancel(CancelReason::CallerRequested));
    assert_eq!(
        fut.await,
        Outcome::Cancelled(CancelReason::CallerRequested)
    );
    assert!(!completed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn transform_maps_resolved_values() {
    let (completer, fut) = OpFuture::pending();
    let doubled = fut.transform(|value: u32| Ok(value * 2));

    completer.resolve(21).unwrap();
    assert_eq!(doubled.await, Outcome::Resolved(42));
}

#[tokio::test]
async fn transform_is_skipped_on_failure_and_cancellation() {
    let invoked = Arc::new(AtomicU64::new(0));

    let (completer, fut) = OpFuture::<u32>::pending();
    let count = invoked.clone();
    let derived = fut.transform(move |value| {
        count.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    });
    completer.fail(BackendError::failure("down")).unwrap();
    assert_eq!(derived.await, Outcome::Failed(BackendError::failure("down")));

    let (completer, fut) = OpFuture::<u32>::pending();
    let count = invoked.clone();
    let derived = fut.transform(move |value| {
        count.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    });
    completer.cancel(CancelReason::Superseded).unwrap();
    assert_eq!(derived.await, Outcome::Cancelled(CancelReason::Superseded));

    assert_eq!(invoked.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn transform_error_fails_the_derived_future() {
    let fut = OpFuture::resolved(3);
    let derived = fut.transform(|_: u32| Err::<u32, _>(BackendError::failure("reject")));
    assert_eq!(
        derived.await,
        Outcome::Failed(BackendError::failure("reject"))
    );
}

#[tokio::test]
async fn timeout_fails_the_derived_and_cancels_the_upstream() {
    let (_completer, fut) = OpFuture::<u32>::pending();
    let bounded = fut.with_timeout(Duration::from_millis(20));

    assert_eq!(bounded.await, Outcome::Failed(BackendError::Timeout));

    // Upstream was cancelled best-effort as superseded.
    assert_eq!(
        fut.await,
        Outcome::Cancelled(CancelReason::Superseded)
    );
}

#[tokio::test]
async fn timeout_passes_through_a_timely_result() {
    let (completer, fut) = OpFuture::pending();
    let bounded = fut.with_timeout(Duration::from_secs(60));

    completer.resolve(9).unwrap();
    assert_eq!(bounded.await, Outcome::Resolved(9));
    assert_eq!(fut.disposition(), Some(Disposition::Resolved));
}

#[tokio::test]
async fn observable_preserves_production_order() {
    let (emitter, mut observable) = OpObservable::pending();

    emitter.next(1).unwrap();
    emitter.next(2).unwrap();
    emitter.next(3).unwrap();
    emitter.complete();

    assert_eq!(observable.next().await, Some(Ok(1)));
    assert_eq!(observable.next().await, Some(Ok(2)));
    assert_eq!(observable.next().await, Some(Ok(3)));
    assert_eq!(observable.next().await, None);
}

#[tokio::test]
async fn observable_failure_terminates_after_buffered_items() {
    let (emitter, mut observable) = OpObservable::pending();

    emitter.next(1).unwrap();
    emitter.fail(BackendError::failure("mid-stream"));

    assert_eq!(observable.next().await, Some(Ok(1)));
    assert_eq!(
        observable.next().await,
        Some(Err(BackendError::failure("mid-stream")))
    );
    assert_eq!(observable.next().await, None);
}

#[tokio::test]
async fn dropped_producer_surfaces_as_aborted() {
    let (emitter, mut observable) = OpObservable::pending();
    emitter.next(1).unwrap();
    drop(emitter);

    assert_eq!(observable.next().await, Some(Ok(1)));
    assert_eq!(observable.next().await, Some(Err(BackendError::Aborted)));
    assert_eq!(observable.next().await, None);
}

#[tokio::test]
async fn consumer_cancellation_closes_the_sink() {
    let (emitter, mut observable) = OpObservable::pending();
    emitter.next(1).unwrap();

    observable.cancel();

    assert!(emitter.is_cancelled());
    assert!(emitter.next(2).is_err());
    assert_eq!(observable.next().await, None);
}

#[tokio::test]
async fn spawned_producer_completes_the_stream() {
    let mut observable = OpObservable::spawn(|sink| async move {
        for i in 0..3 {
            if sink.next(i).is_err() {
                return Ok(());
            }
        }
        Ok(())
    });

    let mut items = Vec::new();
    while let Some(item) = observable.next().await {
        items.push(item.unwrap());
    }
    assert_eq!(items, vec![0, 1, 2]);
}

#[tokio::test]
async fn spawned_producer_failure_ends_the_stream_with_an_error() {
    let mut observable = OpObservable::<u32>::spawn(|sink| async move {
        let _ = sink.next(1);
        Err(BackendError::failure("scan failed"))
    });

    assert_eq!(observable.next().await, Some(Ok(1)));
    assert_eq!(
        observable.next().await,
        Some(Err(BackendError::failure("scan failed")))
    );
    assert_eq!(observable.next().await, None);
}

#[tokio::test]
async fn into_result_folds_cancellation_into_the_error_taxonomy() {
    let resolved: Outcome<u32> = Outcome::Resolved(1);
    assert_eq!(resolved.into_result().unwrap(), 1);

    let cancelled: Outcome<u32> = Outcome::Cancelled(CancelReason::Shutdown);
    assert_eq!(
        cancelled.into_result().unwrap_err(),
        BackendError::Cancelled(CancelReason::Shutdown)
    );
}
