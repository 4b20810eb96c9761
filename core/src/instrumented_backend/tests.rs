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

use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::InstrumentedMetadataBackend;
use crate::completion::{CancelReason, Completer, OpFuture, OpObservable, Outcome};
use crate::interface::{BackendError, MetadataBackend};
use crate::models::{
    CountSeriesResult, DeleteSeriesResult, EntriesRequest, Entry, FindKeysResult, FindRequest,
    FindSeriesIdsResult, FindSeriesResult, FindTagsResult, Groups, Series, WriteRequest,
    WriteResult,
};
use crate::stats::{MetadataBackendReporter, MetricRegistry};

/// Delegate whose writes stay pending until the test completes them.
#[derive(Default)]
struct HeldWrites {
    completers: Mutex<Vec<Completer<WriteResult>>>,
}

impl HeldWrites {
    fn complete_next(&self, outcome: Outcome<WriteResult>) {
        let completer = self.completers.lock().unwrap().remove(0);
        completer.complete(outcome).unwrap();
    }
}

impl MetadataBackend for HeldWrites {
    fn write(&self, _request: WriteRequest) -> OpFuture<WriteResult> {
        let (completer, fut) = OpFuture::pending();
        self.completers.lock().unwrap().push(completer);
        fut
    }

    fn find_tags(&self, _request: FindRequest) -> OpFuture<FindTagsResult> {
        OpFuture::resolved(FindTagsResult::default())
    }

    fn find_series(&self, _request: FindRequest) -> OpFuture<FindSeriesResult> {
        OpFuture::failed(BackendError::failure("down"))
    }

    fn find_series_stream(&self, _request: FindRequest) -> OpObservable<Series> {
        OpObservable::completed()
    }

    fn find_series_ids(&self, _request: FindRequest) -> OpFuture<FindSeriesIdsResult> {
        OpFuture::resolved(FindSeriesIdsResult::default())
    }

    fn count_series(&self, _request: FindRequest) -> OpFuture<CountSeriesResult> {
        OpFuture::resolved(CountSeriesResult::of(0))
    }

    fn delete_series(&self, _request: FindRequest) -> OpFuture<DeleteSeriesResult> {
        OpFuture::resolved(DeleteSeriesResult::default())
    }

    fn find_keys(&self, _request: FindRequest) -> OpFuture<FindKeysResult> {
        OpFuture::resolved(FindKeysResult::default())
    }

    fn entries(&self, _request: EntriesRequest) -> OpObservable<Entry> {
        OpObservable::completed()
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn groups(&self) -> Groups {
        Groups::of(["held"])
    }
}

fn instrumented() -> (
    Arc<HeldWrites>,
    Arc<MetadataBackendReporter>,
    InstrumentedMetadataBackend,
) {
    let delegate = Arc::new(HeldWrites::default());
    let registry = MetricRegistry::new();
    let reporter = Arc::new(MetadataBackendReporter::new(&registry, "held"));
    let backend = InstrumentedMetadataBackend::new(delegate.clone(), reporter.clone());
    (delegate, reporter, backend)
}

fn write_request() -> WriteRequest {
    WriteRequest::new(Series::new("cpu"), vec![])
}

#[tokio::test]
async fn a_resolved_write_marks_the_resolve_rate_and_latency() {
    let (delegate, reporter, backend) = instrumented();

    let fut = backend.write(write_request());
    tokio::time::sleep(Duration::from_millis(25)).await;
    delegate.complete_next(Outcome::Resolved(WriteResult::of(1)));

    assert_eq!(fut.await, Outcome::Resolved(WriteResult::of(1)));
    assert_eq!(reporter.write.resolved_count(), 1);
    assert_eq!(reporter.write.failed_count(), 0);
    assert_eq!(reporter.write.cancelled_count(), 0);
    assert_eq!(reporter.write.latency().count(), 1);
    assert!(reporter.write.latency().max() >= Duration::from_millis(20));
}

#[tokio::test]
async fn a_failed_write_marks_only_the_failure_rate() {
    let (delegate, reporter, backend) = instrumented();

    let fut = backend.write(write_request());
    delegate.complete_next(Outcome::Failed(BackendError::failure("disk full")));

    assert_eq!(
        fut.await,
        Outcome::Failed(BackendError::failure("disk full"))
    );
    assert_eq!(reporter.write.failed_count(), 1);
    assert_eq!(reporter.write.resolved_count(), 0);
    assert_eq!(reporter.write.latency().count(), 1);
}

#[tokio::test]
async fn a_cancelled_write_marks_only_the_cancel_rate() {
    let (_delegate, reporter, backend) = instrumented();

    let fut = backend.write(write_request());
    assert!(fut.cancel(CancelReason::Shutdown));

    assert_eq!(fut.await, Outcome::Cancelled(CancelReason::Shutdown));
    assert_eq!(reporter.write.cancelled_count(), 1);
    assert_eq!(reporter.write.resolved_count(), 0);
    assert_eq!(reporter.write.failed_count(), 0);
}

#[tokio::test]
async fn delegate_outcomes_pass_through_untouched() {
    let (_delegate, reporter, backend) = instrumented();

    let tags = backend.find_tags(FindRequest::all()).await;
    assert_eq!(tags, Outcome::Resolved(FindTagsResult::default()));
    assert_eq!(reporter.find_tags.resolved_count(), 1);

    let series = backend.find_series(FindRequest::all()).await;
    assert_eq!(series, Outcome::Failed(BackendError::failure("down")));
    assert_eq!(reporter.find_series.failed_count(), 1);

    assert!(backend.is_ready());
    assert!(backend.groups().contains("held"));
}

#[tokio::test]
async fn stream_operations_mark_their_meters() {
    let (_delegate, reporter, backend) = instrumented();

    let _ = backend.entries(EntriesRequest::all());
    let _ = backend.entries(EntriesRequest::all());
    let _ = backend.find_series_stream(FindRequest::all());

    assert_eq!(reporter.entries.value(), 2);
    assert_eq!(reporter.find_series_stream.value(), 1);
}

#[tokio::test]
async fn each_operation_reports_into_its_own_instruments() {
    let (_delegate, reporter, backend) = instrumented();

    backend.find_series_ids(FindRequest::all()).await;
    backend.count_series(FindRequest::all()).await;
    backend.delete_series(FindRequest::all()).await;
    backend.find_keys(FindRequest::all()).await;

    assert_eq!(reporter.find_series_ids.resolved_count(), 1);
    assert_eq!(reporter.count_series.resolved_count(), 1);
    assert_eq!(reporter.delete_series.resolved_count(), 1);
    assert_eq!(reporter.find_keys.resolved_count(), 1);
    assert_eq!(reporter.write.resolved_count(), 0);
}
