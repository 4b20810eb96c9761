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

use crate::completion::{OpFuture, OpObservable};
use crate::models::{
    CountSeriesResult, DeleteSeriesResult, EntriesRequest, Entry, FindKeysResult, FindRequest,
    FindSeriesIdsResult, FindSeriesResult, FindTagsResult, Groups, Series, Statistics,
    WriteRequest, WriteResult,
};

/// Capability surface every concrete metadata backend implements.
///
/// Every operation returns a deferred completion; backends issue work
/// immediately and never block the calling task. All operations are
/// idempotent with respect to caller retries except [`write`], which is
/// at-most-once per call — retrying is the caller's responsibility and may
/// duplicate writes.
///
/// [`write`]: MetadataBackend::write
pub trait MetadataBackend: Send + Sync {
    fn write(&self, request: WriteRequest) -> OpFuture<WriteResult>;

    fn find_tags(&self, request: FindRequest) -> OpFuture<FindTagsResult>;

    fn find_series(&self, request: FindRequest) -> OpFuture<FindSeriesResult>;

    /// Streaming variant of [`find_series`](MetadataBackend::find_series) for
    /// result sets too large to buffer.
    fn find_series_stream(&self, request: FindRequest) -> OpObservable<Series>;

    fn find_series_ids(&self, request: FindRequest) -> OpFuture<FindSeriesIdsResult>;

    fn count_series(&self, request: FindRequest) -> OpFuture<CountSeriesResult>;

    fn delete_series(&self, request: FindRequest) -> OpFuture<DeleteSeriesResult>;

    fn find_keys(&self, request: FindRequest) -> OpFuture<FindKeysResult>;

    /// Scans raw stored entries matching the request.
    fn entries(&self, request: EntriesRequest) -> OpObservable<Entry>;

    /// Readiness is refreshed by the backend itself; a backend that reports
    /// `false` is skipped by the aggregator and recorded as not ready.
    fn is_ready(&self) -> bool;

    /// Routing tags used to scope operations to a subset of backends.
    fn groups(&self) -> Groups;

    /// Backend-local health counters, merged into aggregate statistics for
    /// every operation this backend resolves.
    fn statistics(&self) -> Statistics {
        Statistics::default()
    }
}
