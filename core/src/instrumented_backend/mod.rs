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

#[cfg(test)]
mod tests;

use std::sync::Arc;

use crate::completion::{OpFuture, OpObservable};
use crate::interface::MetadataBackend;
use crate::models::{
    CountSeriesResult, DeleteSeriesResult, EntriesRequest, Entry, FindKeysResult, FindRequest,
    FindSeriesIdsResult, FindSeriesResult, FindTagsResult, Groups, Series, Statistics,
    WriteRequest, WriteResult,
};
use crate::stats::MetadataBackendReporter;

/// Purely-observational decorator: records latency and terminal disposition
/// of every operation without altering the delegate's result, error,
/// cancellation or delivery order.
pub struct InstrumentedMetadataBackend {
    delegate: Arc<dyn MetadataBackend>,
    reporter: Arc<MetadataBackendReporter>,
}

impl InstrumentedMetadataBackend {
    pub fn new(
        delegate: Arc<dyn MetadataBackend>,
        reporter: Arc<MetadataBackendReporter>,
    ) -> Self {
        InstrumentedMetadataBackend { delegate, reporter }
    }
}

impl MetadataBackend for InstrumentedMetadataBackend {
    fn write(&self, request: WriteRequest) -> OpFuture<WriteResult> {
        let context = self.reporter.write.setup();
        let fut = self.delegate.write(request);
        fut.on_done(move |outcome| context.report(outcome.disposition()));
        fut
    }

    fn find_tags(&self, request: FindRequest) -> OpFuture<FindTagsResult> {
        let context = self.reporter.find_tags.setup();
        let fut = self.delegate.find_tags(request);
        fut.on_done(move |outcome| context.report(outcome.disposition()));
        fut
    }

    fn find_series(&self, request: FindRequest) -> OpFuture<FindSeriesResult> {
        let context = self.reporter.find_series.setup();
        let fut = self.delegate.find_series(request);
        fut.on_done(move |outcome| context.report(outcome.disposition()));
        fut
    }

    fn find_series_stream(&self, request: FindRequest) -> OpObservable<Series> {
        self.reporter.find_series_stream.mark();
        self.delegate.find_series_stream(request)
    }

    fn find_series_ids(&self, request: FindRequest) -> OpFuture<FindSeriesIdsResult> {
        let context = self.reporter.find_series_ids.setup();
        let fut = self.delegate.find_series_ids(request);
        fut.on_done(move |outcome| context.report(outcome.disposition()));
        fut
    }

    fn count_series(&self, request: FindRequest) -> OpFuture<CountSeriesResult> {
        let context = self.reporter.count_series.setup();
        let fut = self.delegate.count_series(request);
        fut.on_done(move |outcome| context.report(outcome.disposition()));
        fut
    }

    fn delete_series(&self, request: FindRequest) -> OpFuture<DeleteSeriesResult> {
        let context = self.reporter.delete_series.setup();
        let fut = self.delegate.delete_series(request);
        fut.on_done(move |outcome| context.report(outcome.disposition()));
        fut
    }

    fn find_keys(&self, request: FindRequest) -> OpFuture<FindKeysResult> {
        let context = self.reporter.find_keys.setup();
        let fut = self.delegate.find_keys(request);
        fut.on_done(move |outcome| context.report(outcome.disposition()));
        fut
    }

    fn entries(&self, request: EntriesRequest) -> OpObservable<Entry> {
        self.reporter.entries.mark();
        self.delegate.entries(request)
    }

    fn is_ready(&self) -> bool {
        self.delegate.is_ready()
    }

    fn groups(&self) -> Groups {
        self.delegate.groups()
    }

    fn statistics(&self) -> Statistics {
        self.delegate.statistics()
    }
}
