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

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::registry::{Counter, DurationHistogram, MetricId, MetricRegistry};
use super::units;
use crate::completion::Disposition;

/// Per-operation completion instruments: one counter per terminal
/// disposition plus a latency histogram.
pub struct OperationReporter {
    resolved: Arc<Counter>,
    failed: Arc<Counter>,
    cancelled: Arc<Counter>,
    latency: Arc<DurationHistogram>,
}

impl OperationReporter {
    pub fn new(registry: &MetricRegistry, id: MetricId) -> Self {
        let what = id.get("what").unwrap_or("operation").to_string();
        OperationReporter {
            latency: registry.histogram(id.clone().tagged("what", format!("{what}-latency"))),
            resolved: registry.counter(
                id.clone()
                    .tagged("what", format!("{what}-resolve-rate"))
                    .tagged("unit", units::RESOLVE),
            ),
            failed: registry.counter(
                id.clone()
                    .tagged("what", format!("{what}-failure-rate"))
                    .tagged("unit", units::FAILURE),
            ),
            cancelled: registry.counter(
                id.tagged("what", format!("{what}-cancel-rate"))
                    .tagged("unit", units::CANCEL),
            ),
        }
    }

    /// Starts a timer context; the context records the elapsed time and one
    /// disposition counter when the observed operation completes.
    pub fn setup(&self) -> ReporterContext {
        ReporterContext {
            started: Instant::now(),
            resolved: self.resolved.clone(),
            failed: self.failed.clone(),
            cancelled: self.cancelled.clone(),
            latency: self.latency.clone(),
        }
    }

    pub fn resolved_count(&self) -> u64 {
        self.resolved.value()
    }

    pub fn failed_count(&self) -> u64 {
        self.failed.value()
    }

    pub fn cancelled_count(&self) -> u64 {
        self.cancelled.value()
    }

    pub fn latency(&self) -> &DurationHistogram {
        &self.latency
    }
}

/// One in-flight observation of an operation.
pub struct ReporterContext {
    started: Instant,
    resolved: Arc<Counter>,
    failed: Arc<Counter>,
    cancelled: Arc<Counter>,
    latency: Arc<DurationHistogram>,
}

impl ReporterContext {
    /// Stops the timer and increments exactly one disposition counter.
    pub fn report(self, disposition: Disposition) {
        match disposition {
            Disposition::Resolved => self.resolved.mark(),
            Disposition::Failed => self.failed.mark(),
            Disposition::Cancelled => self.cancelled.mark(),
        }
        self.latency.record(self.started.elapsed());
    }
}

/// Every instrument the metadata backend decorators report into, built once
/// per backend from a shared registry.
pub struct MetadataBackendReporter {
    pub(crate) write: OperationReporter,
    pub(crate) find_tags: OperationReporter,
    pub(crate) find_series: OperationReporter,
    pub(crate) find_series_ids: OperationReporter,
    pub(crate) count_series: OperationReporter,
    pub(crate) delete_series: OperationReporter,
    pub(crate) find_keys: OperationReporter,

    pub(crate) entries: Arc<Counter>,
    pub(crate) find_series_stream: Arc<Counter>,

    write_success: Arc<Counter>,
    write_failure: Arc<Counter>,
    writes_dropped_by_rate_limit: Arc<Counter>,
    write_batch_duration: Arc<DurationHistogram>,
}

impl MetadataBackendReporter {
    const COMPONENT: &'static str = "metadata-backend";

    pub fn new(registry: &MetricRegistry, backend: &str) -> Self {
        let base = MetricId::build()
            .tagged("component", Self::COMPONENT)
            .tagged("backend", backend);

        let query_op = |what: &str| {
            OperationReporter::new(
                registry,
                base.clone().tagged("what", what).tagged("unit", units::QUERY),
            )
        };

        MetadataBackendReporter {
            write: OperationReporter::new(
                registry,
                base.clone().tagged("what", "write").tagged("unit", units::WRITE),
            ),
            find_tags: query_op("find-tags"),
            find_series: query_op("find-series"),
            find_series_ids: query_op("find-series-ids"),
            count_series: query_op("count-series"),
            delete_series: query_op("delete-series"),
            find_keys: query_op("find-keys"),
            entries: registry.counter(
                base.clone().tagged("what", "entries").tagged("unit", units::QUERY),
            ),
            find_series_stream: registry.counter(
                base.clone()
                    .tagged("what", "find-series-stream")
                    .tagged("unit", units::QUERY),
            ),
            write_success: registry.counter(
                base.clone()
                    .tagged("what", "write-success")
                    .tagged("unit", units::WRITE),
            ),
            write_failure: registry.counter(
                base.clone()
                    .tagged("what", "write-failure")
                    .tagged("unit", units::FAILURE),
            ),
            writes_dropped_by_rate_limit: registry.counter(
                base.clone()
                    .tagged("what", "writes-dropped-by-rate-limit")
                    .tagged("unit", units::DROP),
            ),
            write_batch_duration: registry.histogram(
                base.tagged("what", "write-batch-duration")
                    .tagged("unit", units::MILLISECOND),
            ),
        }
    }

    pub fn report_write_success(&self, entries: u64) {
        self.write_success.add(entries);
    }

    pub fn report_write_failure(&self, entries: u64) {
        self.write_failure.add(entries);
    }

    /// A dropped write counts here and only here; it never reaches the
    /// write-failure counter (see `WriteRateLimitConfig`).
    pub fn report_write_dropped_by_rate_limit(&self) {
        self.writes_dropped_by_rate_limit.mark();
    }

    pub fn report_write_batch_duration(&self, elapsed: Duration) {
        self.write_batch_duration.record(elapsed);
    }

    pub fn writes_dropped(&self) -> u64 {
        self.writes_dropped_by_rate_limit.value()
    }

    pub fn write_success_count(&self) -> u64 {
        self.write_success.value()
    }

    pub fn write_failure_count(&self) -> u64 {
        self.write_failure.value()
    }

    pub fn write_batch_durations(&self) -> &DurationHistogram {
        &self.write_batch_duration
    }
}
