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

//! Write-path rate limiting.
//!
//! Unlike the instrumentation decorator this one changes caller-visible
//! behavior: a write exceeding the configured rate fails immediately with
//! [`BackendError::RateLimitExceeded`] and never reaches the delegate.


use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::completion::{OpFuture, OpObservable, Outcome};
use crate::interface::{BackendError, MetadataBackend};
use crate::models::{
    CountSeriesResult, DeleteSeriesResult, EntriesRequest, Entry, FindKeysResult, FindRequest,
    FindSeriesIdsResult, FindSeriesResult, FindTagsResult, Groups, Series, Statistics,
    WriteRequest, WriteResult,
};
use crate::stats::MetadataBackendReporter;

/// Write rate limit configuration.
///
/// A dropped write increments only the writes-dropped-by-rate-limit meter and
/// is counted at the moment the limiter refuses it; dropped writes never
/// count toward write-failure, which tracks delegate outcomes only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WriteRateLimitConfig {
    pub writes_per_second: f64,
    /// Bucket capacity; defaults to one second's worth of writes.
    #[serde(default)]
    pub burst: Option<u64>,
}

impl WriteRateLimitConfig {
    pub fn per_second(writes_per_second: f64) -> Self {
        WriteRateLimitConfig {
            writes_per_second,
            burst: None,
        }
    }

    fn build_bucket(&self) -> TokenBucket {
        let capacity = self
            .burst
            .map(|burst| burst as f64)
            .unwrap_or_else(|| self.writes_per_second.max(1.0));
        TokenBucket::new(capacity, self.writes_per_second)
    }
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket; the bucket state is the only mutable shared state here and
/// is serialized behind its mutex.
pub struct TokenBucket {
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(capacity: f64, refill_per_sec: f64) -> Self {
        TokenBucket {
            capacity,
            refill_per_sec,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Refills by elapsed time, then takes `n` tokens or refuses.
    pub fn try_acquire(&self, n: u64) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill);
        state.last_refill = now;
        state.tokens =
            (state.tokens + elapsed.as_secs_f64() * self.refill_per_sec).min(self.capacity);
        if state.tokens >= n as f64 {
            state.tokens -= n as f64;
            true
        } else {
            false
        }
    }
}

/// Write-path rate limiting decorator. Every non-write operation passes
/// through untouched.
pub struct RateLimitedMetadataBackend {
    delegate: Arc<dyn MetadataBackend>,
    bucket: TokenBucket,
    reporter: Arc<MetadataBackendReporter>,
}

impl RateLimitedMetadataBackend {
    pub fn new(
        delegate: Arc<dyn MetadataBackend>,
        config: &WriteRateLimitConfig,
        reporter: Arc<MetadataBackendReporter>,
    ) -> Self {
        RateLimitedMetadataBackend {
            delegate,
            bucket: config.build_bucket(),
            reporter,
        }
    }
}

impl MetadataBackend for RateLimitedMetadataBackend {
    fn write(&self, request: WriteRequest) -> OpFuture<WriteResult> {
        if !self.bucket.try_acquire(1) {
            self.reporter.report_write_dropped_by_rate_limit();
            log::warn!("write dropped by rate limiter");
            return OpFuture::failed(BackendError::RateLimitExceeded);
        }

        let entries = request.points.len() as u64;
        let started = Instant::now();
        let fut = self.delegate.write(request);

        let reporter = self.reporter.clone();
        fut.on_done(move |outcome| {
            reporter.report_write_batch_duration(started.elapsed());
            match outcome {
                Outcome::Resolved(result) => reporter.report_write_success(result.entries_written),
                Outcome::Failed(_) => reporter.report_write_failure(entries),
                Outcome::Cancelled(_) => {}
            }
        });
        fut
    }

    fn find_tags(&self, request: FindRequest) -> OpFuture<FindTagsResult> {
        self.delegate.find_tags(request)
    }

    fn find_series(&self, request: FindRequest) -> OpFuture<FindSeriesResult> {
        self.delegate.find_series(request)
    }

    fn find_series_stream(&self, request: FindRequest) -> OpObservable<Series> {
        self.delegate.find_series_stream(request)
    }

    fn find_series_ids(&self, request: FindRequest) -> OpFuture<FindSeriesIdsResult> {
        self.delegate.find_series_ids(request)
    }

    fn count_series(&self, request: FindRequest) -> OpFuture<CountSeriesResult> {
        self.delegate.count_series(request)
    }

    fn delete_series(&self, request: FindRequest) -> OpFuture<DeleteSeriesResult> {
        self.delegate.delete_series(request)
    }

    fn find_keys(&self, request: FindRequest) -> OpFuture<FindKeysResult> {
        self.delegate.find_keys(request)
    }

    fn entries(&self, request: EntriesRequest) -> OpObservable<Entry> {
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
