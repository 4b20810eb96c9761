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

//! Fan-out aggregation over the registered backends.
//!
//! A logical operation is routed to every ready backend whose groups match
//! the requested scope, issued concurrently, and merged into one
//! [`AggregateResult`]. Per-backend failures become recorded
//! [`RequestError`]s rather than aborting the aggregate; cancellation of any
//! one backend cancels the whole aggregate with the same reason.

mod builder;


use std::pin::Pin;
use std::sync::Arc;

use futures::stream::select_all;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::completion::{OpFuture, OpObservable, Outcome};
use crate::interface::{BackendError, MetadataBackend};
use crate::models::{
    AggregateItem, AggregateResult, CountSeriesResult, DeleteSeriesResult, EntriesRequest, Entry,
    FindKeysResult, FindRequest, FindSeriesIdsResult, FindSeriesResult, FindTagsResult, Groups,
    RequestError, Series, Statistics, WriteRequest, WriteResult,
};

pub use builder::BackendManagerBuilder;

/// Minimum number of resolved backends required before an aggregate
/// operation itself resolves.
///
/// The default (`Any`) makes even a zero-success-all-failed fan-out resolve
/// with an empty result and a full error list, so callers can render partial
/// data; `is_degraded` on the result separates the cases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CoveragePolicy {
    #[default]
    Any,
    AtLeast(usize),
    All,
}

impl CoveragePolicy {
    fn required(&self, participating: usize) -> usize {
        match self {
            CoveragePolicy::Any => 0,
            CoveragePolicy::AtLeast(n) => *n,
            CoveragePolicy::All => participating,
        }
    }
}

/// How a multiplexed stream reacts to one backend's stream failing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StreamFailureMode {
    /// Deliver the failure as an [`AggregateItem::Error`] and keep draining
    /// the remaining backends.
    #[default]
    Continue,
    /// Fail the whole merged stream on the first backend failure.
    FailFast,
}

#[derive(Clone)]
struct RegisteredBackend {
    name: Arc<str>,
    backend: Arc<dyn MetadataBackend>,
}

/// Routes logical operations to the registered backends and merges their
/// deferred results. Built through [`BackendManagerBuilder`].
pub struct BackendManager {
    backends: Vec<RegisteredBackend>,
    coverage: CoveragePolicy,
    stream_failure_mode: StreamFailureMode,
}

impl BackendManager {
    pub fn builder() -> BackendManagerBuilder {
        BackendManagerBuilder::new()
    }

    pub(crate) fn assemble(
        backends: Vec<(Arc<str>, Arc<dyn MetadataBackend>)>,
        coverage: CoveragePolicy,
        stream_failure_mode: StreamFailureMode,
    ) -> Self {
        BackendManager {
            backends: backends
                .into_iter()
                .map(|(name, backend)| RegisteredBackend { name, backend })
                .collect(),
            coverage,
            stream_failure_mode,
        }
    }

    #[tracing::instrument(skip_all, level = "debug")]
    pub fn write(
        &self,
        scope: &Groups,
        request: WriteRequest,
    ) -> OpFuture<AggregateResult<WriteResult>> {
        self.fan_out(scope, |backend| backend.write(request.clone()))
    }

    #[tracing::instrument(skip_all, level = "debug")]
    pub fn find_tags(
        &self,
        scope: &Groups,
        request: FindRequest,
    ) -> OpFuture<AggregateResult<FindTagsResult>> {
        self.fan_out(scope, |backend| backend.find_tags(request.clone()))
    }

    #[tracing::instrument(skip_all, level = "debug")]
    pub fn find_series(
        &self,
        scope: &Groups,
        request: FindRequest,
    ) -> OpFuture<AggregateResult<FindSeriesResult>> {
        self.fan_out(scope, |backend| backend.find_series(request.clone()))
    }

    #[tracing::instrument(skip_all, level = "debug")]
    pub fn find_series_ids(
        &self,
        scope: &Groups,
        request: FindRequest,
    ) -> OpFuture<AggregateResult<FindSeriesIdsResult>> {
        self.fan_out(scope, |backend| backend.find_series_ids(request.clone()))
    }

    #[tracing::instrument(skip_all, level = "debug")]
    pub fn count_series(
        &self,
        scope: &Groups,
        request: FindRequest,
    ) -> OpFuture<AggregateResult<CountSeriesResult>> {
        self.fan_out(scope, |backend| backend.count_series(request.clone()))
    }

    #[tracing::instrument(skip_all, level = "debug")]
    pub fn delete_series(
        &self,
        scope: &Groups,
        request: FindRequest,
    ) -> OpFuture<AggregateResult<DeleteSeriesResult>> {
        self.fan_out(scope, |backend| backend.delete_series(request.clone()))
    }

    #[tracing::instrument(skip_all, level = "debug")]
    pub fn find_keys(
        &self,
        scope: &Groups,
        request: FindRequest,
    ) -> OpFuture<AggregateResult<FindKeysResult>> {
        self.fan_out(scope, |backend| backend.find_keys(request.clone()))
    }

    #[tracing::instrument(skip_all, level = "debug")]
    pub fn find_series_stream(
        &self,
        scope: &Groups,
        request: FindRequest,
    ) -> OpObservable<AggregateItem<Series>> {
        self.fan_out_stream(scope, |backend| backend.find_series_stream(request.clone()))
    }

    #[tracing::instrument(skip_all, level = "debug")]
    pub fn entries(
        &self,
        scope: &Groups,
        request: EntriesRequest,
    ) -> OpObservable<AggregateItem<Entry>> {
        self.fan_out_stream(scope, |backend| backend.entries(request.clone()))
    }

    /// Partitions the registered backends into invocable ones and
    /// pre-invocation errors for matching backends that report not ready.
    fn select(&self, scope: &Groups) -> (Vec<RegisteredBackend>, Vec<RequestError>) {
        let mut selected = Vec::new();
        let mut errors = Vec::new();
        for registered in &self.backends {
            if !registered.backend.groups().scope_matches(scope) {
                continue;
            }
            if !registered.backend.is_ready() {
                log::warn!("skipping backend '{}': not ready", registered.name);
                errors.push(RequestError::not_ready(&registered.name));
                continue;
            }
            selected.push(registered.clone());
        }
        (selected, errors)
    }

    fn fan_out<T, F>(&self, scope: &Groups, op: F) -> OpFuture<AggregateResult<T>>
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&dyn MetadataBackend) -> OpFuture<T>,
    {
        let (selected, not_ready) = self.select(scope);
        let participating = selected.len() + not_ready.len();
        let coverage = self.coverage;

        // Issue every operation before awaiting any of them.
        let issued: Vec<(Arc<str>, Arc<dyn MetadataBackend>, OpFuture<T>)> = selected
            .into_iter()
            .map(|registered| {
                let fut = op(registered.backend.as_ref());
                (registered.name, registered.backend, fut)
            })
            .collect();
        let siblings: Vec<OpFuture<T>> = issued.iter().map(|(_, _, fut)| fut.clone()).collect();

        let aggregate = OpFuture::spawn_outcome(async move {
            let mut errors = not_ready;
            let mut groups = Vec::with_capacity(issued.len());
            let mut statistics = Statistics::new();

            for (index, (name, backend, fut)) in issued.iter().enumerate() {
                match fut.clone().await {
                    Outcome::Resolved(group) => {
                        groups.push(group);
                        statistics = statistics.merge(backend.statistics());
                    }
                    Outcome::Failed(error) => {
                        log::warn!("backend '{}' failed: {}", name, error);
                        errors.push(RequestError::from_backend_error(name, &error));
                    }
                    Outcome::Cancelled(reason) => {
                        log::warn!("fan-out cancelled by backend '{}': {}", name, reason);
                        for (_, _, sibling) in issued.iter().skip(index + 1) {
                            sibling.cancel(reason);
                        }
                        return Outcome::Cancelled(reason);
                    }
                }
            }

            let resolved = groups.len();
            let required = coverage.required(participating);
            if resolved < required {
                log::warn!(
                    "coverage policy unmet: {} of {} required backends resolved",
                    resolved,
                    required
                );
                return Outcome::Failed(BackendError::CoverageUnmet { resolved, required });
            }

            statistics.add(AggregateResult::<T>::PARTICIPATING, participating as i64);
            statistics.add(AggregateResult::<T>::RESOLVED, resolved as i64);
            statistics.add(AggregateResult::<T>::FAILED, errors.len() as i64);

            Outcome::Resolved(AggregateResult {
                groups,
                errors,
                statistics,
            })
        });

        // Cancelling the aggregate propagates a best-effort cancel to every
        // still-pending sibling.
        for sibling in siblings {
            aggregate.on_cancelled(move |reason| {
                sibling.cancel(reason);
            });
        }

        aggregate
    }

    fn fan_out_stream<T, F>(&self, scope: &Groups, op: F) -> OpObservable<AggregateItem<T>>
    where
        T: Send + 'static,
        F: Fn(&dyn MetadataBackend) -> OpObservable<T>,
    {
        let (selected, not_ready) = self.select(scope);
        let fail_fast = self.stream_failure_mode == StreamFailureMode::FailFast;

        let issued: Vec<(Arc<str>, OpObservable<T>)> = selected
            .into_iter()
            .map(|registered| {
                let observable = op(registered.backend.as_ref());
                (registered.name, observable)
            })
            .collect();

        OpObservable::spawn(move |sink| async move {
            for error in not_ready {
                if sink.next(AggregateItem::Error(error)).is_err() {
                    return Ok(());
                }
            }

            type TaggedItem<T> = Result<AggregateItem<T>, (Arc<str>, BackendError)>;
            let streams = issued.into_iter().map(|(name, observable)| {
                Box::pin(async_stream::stream! {
                    let mut observable = observable;
                    while let Some(item) = observable.next().await {
                        match item {
                            Ok(value) => yield Ok(AggregateItem::Item(value)),
                            Err(error) => {
                                yield Err((name.clone(), error));
                                break;
                            }
                        }
                    }
                }) as Pin<Box<dyn Stream<Item = TaggedItem<T>> + Send>>
            });

            // Items interleave across backends as they arrive; order is
            // preserved only within a single backend's stream.
            let mut merged = select_all(streams);
            while let Some(next) = merged.next().await {
                match next {
                    Ok(item) => {
                        if sink.next(item).is_err() {
                            return Ok(());
                        }
                    }
                    Err((name, error)) => {
                        log::warn!("backend '{}' stream failed: {}", name, error);
                        if fail_fast {
                            return Err(BackendError::failure(format!(
                                "backend '{name}' stream failed: {error}"
                            )));
                        }
                        let error = RequestError::from_backend_error(&name, &error);
                        if sink.next(AggregateItem::Error(error)).is_err() {
                            return Ok(());
                        }
                    }
                }
            }
            Ok(())
        })
    }
}
