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

//! Heap-backed reference backend. Used by the contract tests and as the
//! smallest complete example of the backend surface.


use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::completion::{OpFuture, OpObservable};
use crate::interface::MetadataBackend;
use crate::models::{
    CountSeriesResult, DataPoint, DeleteSeriesResult, EntriesRequest, Entry, FindKeysResult,
    FindRequest, FindSeriesIdsResult, FindSeriesResult, FindTagsResult, Groups, Series,
    Statistics, WriteRequest, WriteResult,
};

struct StoredSeries {
    series: Series,
    points: Vec<DataPoint>,
}

#[derive(Default)]
struct ScanCounters {
    writes_accepted: AtomicU64,
    rows_scanned: AtomicU64,
    series_stored: AtomicU64,
}

/// In-memory [`MetadataBackend`] keyed by series id.
///
/// Reads take a snapshot under the store lock before emitting, so a stream
/// observes a point-in-time view; writes issued during a stream do not
/// appear in it.
pub struct InMemoryMetadataBackend {
    store: Arc<RwLock<BTreeMap<String, StoredSeries>>>,
    counters: Arc<ScanCounters>,
    groups: Groups,
    ready: AtomicBool,
}

impl Default for InMemoryMetadataBackend {
    fn default() -> Self {
        InMemoryMetadataBackend::new()
    }
}

impl InMemoryMetadataBackend {
    pub fn new() -> Self {
        InMemoryMetadataBackend {
            store: Arc::new(RwLock::new(BTreeMap::new())),
            counters: Arc::new(ScanCounters::default()),
            groups: Groups::empty(),
            ready: AtomicBool::new(true),
        }
    }

    pub fn with_groups(mut self, groups: Groups) -> Self {
        self.groups = groups;
        self
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Relaxed);
    }
}

impl MetadataBackend for InMemoryMetadataBackend {
    fn write(&self, request: WriteRequest) -> OpFuture<WriteResult> {
        let store = self.store.clone();
        let counters = self.counters.clone();
        OpFuture::spawn(async move {
            let mut store = store.write().await;
            let entries = request.points.len() as u64;
            let id = request.series.id();
            if !store.contains_key(&id) {
                counters.series_stored.fetch_add(1, Ordering::Relaxed);
            }
            let record = store.entry(id).or_insert_with(|| StoredSeries {
                series: request.series,
                points: Vec::new(),
            });
            record.points.extend(request.points);
            counters.writes_accepted.fetch_add(1, Ordering::Relaxed);
            Ok(WriteResult::of(entries))
        })
    }

    fn find_tags(&self, request: FindRequest) -> OpFuture<FindTagsResult> {
        let store = self.store.clone();
        let counters = self.counters.clone();
        OpFuture::spawn(async move {
            let store = store.read().await;
            let mut result = FindTagsResult::default();
            for record in store.values() {
                counters.rows_scanned.fetch_add(1, Ordering::Relaxed);
                if !request.filter.matches(&record.series) {
                    continue;
                }
                for (key, value) in &record.series.tags {
                    result
                        .tags
                        .entry(key.clone())
                        .or_default()
                        .insert(value.clone());
                }
            }
            Ok(result)
        })
    }

    fn find_series(&self, request: FindRequest) -> OpFuture<FindSeriesResult> {
        let store = self.store.clone();
        let counters = self.counters.clone();
        OpFuture::spawn(async move {
            let store = store.read().await;
            let mut result = FindSeriesResult::default();
            for record in store.values() {
                counters.rows_scanned.fetch_add(1, Ordering::Relaxed);
                if !request.filter.matches(&record.series) {
                    continue;
                }
                if let Some(limit) = request.limit {
                    if result.series.len() >= limit {
                        result.limited = true;
                        break;
                    }
                }
                result.series.push(record.series.clone());
            }
            Ok(result)
        })
    }

    fn find_series_stream(&self, request: FindRequest) -> OpObservable<Series> {
        let store = self.store.clone();
        let counters = self.counters.clone();
        OpObservable::spawn(move |sink| async move {
            let snapshot: Vec<Series> = {
                let store = store.read().await;
                store
                    .values()
                    .inspect(|_| {
                        counters.rows_scanned.fetch_add(1, Ordering::Relaxed);
                    })
                    .filter(|record| request.filter.matches(&record.series))
                    .map(|record| record.series.clone())
                    .collect()
            };
            let limit = request.limit.unwrap_or(usize::MAX);
            for series in snapshot.into_iter().take(limit) {
                if sink.next(series).is_err() {
                    return Ok(());
                }
            }
            Ok(())
        })
    }

    fn find_series_ids(&self, request: FindRequest) -> OpFuture<FindSeriesIdsResult> {
        let store = self.store.clone();
        let counters = self.counters.clone();
        OpFuture::spawn(async move {
            let store = store.read().await;
            let mut result = FindSeriesIdsResult::default();
            for (id, record) in store.iter() {
                counters.rows_scanned.fetch_add(1, Ordering::Relaxed);
                if request.filter.matches(&record.series) {
                    result.ids.insert(id.clone());
                }
            }
            Ok(result)
        })
    }

    fn count_series(&self, request: FindRequest) -> OpFuture<CountSeriesResult> {
        let store = self.store.clone();
        let counters = self.counters.clone();
        OpFuture::spawn(async move {
            let store = store.read().await;
            let count = store
                .values()
                .inspect(|_| {
                    counters.rows_scanned.fetch_add(1, Ordering::Relaxed);
                })
                .filter(|record| request.filter.matches(&record.series))
                .count() as u64;
            Ok(CountSeriesResult::of(count))
        })
    }

    fn delete_series(&self, request: FindRequest) -> OpFuture<DeleteSeriesResult> {
        let store = self.store.clone();
        let counters = self.counters.clone();
        OpFuture::spawn(async move {
            let mut store = store.write().await;
            let before = store.len();
            store.retain(|_, record| !request.filter.matches(&record.series));
            let deleted = (before - store.len()) as u64;
            counters.series_stored.fetch_sub(deleted, Ordering::Relaxed);
            Ok(DeleteSeriesResult { deleted })
        })
    }

    fn find_keys(&self, request: FindRequest) -> OpFuture<FindKeysResult> {
        let store = self.store.clone();
        let counters = self.counters.clone();
        OpFuture::spawn(async move {
            let store = store.read().await;
            let mut result = FindKeysResult::default();
            for record in store.values() {
                counters.rows_scanned.fetch_add(1, Ordering::Relaxed);
                if request.filter.matches(&record.series) {
                    result.keys.insert(record.series.key.clone());
                }
            }
            Ok(result)
        })
    }

    fn entries(&self, request: EntriesRequest) -> OpObservable<Entry> {
        let store = self.store.clone();
        let counters = self.counters.clone();
        OpObservable::spawn(move |sink| async move {
            let snapshot: Vec<Entry> = {
                let store = store.read().await;
                let mut entries = Vec::new();
                for record in store.values() {
                    counters.rows_scanned.fetch_add(1, Ordering::Relaxed);
                    if !request.filter.matches(&record.series) {
                        continue;
                    }
                    for point in &record.points {
                        entries.push(Entry {
                            series: record.series.clone(),
                            point: *point,
                        });
                    }
                }
                entries
            };
            for entry in snapshot {
                if sink.next(entry).is_err() {
                    return Ok(());
                }
            }
            Ok(())
        })
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    fn groups(&self) -> Groups {
        self.groups.clone()
    }

    fn statistics(&self) -> Statistics {
        let mut statistics = Statistics::of(
            "writes-accepted",
            self.counters.writes_accepted.load(Ordering::Relaxed) as i64,
        );
        statistics.add(
            "rows-scanned",
            self.counters.rows_scanned.load(Ordering::Relaxed) as i64,
        );
        statistics.add(
            "series-stored",
            self.counters.series_stored.load(Ordering::Relaxed) as i64,
        );
        statistics
    }
}
