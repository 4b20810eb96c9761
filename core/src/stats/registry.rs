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

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// Identifier of one instrument: an ordered set of key/value tags.
///
/// Immutable once built and deterministic: building an id from the same tags
/// always addresses the same underlying instrument in a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MetricId {
    tags: BTreeMap<String, String>,
}

impl MetricId {
    pub fn build() -> Self {
        MetricId::default()
    }

    pub fn tagged(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

impl Display for MetricId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (key, value)) in self.tags.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

/// Monotonic counter, safe for concurrent increment.
#[derive(Debug, Default)]
pub struct Counter {
    count: AtomicU64,
}

impl Counter {
    pub fn mark(&self) {
        self.add(1);
    }

    pub fn add(&self, n: u64) {
        self.count.fetch_add(n, Ordering::Relaxed);
    }

    pub fn value(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Latency aggregate: count, total and max of recorded durations.
#[derive(Debug, Default)]
pub struct DurationHistogram {
    count: AtomicU64,
    total_micros: AtomicU64,
    max_micros: AtomicU64,
}

impl DurationHistogram {
    pub fn record(&self, elapsed: Duration) {
        let micros = elapsed.as_micros().min(u64::MAX as u128) as u64;
        self.count.fetch_add(1, Ordering::Relaxed);
        self.total_micros.fetch_add(micros, Ordering::Relaxed);
        self.max_micros.fetch_max(micros, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> Duration {
        Duration::from_micros(self.total_micros.load(Ordering::Relaxed))
    }

    pub fn max(&self) -> Duration {
        Duration::from_micros(self.max_micros.load(Ordering::Relaxed))
    }
}

/// Process-wide instrument registry.
///
/// Requesting the same [`MetricId`] twice returns the same shared instrument,
/// so decorators built independently still address one counter per id.
#[derive(Debug, Default)]
pub struct MetricRegistry {
    counters: RwLock<HashMap<MetricId, Arc<Counter>>>,
    histograms: RwLock<HashMap<MetricId, Arc<DurationHistogram>>>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        MetricRegistry::default()
    }

    pub fn counter(&self, id: MetricId) -> Arc<Counter> {
        let mut counters = self
            .counters
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        counters.entry(id).or_default().clone()
    }

    pub fn histogram(&self, id: MetricId) -> Arc<DurationHistogram> {
        let mut histograms = self
            .histograms
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        histograms.entry(id).or_default().clone()
    }

    /// Point-in-time view of every counter, keyed by rendered id. Histograms
    /// are exported as `<id>.count` / `<id>.total-micros` / `<id>.max-micros`.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        let mut snapshot = BTreeMap::new();
        let counters = self.counters.read().unwrap_or_else(PoisonError::into_inner);
        for (id, counter) in counters.iter() {
            snapshot.insert(id.to_string(), counter.value());
        }
        let histograms = self
            .histograms
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        for (id, histogram) in histograms.iter() {
            snapshot.insert(format!("{id}.count"), histogram.count());
            snapshot.insert(
                format!("{id}.total-micros"),
                histogram.total().as_micros() as u64,
            );
            snapshot.insert(
                format!("{id}.max-micros"),
                histogram.max().as_micros() as u64,
            );
        }
        snapshot
    }
}
