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

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Named counters describing work performed by a backend or a merge.
/// Merging sums per counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Statistics {
    counters: BTreeMap<String, i64>,
}

impl Statistics {
    pub fn new() -> Self {
        Statistics::default()
    }

    pub fn of(name: impl Into<String>, value: i64) -> Self {
        let mut statistics = Statistics::new();
        statistics.add(name, value);
        statistics
    }

    pub fn add(&mut self, name: impl Into<String>, value: i64) {
        *self.counters.entry(name.into()).or_insert(0) += value;
    }

    pub fn get(&self, name: &str) -> i64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn merge(mut self, other: Statistics) -> Statistics {
        for (name, value) in other.counters {
            self.add(name, value);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    pub fn counters(&self) -> &BTreeMap<String, i64> {
        &self.counters
    }
}

/// Routing tags of a backend. An empty scope matches every backend; a
/// non-empty scope matches backends with at least one tag in common.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Groups {
    tags: BTreeSet<String>,
}

impl Groups {
    pub fn empty() -> Self {
        Groups::default()
    }

    pub fn of<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Groups {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Whether a backend carrying these groups participates in an operation
    /// scoped to `scope`.
    pub fn scope_matches(&self, scope: &Groups) -> bool {
        scope.is_empty() || !self.tags.is_disjoint(&scope.tags)
    }
}
