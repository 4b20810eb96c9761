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

use super::Series;

/// Associative merge of per-backend partial results into one result.
pub trait MergeResults: Sized {
    fn merge(self, other: Self) -> Self;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteResult {
    pub entries_written: u64,
}

impl WriteResult {
    pub fn of(entries_written: u64) -> Self {
        WriteResult { entries_written }
    }
}

impl MergeResults for WriteResult {
    fn merge(self, other: Self) -> Self {
        WriteResult {
            entries_written: self.entries_written + other.entries_written,
        }
    }
}

/// Distinct tag keys mapped to the values seen under each key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindTagsResult {
    pub tags: BTreeMap<String, BTreeSet<String>>,
}

impl MergeResults for FindTagsResult {
    fn merge(mut self, other: Self) -> Self {
        for (key, values) in other.tags {
            self.tags.entry(key).or_default().extend(values);
        }
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindSeriesResult {
    pub series: Vec<Series>,
    /// True when a limit truncated the result.
    #[serde(default)]
    pub limited: bool,
}

impl MergeResults for FindSeriesResult {
    fn merge(mut self, other: Self) -> Self {
        self.series.extend(other.series);
        self.limited |= other.limited;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindSeriesIdsResult {
    pub ids: BTreeSet<String>,
}

impl MergeResults for FindSeriesIdsResult {
    fn merge(mut self, other: Self) -> Self {
        self.ids.extend(other.ids);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountSeriesResult {
    pub count: u64,
}

impl CountSeriesResult {
    pub fn of(count: u64) -> Self {
        CountSeriesResult { count }
    }
}

impl MergeResults for CountSeriesResult {
    fn merge(self, other: Self) -> Self {
        CountSeriesResult {
            count: self.count + other.count,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteSeriesResult {
    pub deleted: u64,
}

impl MergeResults for DeleteSeriesResult {
    fn merge(self, other: Self) -> Self {
        DeleteSeriesResult {
            deleted: self.deleted + other.deleted,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindKeysResult {
    pub keys: BTreeSet<String>,
}

impl MergeResults for FindKeysResult {
    fn merge(mut self, other: Self) -> Self {
        self.keys.extend(other.keys);
        self
    }
}
