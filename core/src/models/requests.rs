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

use serde::{Deserialize, Serialize};

use super::{DataPoint, Series, TagFilter};

/// Write of a batch of points against one series. At-most-once per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteRequest {
    pub series: Series,
    pub points: Vec<DataPoint>,
}

impl WriteRequest {
    pub fn new(series: Series, points: Vec<DataPoint>) -> Self {
        WriteRequest { series, points }
    }
}

/// Shared request shape of the find/count/delete family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindRequest {
    #[serde(default)]
    pub filter: TagFilter,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl FindRequest {
    pub fn all() -> Self {
        FindRequest::default()
    }

    pub fn filtered(filter: TagFilter) -> Self {
        FindRequest {
            filter,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Request shape of the raw entries scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntriesRequest {
    #[serde(default)]
    pub filter: TagFilter,
}

impl EntriesRequest {
    pub fn all() -> Self {
        EntriesRequest::default()
    }

    pub fn filtered(filter: TagFilter) -> Self {
        EntriesRequest { filter }
    }
}
