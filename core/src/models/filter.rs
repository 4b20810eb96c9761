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

use super::Series;

/// Tag predicate scoping a find/count/delete operation to a subset of series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum TagFilter {
    #[default]
    MatchAll,
    HasKey {
        key: String,
    },
    HasTag {
        key: String,
        value: String,
    },
    And {
        filters: Vec<TagFilter>,
    },
    Or {
        filters: Vec<TagFilter>,
    },
    Not {
        filter: Box<TagFilter>,
    },
}

impl TagFilter {
    pub fn has_tag(key: impl Into<String>, value: impl Into<String>) -> Self {
        TagFilter::HasTag {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn has_key(key: impl Into<String>) -> Self {
        TagFilter::HasKey { key: key.into() }
    }

    pub fn matches(&self, series: &Series) -> bool {
        match self {
            TagFilter::MatchAll => true,
            TagFilter::HasKey { key } => series.tags.contains_key(key),
            TagFilter::HasTag { key, value } => {
                series.tags.get(key).is_some_and(|v| v == value)
            }
            TagFilter::And { filters } => filters.iter().all(|f| f.matches(series)),
            TagFilter::Or { filters } => filters.iter().any(|f| f.matches(series)),
            TagFilter::Not { filter } => !filter.matches(series),
        }
    }
}
