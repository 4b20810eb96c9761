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

use super::{MergeResults, Statistics};
use crate::interface::BackendError;

/// Classification of a recorded per-backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    BackendNotReady,
    BackendFailure,
    RateLimitExceeded,
    Cancelled,
}

/// A per-backend failure captured during fan-out. It identifies the backend
/// and describes the failure, without aborting the aggregate operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestError {
    pub backend: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl RequestError {
    pub fn not_ready(backend: &str) -> Self {
        RequestError {
            backend: backend.to_string(),
            kind: ErrorKind::BackendNotReady,
            message: BackendError::NotReady.to_string(),
        }
    }

    pub fn from_backend_error(backend: &str, error: &BackendError) -> Self {
        let kind = match error {
            BackendError::NotReady => ErrorKind::BackendNotReady,
            BackendError::RateLimitExceeded => ErrorKind::RateLimitExceeded,
            BackendError::Cancelled(_) => ErrorKind::Cancelled,
            _ => ErrorKind::BackendFailure,
        };
        RequestError {
            backend: backend.to_string(),
            kind,
            message: error.to_string(),
        }
    }
}

/// Merged output of a fan-out operation.
///
/// `groups` holds the partial result of every backend that resolved, in
/// backend-invocation order; every backend that was skipped or failed is
/// accounted for in `errors`. Participating backends always equal
/// `groups.len() + errors.len()` — no backend silently disappears.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult<T> {
    pub groups: Vec<T>,
    pub errors: Vec<RequestError>,
    pub statistics: Statistics,
}

impl<T> AggregateResult<T> {
    /// Statistics keys recorded by the aggregator on every fan-out, present
    /// even when zero backends matched.
    pub const PARTICIPATING: &'static str = "backends.participating";
    pub const RESOLVED: &'static str = "backends.resolved";
    pub const FAILED: &'static str = "backends.failed";

    pub fn empty() -> Self {
        AggregateResult {
            groups: Vec::new(),
            errors: Vec::new(),
            statistics: Statistics::new(),
        }
    }

    /// Some backends failed but the aggregate still resolved.
    pub fn is_degraded(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Flattens per-backend groups into a single merged result.
    pub fn merged(self) -> T
    where
        T: MergeResults + Default,
    {
        self.groups
            .into_iter()
            .fold(T::default(), |acc, group| acc.merge(group))
    }
}

/// One element of a multiplexed fan-out stream: either an item from some
/// backend or a recorded per-backend stream failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AggregateItem<T> {
    Item(T),
    Error(RequestError),
}
