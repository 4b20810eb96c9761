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

mod metadata_backend;

use thiserror::Error;

use crate::completion::CancelReason;

pub use metadata_backend::MetadataBackend;

/// Failure taxonomy of a single backend operation.
///
/// Per-backend failures are recorded into
/// [`RequestError`](crate::models::RequestError)s by the fan-out aggregator
/// and never abort the aggregate operation on their own; cancellation is the
/// exception and propagates to the whole aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("backend is not ready")]
    NotReady,

    #[error("backend operation failed: {0}")]
    Failure(String),

    #[error("write dropped by rate limiter")]
    RateLimitExceeded,

    #[error("operation cancelled: {0}")]
    Cancelled(CancelReason),

    #[error("producer dropped before completing")]
    Aborted,

    #[error("operation timed out")]
    Timeout,

    #[error("coverage policy unmet: {resolved} resolved of {required} required backends")]
    CoverageUnmet { resolved: usize, required: usize },
}

impl BackendError {
    pub fn failure(message: impl Into<String>) -> Self {
        BackendError::Failure(message.into())
    }
}
