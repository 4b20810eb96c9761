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

//! Deferred completion primitives shared by every backend operation.
//!
//! [`OpFuture`] is a single-value deferred result with exactly one terminal
//! outcome; [`OpObservable`] is a deferred sequence terminated by exactly one
//! completion or failure signal. Both are the currency of the
//! [`MetadataBackend`](crate::interface::MetadataBackend) trait and of the
//! fan-out aggregator.

mod op_future;
mod op_observable;

#[cfg(test)]
mod tests;

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::interface::BackendError;

pub use op_future::Completer;
pub use op_future::OpFuture;
pub use op_observable::Emitter;
pub use op_observable::ItemSink;
pub use op_observable::OpObservable;
pub use op_observable::SinkClosed;

/// Why a pending operation was abandoned. Carried through to every listener
/// of the cancelled future or observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CancelReason {
    CallerRequested,
    ResolvedElsewhere,
    Superseded,
    Shutdown,
}

impl Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelReason::CallerRequested => "caller-requested".fmt(f),
            CancelReason::ResolvedElsewhere => "resolved-elsewhere".fmt(f),
            CancelReason::Superseded => "superseded".fmt(f),
            CancelReason::Shutdown => "shutdown".fmt(f),
        }
    }
}

/// The three terminal dispositions a future or observable can reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    Resolved,
    Failed,
    Cancelled,
}

impl Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Disposition::Resolved => "resolved".fmt(f),
            Disposition::Failed => "failed".fmt(f),
            Disposition::Cancelled => "cancelled".fmt(f),
        }
    }
}

/// Terminal outcome of an [`OpFuture`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Resolved(T),
    Failed(BackendError),
    Cancelled(CancelReason),
}

impl<T> Outcome<T> {
    pub fn disposition(&self) -> Disposition {
        match self {
            Outcome::Resolved(_) => Disposition::Resolved,
            Outcome::Failed(_) => Disposition::Failed,
            Outcome::Cancelled(_) => Disposition::Cancelled,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Outcome::Resolved(_))
    }

    /// Collapses the outcome into a `Result`, folding cancellation into the
    /// error taxonomy.
    pub fn into_result(self) -> Result<T, BackendError> {
        match self {
            Outcome::Resolved(value) => Ok(value),
            Outcome::Failed(error) => Err(error),
            Outcome::Cancelled(reason) => Err(BackendError::Cancelled(reason)),
        }
    }
}

/// A second terminal transition was attempted on an already-completed future.
///
/// This is a programmer error on the producer side, never a recoverable
/// runtime condition, and is returned rather than swallowed so the caller bug
/// surfaces immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("future already {existing}, rejected second `{attempted}` transition")]
pub struct IllegalStateError {
    pub existing: Disposition,
    pub attempted: Disposition,
}
