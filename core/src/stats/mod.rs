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

//! Process-wide instrumentation primitives.
//!
//! Counters and histograms are lock-free so completion callbacks from any
//! number of concurrent backend operations can record into them; an external
//! exporter reads snapshots out of the registry.

mod registry;
mod reporter;


pub use registry::Counter;
pub use registry::DurationHistogram;
pub use registry::MetricId;
pub use registry::MetricRegistry;
pub use reporter::MetadataBackendReporter;
pub use reporter::OperationReporter;
pub use reporter::ReporterContext;

/// Conventional values of the `unit` metric tag.
pub mod units {
    pub const QUERY: &str = "query";
    pub const WRITE: &str = "write";
    pub const FAILURE: &str = "failure";
    pub const RESOLVE: &str = "resolve";
    pub const CANCEL: &str = "cancel";
    pub const DROP: &str = "drop";
    pub const MILLISECOND: &str = "millisecond";
}
