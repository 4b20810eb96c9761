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

use std::sync::Arc;

use super::{BackendManager, CoveragePolicy, StreamFailureMode};
use crate::instrumented_backend::InstrumentedMetadataBackend;
use crate::interface::MetadataBackend;
use crate::rate_limit::{RateLimitedMetadataBackend, WriteRateLimitConfig};
use crate::stats::{MetadataBackendReporter, MetricRegistry};

/// Assembles a [`BackendManager`], wiring the decorator stack around every
/// registered backend.
///
/// With a metric registry each backend is wrapped in instrumentation; with a
/// write rate limit each backend is additionally wrapped in a limiter. The
/// limiter sits inside the instrumentation, so a rate-limited write is still
/// visible as a failed write on the instrumented surface.
pub struct BackendManagerBuilder {
    backends: Vec<(String, Arc<dyn MetadataBackend>)>,
    metric_registry: Option<Arc<MetricRegistry>>,
    write_rate_limit: Option<WriteRateLimitConfig>,
    coverage: CoveragePolicy,
    stream_failure_mode: StreamFailureMode,
}

impl Default for BackendManagerBuilder {
    fn default() -> Self {
        BackendManagerBuilder::new()
    }
}

impl BackendManagerBuilder {
    pub fn new() -> Self {
        BackendManagerBuilder {
            backends: Vec::new(),
            metric_registry: None,
            write_rate_limit: None,
            coverage: CoveragePolicy::default(),
            stream_failure_mode: StreamFailureMode::default(),
        }
    }

    pub fn with_backend(
        mut self,
        name: impl Into<String>,
        backend: Arc<dyn MetadataBackend>,
    ) -> Self {
        self.backends.push((name.into(), backend));
        self
    }

    pub fn with_metric_registry(mut self, registry: Arc<MetricRegistry>) -> Self {
        self.metric_registry = Some(registry);
        self
    }

    pub fn with_write_rate_limit(mut self, config: WriteRateLimitConfig) -> Self {
        self.write_rate_limit = Some(config);
        self
    }

    pub fn with_coverage_policy(mut self, coverage: CoveragePolicy) -> Self {
        self.coverage = coverage;
        self
    }

    pub fn with_stream_failure_mode(mut self, mode: StreamFailureMode) -> Self {
        self.stream_failure_mode = mode;
        self
    }

    pub fn build(self) -> BackendManager {
        let BackendManagerBuilder {
            backends,
            metric_registry,
            write_rate_limit,
            coverage,
            stream_failure_mode,
        } = self;

        let instrument = metric_registry.is_some();
        // A rate limit without a registry still needs a reporter to count
        // dropped writes.
        let registry = metric_registry.or_else(|| {
            write_rate_limit
                .as_ref()
                .map(|_| Arc::new(MetricRegistry::new()))
        });

        let backends = backends
            .into_iter()
            .map(|(name, backend)| {
                let mut backend = backend;
                if let Some(registry) = &registry {
                    let reporter = Arc::new(MetadataBackendReporter::new(registry, &name));
                    if let Some(config) = &write_rate_limit {
                        backend = Arc::new(RateLimitedMetadataBackend::new(
                            backend,
                            config,
                            reporter.clone(),
                        ));
                    }
                    if instrument {
                        backend = Arc::new(InstrumentedMetadataBackend::new(backend, reporter));
                    }
                }
                (Arc::from(name), backend)
            })
            .collect();

        BackendManager::assemble(backends, coverage, stream_failure_mode)
    }
}
