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

use async_trait::async_trait;

use tessera_core::in_memory_backend::InMemoryMetadataBackend;
use tessera_core::interface::MetadataBackend;

use crate::BackendTestConfig;

struct InMemoryBackendConfig {}

impl InMemoryBackendConfig {
    pub fn new() -> Self {
        InMemoryBackendConfig {}
    }
}

#[async_trait]
impl BackendTestConfig for InMemoryBackendConfig {
    async fn create_backend(&self) -> Arc<dyn MetadataBackend> {
        log::info!("using the in-memory metadata backend");
        Arc::new(InMemoryMetadataBackend::new())
    }
}

mod round_trip {
    use super::InMemoryBackendConfig;
    use crate::contract::*;

    #[tokio::test]
    async fn written_series_are_queryable() {
        let test_config = InMemoryBackendConfig::new();
        round_trip::written_series_are_queryable(&test_config).await;
    }

    #[tokio::test]
    async fn write_reports_the_batch_size() {
        let test_config = InMemoryBackendConfig::new();
        round_trip::write_reports_the_batch_size(&test_config).await;
    }

    #[tokio::test]
    async fn rewriting_a_series_does_not_duplicate_it() {
        let test_config = InMemoryBackendConfig::new();
        round_trip::rewriting_a_series_does_not_duplicate_it(&test_config).await;
    }
}

mod filtering {
    use super::InMemoryBackendConfig;
    use crate::contract::*;

    #[tokio::test]
    async fn tag_filters_scope_the_result() {
        let test_config = InMemoryBackendConfig::new();
        filtering::tag_filters_scope_the_result(&test_config).await;
    }

    #[tokio::test]
    async fn combinator_filters_compose() {
        let test_config = InMemoryBackendConfig::new();
        filtering::combinator_filters_compose(&test_config).await;
    }

    #[tokio::test]
    async fn a_limit_truncates_and_marks_the_result() {
        let test_config = InMemoryBackendConfig::new();
        filtering::a_limit_truncates_and_marks_the_result(&test_config).await;
    }
}

mod deletion {
    use super::InMemoryBackendConfig;
    use crate::contract::*;

    #[tokio::test]
    async fn delete_removes_only_matching_series() {
        let test_config = InMemoryBackendConfig::new();
        deletion::delete_removes_only_matching_series(&test_config).await;
    }

    #[tokio::test]
    async fn deleting_nothing_is_a_resolved_no_op() {
        let test_config = InMemoryBackendConfig::new();
        deletion::deleting_nothing_is_a_resolved_no_op(&test_config).await;
    }
}

mod streaming {
    use super::InMemoryBackendConfig;
    use crate::contract::*;

    #[tokio::test]
    async fn streamed_series_match_the_buffered_result() {
        let test_config = InMemoryBackendConfig::new();
        streaming::streamed_series_match_the_buffered_result(&test_config).await;
    }

    #[tokio::test]
    async fn entries_expose_every_written_point() {
        let test_config = InMemoryBackendConfig::new();
        streaming::entries_expose_every_written_point(&test_config).await;
    }

    #[tokio::test]
    async fn entry_scans_are_scoped_by_filter() {
        let test_config = InMemoryBackendConfig::new();
        streaming::entry_scans_are_scoped_by_filter(&test_config).await;
    }

    #[tokio::test]
    async fn a_cancelled_stream_stops_yielding() {
        let test_config = InMemoryBackendConfig::new();
        streaming::a_cancelled_stream_stops_yielding(&test_config).await;
    }
}
