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

use tessera_core::models::{FindRequest, TagFilter};

use super::seeded_backend;
use crate::BackendTestConfig;

pub async fn delete_removes_only_matching_series(
    config: &(impl BackendTestConfig + Send + Sync),
) {
    let backend = seeded_backend(config).await;

    let deleted = backend
        .delete_series(FindRequest::filtered(TagFilter::has_tag("host", "b")))
        .await
        .into_result()
        .unwrap();
    assert_eq!(deleted.deleted, 1);

    let remaining = backend
        .find_series(FindRequest::all())
        .await
        .into_result()
        .unwrap();
    assert_eq!(remaining.series.len(), 2);
    assert!(remaining
        .series
        .iter()
        .all(|series| series.tags["host"] == "a"));
}

pub async fn deleting_nothing_is_a_resolved_no_op(
    config: &(impl BackendTestConfig + Send + Sync),
) {
    let backend = seeded_backend(config).await;

    let deleted = backend
        .delete_series(FindRequest::filtered(TagFilter::has_tag("site", "nyc")))
        .await
        .into_result()
        .unwrap();
    assert_eq!(deleted.deleted, 0);

    let count = backend
        .count_series(FindRequest::all())
        .await
        .into_result()
        .unwrap();
    assert_eq!(count.count, 3);
}
