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

use tessera_core::models::{DataPoint, FindRequest, Series, WriteRequest};

use super::seeded_backend;
use crate::BackendTestConfig;

pub async fn written_series_are_queryable(config: &(impl BackendTestConfig + Send + Sync)) {
    let backend = seeded_backend(config).await;

    let count = backend
        .count_series(FindRequest::all())
        .await
        .into_result()
        .unwrap();
    assert_eq!(count.count, 3);

    let keys = backend
        .find_keys(FindRequest::all())
        .await
        .into_result()
        .unwrap();
    assert!(keys.keys.contains("cpu"));
    assert!(keys.keys.contains("mem"));

    let tags = backend
        .find_tags(FindRequest::all())
        .await
        .into_result()
        .unwrap();
    assert_eq!(tags.tags["host"].len(), 2);
    assert_eq!(tags.tags["site"].len(), 2);

    let ids = backend
        .find_series_ids(FindRequest::all())
        .await
        .into_result()
        .unwrap();
    assert_eq!(ids.ids.len(), 3);
}

pub async fn write_reports_the_batch_size(config: &(impl BackendTestConfig + Send + Sync)) {
    let backend = config.create_backend().await;

    let result = backend
        .write(WriteRequest::new(
            Series::new("disk").with_tag("host", "a"),
            vec![DataPoint::new(0, 1.0), DataPoint::new(1_000, 2.0)],
        ))
        .await
        .into_result()
        .unwrap();

    assert_eq!(result.entries_written, 2);
}

pub async fn rewriting_a_series_does_not_duplicate_it(
    config: &(impl BackendTestConfig + Send + Sync),
) {
    let backend = config.create_backend().await;
    let series = Series::new("disk").with_tag("host", "a");

    for ts in [0, 1_000] {
        backend
            .write(WriteRequest::new(
                series.clone(),
                vec![DataPoint::new(ts, 1.0)],
            ))
            .await
            .into_result()
            .unwrap();
    }

    let count = backend
        .count_series(FindRequest::all())
        .await
        .into_result()
        .unwrap();
    assert_eq!(count.count, 1);
}
