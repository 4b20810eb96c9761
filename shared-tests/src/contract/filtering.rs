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

pub async fn tag_filters_scope_the_result(config: &(impl BackendTestConfig + Send + Sync)) {
    let backend = seeded_backend(config).await;

    let by_tag = backend
        .find_series(FindRequest::filtered(TagFilter::has_tag("site", "lon")))
        .await
        .into_result()
        .unwrap();
    assert_eq!(by_tag.series.len(), 2);
    assert!(by_tag
        .series
        .iter()
        .all(|series| series.tags["site"] == "lon"));

    let by_key = backend
        .count_series(FindRequest::filtered(TagFilter::has_key("host")))
        .await
        .into_result()
        .unwrap();
    assert_eq!(by_key.count, 3);

    let none = backend
        .find_series(FindRequest::filtered(TagFilter::has_tag("site", "nyc")))
        .await
        .into_result()
        .unwrap();
    assert!(none.series.is_empty());
}

pub async fn combinator_filters_compose(config: &(impl BackendTestConfig + Send + Sync)) {
    let backend = seeded_backend(config).await;

    let filter = TagFilter::And {
        filters: vec![
            TagFilter::has_tag("host", "a"),
            TagFilter::Not {
                filter: Box::new(TagFilter::has_tag("site", "sto")),
            },
        ],
    };

    let result = backend
        .find_series(FindRequest::filtered(filter))
        .await
        .into_result()
        .unwrap();
    assert_eq!(result.series.len(), 2);
}

pub async fn a_limit_truncates_and_marks_the_result(
    config: &(impl BackendTestConfig + Send + Sync),
) {
    let backend = seeded_backend(config).await;

    let limited = backend
        .find_series(FindRequest::all().with_limit(2))
        .await
        .into_result()
        .unwrap();
    assert_eq!(limited.series.len(), 2);
    assert!(limited.limited);

    let unlimited = backend
        .find_series(FindRequest::all().with_limit(10))
        .await
        .into_result()
        .unwrap();
    assert_eq!(unlimited.series.len(), 3);
    assert!(!unlimited.limited);
}
