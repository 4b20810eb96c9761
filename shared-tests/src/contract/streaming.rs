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

use std::collections::BTreeSet;

use futures::StreamExt;

use tessera_core::models::{EntriesRequest, FindRequest, TagFilter};

use super::seeded_backend;
use crate::BackendTestConfig;

pub async fn streamed_series_match_the_buffered_result(
    config: &(impl BackendTestConfig + Send + Sync),
) {
    let backend = seeded_backend(config).await;

    let buffered: BTreeSet<String> = backend
        .find_series(FindRequest::all())
        .await
        .into_result()
        .unwrap()
        .series
        .into_iter()
        .map(|series| series.id())
        .collect();

    let mut stream = backend.find_series_stream(FindRequest::all());
    let mut streamed = BTreeSet::new();
    while let Some(series) = stream.next().await {
        streamed.insert(series.unwrap().id());
    }

    assert_eq!(streamed, buffered);
}

pub async fn entries_expose_every_written_point(
    config: &(impl BackendTestConfig + Send + Sync),
) {
    let backend = seeded_backend(config).await;

    let mut stream = backend.entries(EntriesRequest::all());
    let mut points = 0;
    while let Some(entry) = stream.next().await {
        entry.unwrap();
        points += 1;
    }

    assert_eq!(points, 6);
}

pub async fn entry_scans_are_scoped_by_filter(config: &(impl BackendTestConfig + Send + Sync)) {
    let backend = seeded_backend(config).await;

    let mut stream =
        backend.entries(EntriesRequest::filtered(TagFilter::has_tag("host", "b")));
    let mut points = 0;
    while let Some(entry) = stream.next().await {
        let entry = entry.unwrap();
        assert_eq!(entry.series.tags["host"], "b");
        points += 1;
    }

    assert_eq!(points, 1);
}

pub async fn a_cancelled_stream_stops_yielding(config: &(impl BackendTestConfig + Send + Sync)) {
    let backend = seeded_backend(config).await;

    let mut stream = backend.find_series_stream(FindRequest::all());
    let first = stream.next().await;
    assert!(first.is_some());

    stream.cancel();
    assert!(stream.next().await.is_none());
}
