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

use serde_json::json;

use super::{
    AggregateResult, CountSeriesResult, FindRequest, FindSeriesResult, FindTagsResult, Groups,
    MergeResults, RequestError, Series, Statistics, TagFilter, WriteResult,
};
use crate::interface::BackendError;

fn series(key: &str, tags: &[(&str, &str)]) -> Series {
    tags.iter()
        .fold(Series::new(key), |s, (k, v)| s.with_tag(*k, *v))
}

#[test]
fn series_id_is_deterministic_over_tag_order() {
    let a = series("cpu", &[("host", "a"), ("site", "lon")]);
    let b = Series::new("cpu").with_tag("site", "lon").with_tag("host", "a");

    assert_eq!(a.id(), b.id());
    assert_eq!(a.id(), "cpu?host=a,site=lon");
}

#[test]
fn filter_combinators_match_expected_series() {
    let s = series("cpu", &[("host", "a"), ("site", "lon")]);

    assert!(TagFilter::MatchAll.matches(&s));
    assert!(TagFilter::has_key("host").matches(&s));
    assert!(!TagFilter::has_key("rack").matches(&s));
    assert!(TagFilter::has_tag("site", "lon").matches(&s));
    assert!(!TagFilter::has_tag("site", "sto").matches(&s));

    let and = TagFilter::And {
        filters: vec![TagFilter::has_key("host"), TagFilter::has_tag("site", "lon")],
    };
    assert!(and.matches(&s));

    let or = TagFilter::Or {
        filters: vec![TagFilter::has_key("rack"), TagFilter::has_key("host")],
    };
    assert!(or.matches(&s));

    let not = TagFilter::Not {
        filter: Box::new(TagFilter::has_tag("host", "a")),
    };
    assert!(!not.matches(&s));
}

#[test]
fn empty_and_filter_matches_everything() {
    let s = series("cpu", &[]);
    assert!(TagFilter::And { filters: vec![] }.matches(&s));
    assert!(!TagFilter::Or { filters: vec![] }.matches(&s));
}

#[test]
fn filter_serialization_is_tagged_by_op() {
    let filter = TagFilter::And {
        filters: vec![
            TagFilter::has_tag("site", "lon"),
            TagFilter::Not {
                filter: Box::new(TagFilter::has_key("role")),
            },
        ],
    };

    let value = serde_json::to_value(&filter).unwrap();
    assert_eq!(
        value,
        json!({
            "op": "and",
            "filters": [
                { "op": "has-tag", "key": "site", "value": "lon" },
                { "op": "not", "filter": { "op": "has-key", "key": "role" } },
            ],
        })
    );

    let back: TagFilter = serde_json::from_value(value).unwrap();
    assert_eq!(back, filter);
}

#[test]
fn find_request_defaults_to_match_all() {
    let request: FindRequest = serde_json::from_value(json!({})).unwrap();
    assert_eq!(request.filter, TagFilter::MatchAll);
    assert_eq!(request.limit, None);
}

#[test]
fn merge_sums_write_and_count_results() {
    let write = WriteResult::of(3).merge(WriteResult::of(4));
    assert_eq!(write.entries_written, 7);

    let count = CountSeriesResult::of(10).merge(CountSeriesResult::of(5));
    assert_eq!(count.count, 15);
}

#[test]
fn merge_unions_tags_per_key() {
    let mut left = FindTagsResult::default();
    left.tags.entry("host".into()).or_default().insert("a".into());
    let mut right = FindTagsResult::default();
    right.tags.entry("host".into()).or_default().insert("b".into());
    right.tags.entry("site".into()).or_default().insert("lon".into());

    let merged = left.merge(right);
    assert_eq!(merged.tags["host"].len(), 2);
    assert!(merged.tags["site"].contains("lon"));
}

#[test]
fn merge_preserves_the_limited_marker() {
    let left = FindSeriesResult {
        series: vec![series("cpu", &[])],
        limited: true,
    };
    let right = FindSeriesResult {
        series: vec![series("mem", &[])],
        limited: false,
    };

    let merged = left.merge(right);
    assert_eq!(merged.series.len(), 2);
    assert!(merged.limited);
}

#[test]
fn statistics_merge_sums_per_counter() {
    let merged = Statistics::of("rows-scanned", 2)
        .merge(Statistics::of("rows-scanned", 3))
        .merge(Statistics::of("writes-accepted", 1));

    assert_eq!(merged.get("rows-scanned"), 5);
    assert_eq!(merged.get("writes-accepted"), 1);
    assert_eq!(merged.get("unknown"), 0);
    assert_eq!(merged.counters().len(), 2);
    assert!(Statistics::new().is_empty());
}

#[test]
fn empty_scope_matches_every_backend() {
    let backend = Groups::of(["hot", "eu"]);
    assert!(backend.scope_matches(&Groups::empty()));
    assert!(backend.scope_matches(&Groups::of(["eu"])));
    assert!(!backend.scope_matches(&Groups::of(["us"])));

    // A backend with no groups only matches the unscoped case.
    assert!(Groups::empty().scope_matches(&Groups::empty()));
    assert!(!Groups::empty().scope_matches(&Groups::of(["eu"])));
}

#[test]
fn aggregate_result_merges_groups_into_one() {
    let aggregate = AggregateResult {
        groups: vec![WriteResult::of(2), WriteResult::of(5)],
        errors: vec![RequestError::not_ready("cold")],
        statistics: Statistics::new(),
    };

    assert!(aggregate.is_degraded());
    assert_eq!(aggregate.merged().entries_written, 7);

    let empty = AggregateResult::<WriteResult>::empty();
    assert!(!empty.is_degraded());
    assert_eq!(empty.merged(), WriteResult::default());
}

#[test]
fn boundary_types_survive_serialization() {
    let s = series("cpu", &[("host", "a")]);
    let back: Series = serde_json::from_str(&serde_json::to_string(&s).unwrap()).unwrap();
    assert_eq!(back, s);

    let statistics = Statistics::of("rows-scanned", 4);
    let value = serde_json::to_value(&statistics).unwrap();
    assert_eq!(value, json!({ "rows-scanned": 4 }));

    let aggregate = AggregateResult {
        groups: vec![CountSeriesResult::of(2)],
        errors: vec![RequestError::from_backend_error(
            "cold",
            &BackendError::failure("timeout"),
        )],
        statistics,
    };
    let round: AggregateResult<CountSeriesResult> =
        serde_json::from_str(&serde_json::to_string(&aggregate).unwrap()).unwrap();
    assert_eq!(round, aggregate);
    assert_eq!(
        serde_json::to_value(&round.errors[0].kind).unwrap(),
        json!("backend-failure")
    );
}

#[test]
fn request_error_classifies_backend_errors() {
    let cancelled = RequestError::from_backend_error(
        "hot",
        &BackendError::Cancelled(crate::completion::CancelReason::Shutdown),
    );
    assert_eq!(cancelled.kind, super::ErrorKind::Cancelled);
    assert_eq!(cancelled.backend, "hot");

    let dropped = RequestError::from_backend_error("hot", &BackendError::RateLimitExceeded);
    assert_eq!(dropped.kind, super::ErrorKind::RateLimitExceeded);

    let failed = RequestError::from_backend_error("hot", &BackendError::failure("io"));
    assert_eq!(failed.kind, super::ErrorKind::BackendFailure);
}
