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

//! Backend contract suite: behaviors every [`MetadataBackend`] implementation
//! must exhibit, written against the trait only.
//!
//! [`MetadataBackend`]: tessera_core::interface::MetadataBackend

pub mod deletion;
pub mod filtering;
pub mod round_trip;
pub mod streaming;

use std::sync::Arc;

use tessera_core::interface::MetadataBackend;
use tessera_core::models::{DataPoint, Series, WriteRequest};

use crate::BackendTestConfig;

pub(crate) async fn seeded_backend(
    config: &(impl BackendTestConfig + Send + Sync),
) -> Arc<dyn MetadataBackend> {
    let backend = config.create_backend().await;
    let writes = [
        ("cpu", vec![("host", "a"), ("site", "lon")], 2),
        ("cpu", vec![("host", "b"), ("site", "sto")], 1),
        ("mem", vec![("host", "a"), ("site", "lon")], 3),
    ];
    for (key, tags, points) in writes {
        let series = tags
            .into_iter()
            .fold(Series::new(key), |s, (k, v)| s.with_tag(k, v));
        let points = (0..points)
            .map(|i| DataPoint::new(1_000 * i as u64, i as f64))
            .collect();
        backend
            .write(WriteRequest::new(series, points))
            .await
            .into_result()
            .expect("seed write must resolve");
    }
    backend
}
