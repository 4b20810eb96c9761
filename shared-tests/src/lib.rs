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

use tessera_core::interface::MetadataBackend;

pub mod contract;

#[cfg(test)]
mod in_memory;

/// Hook for running the backend contract suite against a concrete store.
#[async_trait]
pub trait BackendTestConfig {
    async fn create_backend(&self) -> Arc<dyn MetadataBackend>;
}
