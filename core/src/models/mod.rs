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

mod aggregate;
mod filter;
mod requests;
mod results;
mod series;
mod statistics;

#[cfg(test)]
mod tests;

pub use aggregate::AggregateItem;
pub use aggregate::AggregateResult;
pub use aggregate::ErrorKind;
pub use aggregate::RequestError;
pub use filter::TagFilter;
pub use requests::EntriesRequest;
pub use requests::FindRequest;
pub use requests::WriteRequest;
pub use results::CountSeriesResult;
pub use results::DeleteSeriesResult;
pub use results::FindKeysResult;
pub use results::FindSeriesIdsResult;
pub use results::FindSeriesResult;
pub use results::FindTagsResult;
pub use results::MergeResults;
pub use results::WriteResult;
pub use series::DataPoint;
pub use series::Entry;
pub use series::Series;
pub use statistics::Groups;
pub use statistics::Statistics;
