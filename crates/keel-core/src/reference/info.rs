// Copyright 2025 eraflo
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

use serde::Serialize;

/// A snapshot of one pool entry's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReferencePoolInfo {
    /// The name of the pooled type.
    pub type_name: &'static str,
    /// Instances sitting in the free queue.
    pub unused_count: usize,
    /// Instances currently handed out.
    pub using_count: usize,
    /// Total number of acquisitions.
    pub acquire_count: usize,
    /// Total number of releases.
    pub release_count: usize,
    /// Total number of instances created, by pre-warming or because the queue was empty.
    pub add_count: usize,
    /// Total number of idle instances evicted.
    pub remove_count: usize,
}
