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


//! # Keel Task
//!
//! Schedules prioritized, pooled [`Task`]s onto a bounded set of
//! [`TaskAgent`]s. A [`TaskPool`] is driven by its `update` method: finished
//! tasks are drained, then waiting tasks are offered to free agents, highest
//! priority first.

#![warn(missing_docs)]

mod agent;
mod info;
mod pool;
mod task;

pub use self::agent::{StartTaskStatus, TaskAgent};
pub use self::info::{TaskInfo, TaskStatus};
pub use self::pool::TaskPool;
pub use self::task::{CompletionFlag, Task, TaskBase};
