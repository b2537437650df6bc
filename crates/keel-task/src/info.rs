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

use crate::task::Task;

/// Where a task is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskStatus {
    /// Waiting for a free agent.
    Todo,
    /// Bound to an agent and still running.
    Doing,
    /// Completed, to be drained on the next tick.
    Done,
}

/// A read-only snapshot of a scheduled task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskInfo {
    /// The task's serial id.
    pub serial_id: u64,
    /// The task's grouping label.
    pub tag: Option<String>,
    /// The task's priority.
    pub priority: i32,
    /// The lifecycle status at snapshot time.
    pub status: TaskStatus,
    /// The task's description.
    pub description: String,
}

impl TaskInfo {
    pub(crate) fn waiting<T: Task>(task: &T) -> Self {
        Self::new(task, TaskStatus::Todo)
    }

    pub(crate) fn working<T: Task>(task: &T) -> Self {
        let status = if task.done() {
            TaskStatus::Done
        } else {
            TaskStatus::Doing
        };
        Self::new(task, status)
    }

    fn new<T: Task>(task: &T, status: TaskStatus) -> Self {
        Self {
            serial_id: task.serial_id(),
            tag: task.tag().map(str::to_owned),
            priority: task.priority(),
            status,
            description: task.description(),
        }
    }
}
