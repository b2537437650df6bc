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

//! Workers that execute tasks on behalf of a task pool.

use std::time::Duration;

use crate::task::Task;

/// What happened when an agent was handed a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartTaskStatus {
    /// The task finished synchronously inside `start`.
    Done,
    /// The task was accepted and keeps running; it completes on a later tick.
    CanResume,
    /// The agent cannot take the task now; it stays waiting.
    HasToWait,
    /// The task cannot be run at all and is dropped.
    UnknownError,
}

/// A worker bound to at most one task at a time.
///
/// All methods are called from the tick driver's thread. An agent returning
/// [`StartTaskStatus::CanResume`] usually clones the task's
/// [`CompletionFlag`](crate::CompletionFlag) and finishes the work elsewhere.
pub trait TaskAgent<T: Task>: Send {
    /// Called once when the agent joins a pool.
    fn initialize(&mut self) {}

    /// Called every tick while the agent's task is running and not done.
    fn update(&mut self, _elapsed: Duration, _real_elapsed: Duration) {}

    /// Offers `task` to the agent.
    fn start(&mut self, task: &mut T) -> StartTaskStatus;

    /// Drops every reference to the current task and gets ready for the next.
    fn reset(&mut self);

    /// Called once when the pool shuts down.
    fn shutdown(&mut self) {}
}
