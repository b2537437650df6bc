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

//! The task capability and the state every task carries.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use keel_core::Reference;

/// A shareable "this task is finished" signal.
///
/// Agents clone it out of the task they start so work running elsewhere can
/// complete the task later; the scheduler only observes it on its next tick.
#[derive(Debug, Clone, Default)]
pub struct CompletionFlag(Arc<AtomicBool>);

impl CompletionFlag {
    /// Marks the task as done.
    pub fn complete(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns `true` once [`complete`](Self::complete) has been called.
    pub fn is_complete(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Fields shared by every task: identity, grouping, priority and completion.
///
/// Clearing a task installs a fresh [`CompletionFlag`], so work that kept a
/// clone of the old flag can never complete a recycled task.
#[derive(Default)]
pub struct TaskBase {
    serial_id: u64,
    tag: Option<String>,
    priority: i32,
    user_data: Option<Arc<dyn Any + Send + Sync>>,
    description: String,
    completion: CompletionFlag,
}

impl TaskBase {
    /// Fills in the scheduling fields of a freshly acquired task.
    pub fn initialize(
        &mut self,
        serial_id: u64,
        tag: Option<&str>,
        priority: i32,
        user_data: Option<Arc<dyn Any + Send + Sync>>,
    ) {
        self.serial_id = serial_id;
        self.tag = tag.map(str::to_owned);
        self.priority = priority;
        self.user_data = user_data;
    }

    /// The serial id, unique among scheduled tasks.
    pub fn serial_id(&self) -> u64 {
        self.serial_id
    }

    /// The grouping label, if any.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// The priority; higher values are scheduled sooner.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Arbitrary data attached by whoever scheduled the task.
    pub fn user_data(&self) -> Option<&Arc<dyn Any + Send + Sync>> {
        self.user_data.as_ref()
    }

    /// A human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Replaces the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Returns a handle that completes this task.
    pub fn completion(&self) -> CompletionFlag {
        self.completion.clone()
    }

    /// Returns `true` once the task has been completed.
    pub fn is_done(&self) -> bool {
        self.completion.is_complete()
    }

    /// Resets every field, including the completion flag.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Debug for TaskBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskBase")
            .field("serial_id", &self.serial_id)
            .field("tag", &self.tag)
            .field("priority", &self.priority)
            .field("user_data", &self.user_data.is_some())
            .field("description", &self.description)
            .field("done", &self.is_done())
            .finish()
    }
}

/// A schedulable, pooled unit of work.
pub trait Task: Reference {
    /// The shared task fields.
    fn base(&self) -> &TaskBase;

    /// The shared task fields, mutably.
    fn base_mut(&mut self) -> &mut TaskBase;

    /// See [`TaskBase::serial_id`].
    fn serial_id(&self) -> u64 {
        self.base().serial_id()
    }

    /// See [`TaskBase::tag`].
    fn tag(&self) -> Option<&str> {
        self.base().tag()
    }

    /// See [`TaskBase::priority`].
    fn priority(&self) -> i32 {
        self.base().priority()
    }

    /// See [`TaskBase::is_done`].
    fn done(&self) -> bool {
        self.base().is_done()
    }

    /// A human-readable description, reported in task infos.
    fn description(&self) -> String {
        self.base().description().to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_detaches_outstanding_completion_handles() {
        let mut base = TaskBase::default();
        base.initialize(7, Some("io"), 3, None);
        let stale = base.completion();

        base.clear();
        stale.complete();

        assert!(!base.is_done());
        assert_eq!(base.serial_id(), 0);
        assert_eq!(base.tag(), None);
    }

    #[test]
    fn completion_handle_marks_the_task_done() {
        let mut base = TaskBase::default();
        base.initialize(1, None, 0, Some(Arc::new(42u32)));
        base.completion().complete();

        assert!(base.is_done());
        let data = base.user_data().and_then(|d| d.downcast_ref::<u32>());
        assert_eq!(data, Some(&42));
    }
}
