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

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use keel_core::{FrameworkError, ReferencePool, Result};

use crate::agent::{StartTaskStatus, TaskAgent};
use crate::info::TaskInfo;
use crate::task::Task;

/// An agent bound to the task it is running.
struct WorkingAgent<T: Task> {
    agent: Box<dyn TaskAgent<T>>,
    task: Box<T>,
}

/// Matches prioritized tasks against a bounded set of agents.
///
/// Driven once per tick through [`update`](Self::update): finished tasks are
/// drained first, then waiting tasks are offered to free agents in priority
/// order. Tasks are pooled and go back to the [`ReferencePool`] whenever they
/// leave the scheduler.
pub struct TaskPool<T: Task> {
    references: Arc<ReferencePool>,
    free_agents: Vec<Box<dyn TaskAgent<T>>>,
    working_agents: Vec<WorkingAgent<T>>,
    waiting_tasks: VecDeque<Box<T>>,
    paused: bool,
}

impl<T: Task> TaskPool<T> {
    /// Creates an empty task pool releasing tasks into `references`.
    pub fn new(references: Arc<ReferencePool>) -> Self {
        references.register::<T>();
        Self {
            references,
            free_agents: Vec::new(),
            working_agents: Vec::new(),
            waiting_tasks: VecDeque::new(),
            paused: false,
        }
    }

    /// Returns `true` while updates are suspended.
    pub fn paused(&self) -> bool {
        self.paused
    }

    /// Suspends or resumes updates.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Suspends updates.
    pub fn pause(&mut self) {
        self.set_paused(true);
    }

    /// Resumes updates.
    pub fn resume(&mut self) {
        self.set_paused(false);
    }

    /// Returns the number of agents, free or working.
    pub fn total_agent_count(&self) -> usize {
        self.free_agents.len() + self.working_agents.len()
    }

    /// Returns the number of idle agents.
    pub fn free_agent_count(&self) -> usize {
        self.free_agents.len()
    }

    /// Returns the number of agents bound to a task.
    pub fn working_agent_count(&self) -> usize {
        self.working_agents.len()
    }

    /// Returns the number of tasks waiting for an agent.
    pub fn waiting_task_count(&self) -> usize {
        self.waiting_tasks.len()
    }

    /// Initializes `agent` and adds it to the free agents.
    pub fn add_agent(&mut self, mut agent: Box<dyn TaskAgent<T>>) {
        agent.initialize();
        self.free_agents.push(agent);
        log::debug!(
            "TaskPool<{}>: agent added ({} total).",
            std::any::type_name::<T>(),
            self.total_agent_count()
        );
    }

    /// Queues `task` behind every waiting task of greater or equal priority.
    ///
    /// ## Arguments
    /// * `task` - A pooled task whose serial id is not scheduled yet.
    ///
    /// # Errors
    ///
    /// [`FrameworkError::InvalidArgument`] if a task with the same serial id is
    /// already scheduled. The rejected task goes back to the reference pool.
    pub fn add_task(&mut self, task: Box<T>) -> Result<()> {
        let serial_id = task.serial_id();
        if self.contains(serial_id) {
            self.references.release(task)?;
            return Err(FrameworkError::InvalidArgument(format!(
                "task {serial_id} is already scheduled"
            )));
        }

        let priority = task.priority();
        let index = self
            .waiting_tasks
            .iter()
            .rposition(|waiting| waiting.priority() >= priority)
            .map_or(0, |i| i + 1);
        self.waiting_tasks.insert(index, task);
        log::trace!("TaskPool: task {serial_id} queued at position {index}.");
        Ok(())
    }

    /// Cancels the task with `serial_id`, waiting or running.
    ///
    /// A running task's agent is reset and freed.
    /// ## Returns
    /// `false` if no such task is scheduled.
    pub fn remove_task(&mut self, serial_id: u64) -> Result<bool> {
        if let Some(index) = self
            .waiting_tasks
            .iter()
            .position(|task| task.serial_id() == serial_id)
        {
            if let Some(task) = self.waiting_tasks.remove(index) {
                self.references.release(task)?;
            }
            log::debug!("TaskPool: removed waiting task {serial_id}.");
            return Ok(true);
        }

        if let Some(index) = self
            .working_agents
            .iter()
            .position(|working| working.task.serial_id() == serial_id)
        {
            self.cancel_working(index)?;
            log::debug!("TaskPool: cancelled running task {serial_id}.");
            return Ok(true);
        }

        Ok(false)
    }

    /// Cancels every task carrying `tag`. Returns how many were removed.
    pub fn remove_tasks(&mut self, tag: &str) -> Result<usize> {
        let mut count = 0;

        let mut index = 0;
        while index < self.waiting_tasks.len() {
            if self.waiting_tasks[index].tag() != Some(tag) {
                index += 1;
                continue;
            }
            if let Some(task) = self.waiting_tasks.remove(index) {
                self.references.release(task)?;
                count += 1;
            }
        }

        let mut index = 0;
        while index < self.working_agents.len() {
            if self.working_agents[index].task.tag() != Some(tag) {
                index += 1;
                continue;
            }
            self.cancel_working(index)?;
            count += 1;
        }

        log::debug!("TaskPool: removed {count} task(s) tagged '{tag}'.");
        Ok(count)
    }

    /// Cancels every task. Returns how many were removed.
    pub fn remove_all_tasks(&mut self) -> Result<usize> {
        let mut count = 0;
        while let Some(task) = self.waiting_tasks.pop_front() {
            self.references.release(task)?;
            count += 1;
        }
        while !self.working_agents.is_empty() {
            self.cancel_working(0)?;
            count += 1;
        }
        Ok(count)
    }

    /// Returns a snapshot of the task with `serial_id`.
    pub fn task_info(&self, serial_id: u64) -> Option<TaskInfo> {
        self.all_task_infos()
            .into_iter()
            .find(|info| info.serial_id == serial_id)
    }

    /// Returns snapshots of every task carrying `tag`.
    pub fn task_infos(&self, tag: &str) -> Vec<TaskInfo> {
        self.all_task_infos()
            .into_iter()
            .filter(|info| info.tag.as_deref() == Some(tag))
            .collect()
    }

    /// Returns snapshots of every task: running ones first, then waiting ones
    /// in queue order.
    pub fn all_task_infos(&self) -> Vec<TaskInfo> {
        self.working_agents
            .iter()
            .map(|working| TaskInfo::working(working.task.as_ref()))
            .chain(
                self.waiting_tasks
                    .iter()
                    .map(|task| TaskInfo::waiting(task.as_ref())),
            )
            .collect()
    }

    /// Drains finished tasks, then dispatches waiting tasks to free agents.
    ///
    /// Does nothing while paused.
    ///
    /// # Errors
    ///
    /// [`FrameworkError::UnknownTaskError`] if an agent rejects a task as
    /// unrecoverable. The task is released and its agent freed before the
    /// error is returned; remaining waiting tasks are tried on the next tick.
    pub fn update(&mut self, elapsed: Duration, real_elapsed: Duration) -> Result<()> {
        if self.paused {
            return Ok(());
        }

        self.process_running_tasks(elapsed, real_elapsed)?;
        self.process_waiting_tasks()
    }

    /// Cancels every task, then shuts every agent down.
    pub fn shutdown(&mut self) -> Result<()> {
        let removed = self.remove_all_tasks()?;
        for mut agent in self.free_agents.drain(..) {
            agent.shutdown();
        }
        log::info!(
            "TaskPool<{}> shut down ({removed} task(s) cancelled).",
            std::any::type_name::<T>()
        );
        Ok(())
    }

    fn contains(&self, serial_id: u64) -> bool {
        self.waiting_tasks
            .iter()
            .any(|task| task.serial_id() == serial_id)
            || self
                .working_agents
                .iter()
                .any(|working| working.task.serial_id() == serial_id)
    }

    fn cancel_working(&mut self, index: usize) -> Result<()> {
        let WorkingAgent { mut agent, task } = self.working_agents.remove(index);
        agent.reset();
        self.free_agents.push(agent);
        self.references.release(task)
    }

    fn process_running_tasks(&mut self, elapsed: Duration, real_elapsed: Duration) -> Result<()> {
        let mut index = 0;
        while index < self.working_agents.len() {
            if !self.working_agents[index].task.done() {
                self.working_agents[index]
                    .agent
                    .update(elapsed, real_elapsed);
                index += 1;
                continue;
            }

            let WorkingAgent { mut agent, task } = self.working_agents.remove(index);
            log::debug!("TaskPool: task {} done.", task.serial_id());
            agent.reset();
            self.free_agents.push(agent);
            self.references.release(task)?;
        }
        Ok(())
    }

    fn process_waiting_tasks(&mut self) -> Result<()> {
        let mut index = 0;
        while index < self.waiting_tasks.len() {
            let Some(mut agent) = self.free_agents.pop() else {
                break;
            };

            let status = agent.start(&mut self.waiting_tasks[index]);
            if status == StartTaskStatus::HasToWait {
                agent.reset();
                self.free_agents.push(agent);
                index += 1;
                continue;
            }

            let Some(task) = self.waiting_tasks.remove(index) else {
                self.free_agents.push(agent);
                break;
            };

            match status {
                StartTaskStatus::CanResume => {
                    log::debug!("TaskPool: task {} started.", task.serial_id());
                    self.working_agents.push(WorkingAgent { agent, task });
                }
                StartTaskStatus::Done => {
                    log::debug!("TaskPool: task {} finished on start.", task.serial_id());
                    agent.reset();
                    self.free_agents.push(agent);
                    self.references.release(task)?;
                }
                StartTaskStatus::UnknownError | StartTaskStatus::HasToWait => {
                    let error = FrameworkError::UnknownTaskError {
                        serial_id: task.serial_id(),
                        description: task.description(),
                    };
                    agent.reset();
                    self.free_agents.push(agent);
                    self.references.release(task)?;
                    log::error!("TaskPool: {error}");
                    return Err(error);
                }
            }
        }
        Ok(())
    }
}

impl<T: Task> fmt::Debug for TaskPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskPool")
            .field("paused", &self.paused)
            .field("free_agents", &self.free_agents.len())
            .field("working_agents", &self.working_agents.len())
            .field("waiting_tasks", &self.waiting_tasks.len())
            .finish()
    }
}
