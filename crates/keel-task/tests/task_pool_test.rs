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


use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use keel_core::{Reference, ReferencePool};
use keel_task::{StartTaskStatus, Task, TaskAgent, TaskBase, TaskPool, TaskStatus};

#[derive(Debug, Default)]
struct DownloadTask {
    base: TaskBase,
    bytes: usize,
}

impl Reference for DownloadTask {
    fn clear(&mut self) {
        self.base.clear();
        self.bytes = 0;
    }
}

impl Task for DownloadTask {
    fn base(&self) -> &TaskBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut TaskBase {
        &mut self.base
    }
}

/// Agent completing its task from a worker thread after `delay`.
#[derive(Default)]
struct ThreadAgent {
    delay: Duration,
    worker: Option<JoinHandle<()>>,
}

impl TaskAgent<DownloadTask> for ThreadAgent {
    fn start(&mut self, task: &mut DownloadTask) -> StartTaskStatus {
        if task.bytes == 0 {
            return StartTaskStatus::Done;
        }
        let completion = task.base().completion();
        let delay = self.delay;
        self.worker = Some(thread::spawn(move || {
            thread::sleep(delay);
            completion.complete();
        }));
        StartTaskStatus::CanResume
    }

    fn reset(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn schedule(
    references: &ReferencePool,
    pool: &mut TaskPool<DownloadTask>,
    serial_id: u64,
    priority: i32,
    bytes: usize,
) {
    let mut task = references
        .acquire::<DownloadTask>()
        .expect("task type is registered by the task pool");
    task.base_mut().initialize(serial_id, Some("download"), priority, None);
    task.bytes = bytes;
    pool.add_task(task).expect("serial ids are unique");
}

fn tick_until_idle(pool: &mut TaskPool<DownloadTask>) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while pool.waiting_task_count() > 0 || pool.working_agent_count() > 0 {
        assert!(Instant::now() < deadline, "tasks never finished: {pool:?}");
        pool.update(Duration::from_millis(1), Duration::from_millis(1))
            .expect("no agent reports an unknown error");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn tasks_completed_on_worker_threads_are_drained() {
    // --- 1. ARRANGE ---
    let references = Arc::new(ReferencePool::new(true));
    let mut pool = TaskPool::<DownloadTask>::new(references.clone());
    for _ in 0..2 {
        pool.add_agent(Box::new(ThreadAgent {
            delay: Duration::from_millis(5),
            worker: None,
        }));
    }
    for (serial_id, priority) in [(1, 5), (2, 1), (3, 9), (4, 1)] {
        schedule(&references, &mut pool, serial_id, priority, 64);
    }

    let order: Vec<u64> = pool.all_task_infos().iter().map(|i| i.serial_id).collect();
    assert_eq!(order, vec![3, 1, 2, 4]);

    // --- 2. ACT ---
    pool.update(Duration::ZERO, Duration::ZERO).unwrap();

    // --- 3. ASSERT ---
    let started: Vec<_> = pool
        .all_task_infos()
        .into_iter()
        .filter(|i| i.status != TaskStatus::Todo)
        .map(|i| i.serial_id)
        .collect();
    assert_eq!(started, vec![3, 1], "the two highest priorities start first");

    tick_until_idle(&mut pool);
    assert!(pool.all_task_infos().is_empty());
    assert_eq!(pool.free_agent_count(), 2);

    let info = references.info::<DownloadTask>().expect("task pool exists");
    assert_eq!(info.using_count, 0, "every task goes back to the pool");
    assert_eq!(info.release_count, 4);
}

#[test]
fn cancelled_tasks_ignore_late_completion() {
    let references = Arc::new(ReferencePool::new(true));
    let mut pool = TaskPool::<DownloadTask>::new(references.clone());
    pool.add_agent(Box::new(ThreadAgent::default()));

    schedule(&references, &mut pool, 1, 0, 1024);
    pool.update(Duration::ZERO, Duration::ZERO).unwrap();
    assert_eq!(pool.working_agent_count(), 1);

    assert!(pool.remove_task(1).unwrap());

    // The recycled task must not inherit the cancelled run's completion.
    schedule(&references, &mut pool, 2, 0, 0);
    let info = pool.task_info(2).expect("task 2 is waiting");
    assert_eq!(info.status, TaskStatus::Todo);

    pool.update(Duration::ZERO, Duration::ZERO).unwrap();
    assert!(pool.task_info(2).is_none(), "zero-byte task finishes on start");
    assert_eq!(references.info::<DownloadTask>().unwrap().using_count, 0);
}
