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


use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use keel_core::{FrameTime, FrameworkConfig, Reference};
use keel_event::{handler, EventArgs, EventSender};
use keel_runtime::FrameworkContext;
use keel_task::{StartTaskStatus, Task, TaskAgent, TaskBase, TaskStatus};

const LEVEL_REQUESTED: i32 = 1;

#[derive(Debug, Default)]
struct LevelRequested {
    priority: i32,
}

impl Reference for LevelRequested {
    fn clear(&mut self) {
        self.priority = 0;
    }
}

impl EventArgs for LevelRequested {
    fn id(&self) -> i32 {
        LEVEL_REQUESTED
    }
}

#[derive(Debug, Default)]
struct LoadLevel {
    base: TaskBase,
}

impl Reference for LoadLevel {
    fn clear(&mut self) {
        self.base.clear();
    }
}

impl Task for LoadLevel {
    fn base(&self) -> &TaskBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut TaskBase {
        &mut self.base
    }
}

/// Accepts a task and finishes it on the agent's next update.
#[derive(Default)]
struct DeferredAgent {
    current: Option<keel_task::CompletionFlag>,
}

impl TaskAgent<LoadLevel> for DeferredAgent {
    fn update(&mut self, _: std::time::Duration, _: std::time::Duration) {
        if let Some(completion) = &self.current {
            completion.complete();
        }
    }

    fn start(&mut self, task: &mut LoadLevel) -> StartTaskStatus {
        self.current = Some(task.base().completion());
        StartTaskStatus::CanResume
    }

    fn reset(&mut self) {
        self.current = None;
    }
}

#[test]
fn events_schedule_tasks_that_finish_on_later_frames() {
    // --- 1. ARRANGE ---
    let config = FrameworkConfig {
        strict_reference_check: true,
        ..FrameworkConfig::default()
    };
    let mut context = FrameworkContext::new(config);
    let references = context.references().clone();
    // Registered first on purpose: the event stage still runs before it.
    let tasks = context.add_task_pool::<LoadLevel>();
    let events = context.add_event_pool::<LevelRequested>();
    tasks.lock().add_agent(Box::new(DeferredAgent::default()));

    {
        let tasks = tasks.clone();
        let references = references.clone();
        let serial = AtomicU64::new(1);
        events
            .subscribe(
                LEVEL_REQUESTED,
                handler(move |_, e: &LevelRequested| {
                    let mut task = references
                        .acquire::<LoadLevel>()
                        .expect("task type is registered");
                    let serial_id = serial.fetch_add(1, Ordering::SeqCst);
                    task.base_mut()
                        .initialize(serial_id, Some("level"), e.priority, None);
                    tasks.lock().add_task(task).expect("serial ids are unique");
                }),
            )
            .unwrap();
    }

    let mut request = references.acquire::<LevelRequested>().unwrap();
    request.priority = 3;
    events.fire(EventSender::none(), request).unwrap();

    // --- 2. ACT & ASSERT ---
    // Frame 1: the event schedules the task, the task stage starts it.
    context.update(FrameTime::default()).unwrap();
    let info = tasks.lock().task_info(1).expect("task was scheduled");
    assert_eq!(info.status, TaskStatus::Doing);
    assert_eq!(info.priority, 3);

    // Frame 2: the agent completes it during its update.
    context.update(FrameTime::default()).unwrap();
    assert_eq!(tasks.lock().task_info(1).map(|i| i.status), Some(TaskStatus::Done));

    // Frame 3: the finished task is drained.
    context.update(FrameTime::default()).unwrap();
    assert!(tasks.lock().all_task_infos().is_empty());

    // --- 3. SHUTDOWN ---
    context.shutdown().unwrap();
    assert_eq!(events.count(LEVEL_REQUESTED), 0);
    assert_eq!(tasks.lock().total_agent_count(), 0);
    assert_eq!(references.count(), 0, "shutdown empties the reference pool");
}

#[test]
fn shutdown_releases_pending_events_and_tasks() {
    let mut context = FrameworkContext::new(FrameworkConfig::default());
    let references = context.references().clone();
    let events = context.add_event_pool::<LevelRequested>();
    let tasks = context.add_task_pool::<LoadLevel>();

    let request = references.acquire::<LevelRequested>().unwrap();
    events.fire(EventSender::none(), request).unwrap();
    let mut task = references.acquire::<LoadLevel>().unwrap();
    task.base_mut().initialize(7, None, 0, None);
    tasks.lock().add_task(task).unwrap();

    let before: Vec<_> = references.infos();
    assert!(before.iter().any(|info| info.using_count > 0));

    context.shutdown().unwrap();

    assert_eq!(events.event_count(), 0);
    assert_eq!(tasks.lock().waiting_task_count(), 0);
    assert_eq!(references.count(), 0);
}
