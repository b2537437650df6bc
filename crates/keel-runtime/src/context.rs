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


use std::fmt;
use std::sync::Arc;

use keel_core::{FrameTime, FrameworkConfig, ReferencePool, Result};
use keel_event::{EventArgs, EventPool};
use keel_task::{Task, TaskPool};
use parking_lot::Mutex;

use crate::service::FrameworkService;

/// Entry in the service list, cached stage included.
struct ServiceEntry {
    service: Arc<Mutex<dyn FrameworkService>>,
    stage: crate::ServiceStage,
    name: &'static str,
}

/// Owns the shared reference pool and ticks every registered service.
pub struct FrameworkContext {
    config: FrameworkConfig,
    references: Arc<ReferencePool>,
    services: Vec<ServiceEntry>,
    shut_down: bool,
}

impl FrameworkContext {
    /// Creates a context whose reference pool follows `config`.
    pub fn new(config: FrameworkConfig) -> Self {
        let references = Arc::new(ReferencePool::new(config.strict_reference_check));
        log::info!(
            "FrameworkContext created (strict reference check: {}).",
            config.strict_reference_check
        );
        Self {
            config,
            references,
            services: Vec::new(),
            shut_down: false,
        }
    }

    /// The configuration this context was built from.
    pub fn config(&self) -> &FrameworkConfig {
        &self.config
    }

    /// The reference pool shared by every service of this context.
    pub fn references(&self) -> &Arc<ReferencePool> {
        &self.references
    }

    /// Returns the number of registered services.
    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Adds `service` to the tick list.
    ///
    /// Services run stage by stage, in registration order within a stage.
    pub fn register_service(&mut self, service: Arc<Mutex<dyn FrameworkService>>) {
        let (stage, name) = {
            let service = service.lock();
            (service.stage(), service.name())
        };
        log::info!("FrameworkContext: registered {name} ({stage:?}).");

        self.services.push(ServiceEntry {
            service,
            stage,
            name,
        });
        // Stable sort keeps registration order within a stage.
        self.services.sort_by_key(|entry| entry.stage);
    }

    /// Builds an event pool with the configured mode and registers it.
    pub fn add_event_pool<E: EventArgs>(&mut self) -> Arc<EventPool<E>> {
        let events = Arc::new(EventPool::new(
            self.references.clone(),
            self.config.event_mode,
        ));
        self.register_service(Arc::new(Mutex::new(events.clone())));
        events
    }

    /// Builds a task pool, registers it and returns it for adding agents and tasks.
    pub fn add_task_pool<T: Task>(&mut self) -> Arc<Mutex<TaskPool<T>>> {
        let tasks = Arc::new(Mutex::new(TaskPool::new(self.references.clone())));
        self.register_service(tasks.clone());
        tasks
    }

    /// Ticks every service once.
    ///
    /// ## Arguments
    /// * `time` - The logical and wall-clock time since the previous frame.
    ///
    /// A failing service does not stop the frame: the remaining services are
    /// still ticked and the first error is returned afterwards.
    pub fn update(&mut self, time: FrameTime) -> Result<()> {
        if self.shut_down {
            log::warn!("FrameworkContext: update called after shutdown, ignoring.");
            return Ok(());
        }

        let mut first_error = None;
        for entry in &self.services {
            let result = entry
                .service
                .lock()
                .update(time.elapsed, time.real_elapsed);
            if let Err(e) = result {
                log::error!("FrameworkContext: {} failed to update: {e}", entry.name);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Shuts every service down in stage order, then empties the reference pool.
    ///
    /// Calling it again does nothing.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        log::info!("FrameworkContext: shutting down {} service(s).", self.services.len());

        let mut first_error = None;
        for entry in &self.services {
            if let Err(e) = entry.service.lock().shutdown() {
                log::error!("FrameworkContext: {} failed to shut down: {e}", entry.name);
                first_error.get_or_insert(e);
            }
        }
        self.services.clear();
        self.references.clear_all();

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Drop for FrameworkContext {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::error!("FrameworkContext: shutdown on drop failed: {e}");
        }
    }
}

impl fmt::Debug for FrameworkContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let services: Vec<_> = self.services.iter().map(|entry| entry.name).collect();
        f.debug_struct("FrameworkContext")
            .field("config", &self.config)
            .field("services", &services)
            .field("shut_down", &self.shut_down)
            .finish()
    }
}
