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


//! The contract between the tick driver and the pools it updates.

use std::sync::Arc;
use std::time::Duration;

use keel_core::Result;
use keel_event::{EventArgs, EventPool};
use keel_task::{Task, TaskPool};

/// When a service is ticked within one frame.
///
/// Stages run in declaration order; services sharing a stage run in
/// registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ServiceStage {
    /// Queued events are dispatched.
    Events,
    /// Finished tasks are drained and waiting tasks dispatched.
    Tasks,
}

/// A subsystem ticked by the [`FrameworkContext`](crate::FrameworkContext).
pub trait FrameworkService: Send {
    /// A name used in logs.
    fn name(&self) -> &'static str;

    /// The stage this service runs in.
    fn stage(&self) -> ServiceStage;

    /// Advances the service by one frame.
    fn update(&mut self, elapsed: Duration, real_elapsed: Duration) -> Result<()>;

    /// Releases everything the service holds. Called once, in stage order.
    fn shutdown(&mut self) -> Result<()>;
}

// Event pools are shared with producer threads, so the service is the `Arc`.
impl<E: EventArgs> FrameworkService for Arc<EventPool<E>> {
    fn name(&self) -> &'static str {
        std::any::type_name::<EventPool<E>>()
    }

    fn stage(&self) -> ServiceStage {
        ServiceStage::Events
    }

    fn update(&mut self, elapsed: Duration, real_elapsed: Duration) -> Result<()> {
        EventPool::update(self, elapsed, real_elapsed)
    }

    fn shutdown(&mut self) -> Result<()> {
        EventPool::shutdown(self);
        Ok(())
    }
}

impl<T: Task> FrameworkService for TaskPool<T> {
    fn name(&self) -> &'static str {
        std::any::type_name::<TaskPool<T>>()
    }

    fn stage(&self) -> ServiceStage {
        ServiceStage::Tasks
    }

    fn update(&mut self, elapsed: Duration, real_elapsed: Duration) -> Result<()> {
        TaskPool::update(self, elapsed, real_elapsed)
    }

    fn shutdown(&mut self) -> Result<()> {
        TaskPool::shutdown(self)
    }
}
