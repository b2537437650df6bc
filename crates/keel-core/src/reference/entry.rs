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

use std::any::Any;
use std::collections::VecDeque;

use parking_lot::Mutex;

use super::{Reference, ReferencePoolInfo};
use crate::error::{FrameworkError, Result};

type Instance = Box<dyn Any + Send>;
type Factory = Box<dyn Fn() -> Instance + Send + Sync>;

/// Bookkeeping for one pooled type: the free queue plus lifetime counters.
pub(super) struct PoolEntry {
    type_name: &'static str,
    factory: Factory,
    clear: fn(&mut (dyn Any + Send)),
    state: Mutex<EntryState>,
}

#[derive(Default)]
struct EntryState {
    free: VecDeque<Instance>,
    using_count: usize,
    acquire_count: usize,
    release_count: usize,
    add_count: usize,
    remove_count: usize,
}

impl PoolEntry {
    pub(super) fn new<T, F>(factory: F) -> Self
    where
        T: Reference,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            type_name: std::any::type_name::<T>(),
            factory: Box::new(move || Box::new(factory())),
            clear: |instance| {
                if let Some(typed) = instance.downcast_mut::<T>() {
                    typed.clear();
                }
            },
            state: Mutex::new(EntryState::default()),
        }
    }

    pub(super) fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(super) fn acquire(&self) -> Instance {
        let reused = {
            let mut state = self.state.lock();
            state.using_count += 1;
            state.acquire_count += 1;
            let reused = state.free.pop_front();
            if reused.is_none() {
                state.add_count += 1;
            }
            reused
        };

        reused.unwrap_or_else(|| (self.factory)())
    }

    pub(super) fn acquire_typed<T: Reference>(&self) -> Result<Box<T>> {
        self.acquire()
            .downcast::<T>()
            .map_err(|_| FrameworkError::InvalidReferenceType {
                type_name: std::any::type_name::<T>(),
            })
    }

    /// Returns `true` if the allocation at `address` sits in the free queue.
    pub(super) fn is_queued(&self, address: *const ()) -> bool {
        self.state
            .lock()
            .free
            .iter()
            .any(|queued| instance_address(queued) == address)
    }

    /// Queues a cleared instance back.
    ///
    /// With `strict` set, an instance whose address is already queued is
    /// rejected untouched and forgotten, since the queue already owns that
    /// allocation.
    pub(super) fn release(&self, mut instance: Instance, strict: bool) -> Result<()> {
        if strict && self.is_queued(instance_address(&instance)) {
            std::mem::forget(instance);
            return Err(FrameworkError::DuplicateRelease {
                type_name: self.type_name,
            });
        }

        (self.clear)(instance.as_mut());

        let mut state = self.state.lock();
        state.free.push_back(instance);
        state.release_count += 1;
        state.using_count = state.using_count.saturating_sub(1);
        Ok(())
    }

    pub(super) fn add(&self, count: usize) {
        let created: Vec<Instance> = (0..count).map(|_| (self.factory)()).collect();
        let mut state = self.state.lock();
        state.add_count += count;
        state.free.extend(created);
    }

    /// Evicts up to `count` idle instances. Returns how many were dropped.
    pub(super) fn remove(&self, count: usize) -> usize {
        let evicted: Vec<Instance> = {
            let mut state = self.state.lock();
            let count = count.min(state.free.len());
            state.remove_count += count;
            state.free.drain(..count).collect()
        };
        evicted.len()
    }

    pub(super) fn remove_all(&self) -> usize {
        self.remove(usize::MAX)
    }

    pub(super) fn info(&self) -> ReferencePoolInfo {
        let state = self.state.lock();
        ReferencePoolInfo {
            type_name: self.type_name,
            unused_count: state.free.len(),
            using_count: state.using_count,
            acquire_count: state.acquire_count,
            release_count: state.release_count,
            add_count: state.add_count,
            remove_count: state.remove_count,
        }
    }
}

fn instance_address(instance: &Instance) -> *const () {
    instance.as_ref() as *const (dyn Any + Send) as *const ()
}
