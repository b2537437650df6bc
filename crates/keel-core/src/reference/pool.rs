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

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::entry::PoolEntry;
use super::{Reference, ReferencePoolInfo};
use crate::error::{FrameworkError, Result};

/// A registry of per-type object pools.
///
/// The type map is guarded by its own lock, separate from the lock each entry
/// holds over its free queue, so operations on different types never contend
/// past the lookup.
///
/// # Example
///
/// ```rust
/// use keel_core::reference::{Reference, ReferencePool};
///
/// #[derive(Default)]
/// struct Hit { damage: u32 }
/// impl Reference for Hit {
///     fn clear(&mut self) { self.damage = 0; }
/// }
///
/// let pool = ReferencePool::new(false);
/// let mut hit = pool.acquire::<Hit>().unwrap();
/// hit.damage = 12;
/// pool.release(hit).unwrap();
///
/// let info = pool.info::<Hit>().unwrap();
/// assert_eq!(info.unused_count, 1);
/// assert_eq!(info.using_count, 0);
/// ```
pub struct ReferencePool {
    pools: RwLock<HashMap<TypeId, Arc<PoolEntry>>>,
    strict_check: AtomicBool,
}

impl ReferencePool {
    /// Creates an empty registry.
    ///
    /// With `strict_check` set, types must be registered before use and
    /// releases are checked against the free queue.
    pub fn new(strict_check: bool) -> Self {
        Self {
            pools: RwLock::new(HashMap::new()),
            strict_check: AtomicBool::new(strict_check),
        }
    }

    /// Returns `true` if strict checking is enabled.
    pub fn is_strict_check(&self) -> bool {
        self.strict_check.load(Ordering::Relaxed)
    }

    /// Toggles strict checking.
    pub fn set_strict_check(&self, enabled: bool) {
        self.strict_check.store(enabled, Ordering::Relaxed);
    }

    /// Returns the number of pool entries.
    pub fn count(&self) -> usize {
        self.pools.read().len()
    }

    /// Registers `T`, building new instances with `T::default`.
    ///
    /// Registering an already known type keeps the existing entry.
    pub fn register<T: Reference>(&self) {
        self.register_with::<T, _>(T::default);
    }

    /// Registers `T` with a custom factory used whenever the free queue is empty.
    pub fn register_with<T, F>(&self, factory: F)
    where
        T: Reference,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let mut pools = self.pools.write();
        if pools.contains_key(&TypeId::of::<T>()) {
            return;
        }
        log::info!("ReferencePool: registered {}", std::any::type_name::<T>());
        pools.insert(TypeId::of::<T>(), Arc::new(PoolEntry::new::<T, F>(factory)));
    }

    /// Takes an instance of `T` out of its pool, creating one if the queue is empty.
    ///
    /// ## Returns
    /// The instance, owned by the caller until it is handed back to [`release`](Self::release).
    ///
    /// # Errors
    ///
    /// [`FrameworkError::InvalidReferenceType`] if strict checking is on and
    /// `T` was never registered.
    pub fn acquire<T: Reference>(&self) -> Result<Box<T>> {
        log::trace!("ReferencePool: acquire {}", std::any::type_name::<T>());
        self.entry::<T>()?.acquire_typed::<T>()
    }

    /// Takes an instance out of the pool registered under `type_id`.
    ///
    /// Only registered types can be acquired this way, since the factory is
    /// the only way to build an instance without knowing its static type.
    pub fn acquire_by_type(&self, type_id: TypeId) -> Result<Box<dyn Any + Send>> {
        let entry = self.pools.read().get(&type_id).cloned().ok_or(
            FrameworkError::InvalidReferenceType {
                type_name: "<unregistered>",
            },
        )?;
        log::trace!("ReferencePool: acquire {}", entry.type_name());
        Ok(entry.acquire())
    }

    /// Clears `instance` and queues it back into its pool.
    ///
    /// # Errors
    ///
    /// [`FrameworkError::InvalidReferenceType`] if strict checking is on and
    /// `T` was never registered, [`FrameworkError::DuplicateRelease`] if strict
    /// checking finds the same instance already queued.
    ///
    /// ## Arguments
    /// * `instance` - The instance to clear and queue for reuse.
    pub fn release<T: Reference>(&self, instance: Box<T>) -> Result<()> {
        log::trace!("ReferencePool: release {}", std::any::type_name::<T>());
        let strict = self.is_strict_check();
        self.entry::<T>()?.release(instance, strict)
    }

    /// Queues back an instance obtained through [`acquire_by_type`](Self::acquire_by_type).
    pub fn release_by_type(&self, instance: Box<dyn Any + Send>) -> Result<()> {
        let type_id = (*instance).type_id();
        let entry = self.pools.read().get(&type_id).cloned().ok_or(
            FrameworkError::InvalidReferenceType {
                type_name: "<unregistered>",
            },
        )?;
        log::trace!("ReferencePool: release {}", entry.type_name());
        entry.release(instance, self.is_strict_check())
    }

    /// Pre-warms the pool of `T` with `count` fresh instances.
    pub fn add<T: Reference>(&self, count: usize) -> Result<()> {
        self.entry::<T>()?.add(count);
        Ok(())
    }

    /// Evicts up to `count` idle instances of `T`. In-use instances are never touched.
    ///
    /// Returns the number of instances actually evicted.
    pub fn remove<T: Reference>(&self, count: usize) -> Result<usize> {
        Ok(self.entry::<T>()?.remove(count))
    }

    /// Evicts every idle instance of `T`.
    pub fn remove_all<T: Reference>(&self) -> Result<usize> {
        Ok(self.entry::<T>()?.remove_all())
    }

    /// Drops every pool entry.
    ///
    /// Instances still held by callers survive, but their counters are gone
    /// and, under strict checking, releasing them fails until re-registration.
    pub fn clear_all(&self) {
        let mut pools = self.pools.write();
        log::debug!("ReferencePool: clearing {} pool(s)", pools.len());
        pools.clear();
    }

    /// Returns the counters of the pool for `T`, if it exists.
    pub fn info<T: Reference>(&self) -> Option<ReferencePoolInfo> {
        self.pools
            .read()
            .get(&TypeId::of::<T>())
            .map(|entry| entry.info())
    }

    /// Returns the counters of every pool, sorted by type name.
    pub fn infos(&self) -> Vec<ReferencePoolInfo> {
        let mut infos: Vec<_> = self.pools.read().values().map(|e| e.info()).collect();
        infos.sort_by(|a, b| a.type_name.cmp(b.type_name));
        infos
    }

    fn entry<T: Reference>(&self) -> Result<Arc<PoolEntry>> {
        if let Some(entry) = self.pools.read().get(&TypeId::of::<T>()) {
            return Ok(entry.clone());
        }

        if self.is_strict_check() {
            return Err(FrameworkError::InvalidReferenceType {
                type_name: std::any::type_name::<T>(),
            });
        }

        let mut pools = self.pools.write();
        let entry = pools
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Arc::new(PoolEntry::new::<T, _>(T::default)));
        Ok(entry.clone())
    }
}

impl Default for ReferencePool {
    fn default() -> Self {
        Self::new(false)
    }
}

impl std::fmt::Debug for ReferencePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferencePool")
            .field("count", &self.count())
            .field("strict_check", &self.is_strict_check())
            .finish()
    }
}
