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

//! A process-wide registry of reusable objects, keyed by concrete type.
//!
//! Modules acquire instances from the [`ReferencePool`] instead of allocating
//! them, and release them once done. Every type gets its own pool entry with a
//! free queue and lifetime counters, created the first time the type is
//! registered or acquired.
//!
//! Ownership moves with the instance: [`ReferencePool::acquire`] hands out a
//! `Box<T>` and [`ReferencePool::release`] takes it back by value, so a released
//! instance can no longer be touched by the caller.
//!
//! ```compile_fail
//! use keel_core::reference::{Reference, ReferencePool};
//!
//! #[derive(Default)]
//! struct Payload(u32);
//! impl Reference for Payload {
//!     fn clear(&mut self) { self.0 = 0; }
//! }
//!
//! let pool = ReferencePool::new(false);
//! let payload = pool.acquire::<Payload>().unwrap();
//! pool.release(payload).unwrap();
//! pool.release(payload).unwrap(); // use of moved value
//! ```

mod entry;
mod info;
mod pool;

pub use self::info::ReferencePoolInfo;
pub use self::pool::ReferencePool;

/// The capability every pooled type must provide.
///
/// `Default` builds fresh instances when the free queue is empty, and
/// [`clear`](Reference::clear) resets an instance before it is queued back so
/// no state leaks to the next acquirer.
pub trait Reference: Default + Send + 'static {
    /// Resets every field to its default value.
    fn clear(&mut self);
}
