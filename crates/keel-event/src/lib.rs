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

//! # Keel Event
//!
//! A generic publish/subscribe bus. Payloads implement [`EventArgs`] and are
//! drawn from the shared [`ReferencePool`](keel_core::ReferencePool); they are
//! either queued with [`EventPool::fire`] and delivered on the next
//! [`EventPool::update`], or delivered on the spot with [`EventPool::fire_now`].
//!
//! Within one event id, handlers run in subscription order. Nothing is
//! guaranteed about the relative order of different ids.

#![warn(missing_docs)]

mod args;
mod event;
mod pool;

pub use self::args::{handler, EventArgs, EventHandler, EventSender};
pub use self::pool::EventPool;
