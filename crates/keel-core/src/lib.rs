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

//! # Keel Core
//!
//! Foundational crate shared by the event pool, the task pool and the runtime:
//! the reference (object) pool, the ordered multi-map, the error taxonomy and
//! the framework configuration.

#![warn(missing_docs)]

pub mod collections;
pub mod config;
pub mod error;
pub mod reference;
pub mod time;

pub use config::{EventPoolMode, FrameworkConfig};
pub use error::{FrameworkError, Result};
pub use reference::{Reference, ReferencePool};
pub use time::{FrameClock, FrameTime};
