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


//! # Keel Runtime
//!
//! Wires the framework together. A [`FrameworkContext`] owns the shared
//! [`ReferencePool`](keel_core::ReferencePool), builds event and task pools
//! from a [`FrameworkConfig`](keel_core::FrameworkConfig) and ticks every
//! registered [`FrameworkService`] once per frame.

#![warn(missing_docs)]

mod context;
mod service;

pub use self::context::FrameworkContext;
pub use self::service::{FrameworkService, ServiceStage};
