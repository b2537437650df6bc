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

//! Framework configuration.
//!
//! Everything here has a sensible default so a missing or partial JSON file
//! still yields a usable [`FrameworkConfig`].

mod event_mode;

pub use self::event_mode::{EventPoolFlag, EventPoolMode};

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{FrameworkError, Result};

const DEFAULT_TICK_INTERVAL_MS: u64 = 16;
const DEFAULT_AGENT_COUNT: usize = 4;

/// Top-level settings consumed when building a framework context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkConfig {
    /// Enables type and double-release validation in the reference pool.
    pub strict_reference_check: bool,
    /// Handler policy applied to event pools built from this config.
    pub event_mode: EventPoolMode,
    /// Target duration of one logical tick, in milliseconds.
    pub tick_interval_ms: u64,
    /// Number of task agents to spawn per task pool.
    pub agent_count: usize,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            strict_reference_check: false,
            event_mode: EventPoolMode::DEFAULT,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            agent_count: DEFAULT_AGENT_COUNT,
        }
    }
}

impl FrameworkConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| FrameworkError::Config(format!("invalid JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            FrameworkError::Config(format!("failed to read '{}': {e}", path.display()))
        })?;
        log::info!("Loading framework configuration from '{}'", path.display());
        Self::from_json_str(&json)
    }

    /// Checks that every value is within range.
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(FrameworkError::InvalidArgument(
                "tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.agent_count == 0 {
            return Err(FrameworkError::InvalidArgument(
                "agent_count must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The tick interval as a [`Duration`].
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
