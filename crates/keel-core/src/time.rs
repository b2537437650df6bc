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

//! Time keeping for the tick driver.

use std::time::{Duration, Instant};

/// Upper bound of [`FrameClock::set_time_scale`].
pub const MAX_TIME_SCALE: f32 = 100.0;

/// The two clocks handed to every `update` call.
///
/// `elapsed` is logical game time and may be scaled or frozen by the driver;
/// `real_elapsed` is always wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Logical time since the previous tick.
    pub elapsed: Duration,
    /// Wall-clock time since the previous tick.
    pub real_elapsed: Duration,
}

/// Measures the time between consecutive ticks.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last_tick: Instant,
    time_scale: f32,
}

impl FrameClock {
    /// Creates a clock starting now, with a time scale of `1.0`.
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
            time_scale: 1.0,
        }
    }

    /// Returns the current time scale.
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Sets the factor applied to logical time.
    ///
    /// ## Arguments
    /// * `scale` - The factor, clamped to `0.0..=MAX_TIME_SCALE`. `NaN` counts as zero.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0).min(MAX_TIME_SCALE);
    }

    /// Returns the time since the previous call and restarts the measurement.
    /// ## Returns
    /// A [`FrameTime`] whose `elapsed` is `real_elapsed` multiplied by the time scale.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let real_elapsed = now.duration_since(self.last_tick);
        self.last_tick = now;
        FrameTime {
            elapsed: real_elapsed.mul_f32(self.time_scale),
            real_elapsed,
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
