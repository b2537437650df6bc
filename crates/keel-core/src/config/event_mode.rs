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

//! Flags controlling how an event pool treats handlers.

use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};

/// A single named switch of [`EventPoolMode`], as written in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPoolFlag {
    /// Dispatching an event without any handler is not an error.
    AllowNoHandler,
    /// An event id may have more than one handler.
    AllowMultiHandler,
    /// The same handler may be subscribed more than once to one event id.
    AllowDuplicateHandler,
}

/// A set of independent event pool switches.
///
/// The default set is empty: one handler per event, no duplicates, and
/// dispatching an unhandled event fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<EventPoolFlag>", into = "Vec<EventPoolFlag>")]
pub struct EventPoolMode {
    bits: u8,
}

impl EventPoolMode {
    /// No switch enabled.
    pub const DEFAULT: Self = Self { bits: 0 };
    /// See [`EventPoolFlag::AllowNoHandler`].
    pub const ALLOW_NO_HANDLER: Self = Self { bits: 1 << 0 };
    /// See [`EventPoolFlag::AllowMultiHandler`].
    pub const ALLOW_MULTI_HANDLER: Self = Self { bits: 1 << 1 };
    /// See [`EventPoolFlag::AllowDuplicateHandler`].
    pub const ALLOW_DUPLICATE_HANDLER: Self = Self { bits: 1 << 2 };

    /// Returns the raw bits.
    pub const fn bits(&self) -> u8 {
        self.bits
    }

    /// Combines two sets of flags.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Returns `true` if every flag in `other` is set in `self`.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Returns `true` if no flag is set.
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    const fn from_flag(flag: EventPoolFlag) -> Self {
        match flag {
            EventPoolFlag::AllowNoHandler => Self::ALLOW_NO_HANDLER,
            EventPoolFlag::AllowMultiHandler => Self::ALLOW_MULTI_HANDLER,
            EventPoolFlag::AllowDuplicateHandler => Self::ALLOW_DUPLICATE_HANDLER,
        }
    }
}

impl BitOr for EventPoolMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

impl BitOrAssign for EventPoolMode {
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits |= rhs.bits;
    }
}

impl From<Vec<EventPoolFlag>> for EventPoolMode {
    fn from(flags: Vec<EventPoolFlag>) -> Self {
        flags
            .into_iter()
            .fold(Self::DEFAULT, |mode, flag| mode | Self::from_flag(flag))
    }
}

impl From<EventPoolMode> for Vec<EventPoolFlag> {
    fn from(mode: EventPoolMode) -> Self {
        [
            EventPoolFlag::AllowNoHandler,
            EventPoolFlag::AllowMultiHandler,
            EventPoolFlag::AllowDuplicateHandler,
        ]
        .into_iter()
        .filter(|flag| mode.contains(EventPoolMode::from_flag(*flag)))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_independent() {
        let mode = EventPoolMode::ALLOW_MULTI_HANDLER | EventPoolMode::ALLOW_NO_HANDLER;
        assert!(mode.contains(EventPoolMode::ALLOW_MULTI_HANDLER));
        assert!(mode.contains(EventPoolMode::ALLOW_NO_HANDLER));
        assert!(!mode.contains(EventPoolMode::ALLOW_DUPLICATE_HANDLER));
        assert!(EventPoolMode::default().is_empty());
    }

    #[test]
    fn serializes_as_flag_names() {
        let mode = EventPoolMode::ALLOW_NO_HANDLER | EventPoolMode::ALLOW_DUPLICATE_HANDLER;
        let json = serde_json::to_string(&mode).unwrap();
        assert_eq!(json, r#"["allow_no_handler","allow_duplicate_handler"]"#);

        let parsed: EventPoolMode = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, mode);
    }
}
