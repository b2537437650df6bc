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

//! The error taxonomy shared by every Keel crate.
//!
//! All of these are programming errors surfaced synchronously at the call that
//! detects them. None of them is retried automatically.

use thiserror::Error;

/// A specialized `Result` type for framework operations.
pub type Result<T, E = FrameworkError> = std::result::Result<T, E>;

/// Errors raised by the reference pool, the event pool and the task pool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum FrameworkError {
    /// An argument was rejected at runtime (e.g. a serial id already scheduled).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested type has no usable pool under strict checking.
    #[error("Type '{type_name}' is not a valid reference type")]
    InvalidReferenceType {
        /// The name of the offending type.
        type_name: &'static str,
    },

    /// The instance being released is already sitting in its free queue.
    #[error("Reference of type '{type_name}' has already been released")]
    DuplicateRelease {
        /// The name of the pooled type.
        type_name: &'static str,
    },

    /// The event id already has a handler and multiple handlers are disabled.
    #[error("Event '{id}' does not allow multiple handlers")]
    MultipleHandlersNotAllowed {
        /// The event identifier.
        id: i32,
    },

    /// The handler is already subscribed and duplicate handlers are disabled.
    #[error("Event '{id}' does not allow duplicate handlers")]
    DuplicateHandlerNotAllowed {
        /// The event identifier.
        id: i32,
    },

    /// An unsubscribe targeted a handler that is not registered.
    #[error("Event '{id}' does not have the given handler")]
    HandlerNotFound {
        /// The event identifier.
        id: i32,
    },

    /// An event was dispatched with no handler and no default handler.
    #[error("Event '{id}' is not allowed to be dispatched without a handler")]
    NoHandlerNotAllowed {
        /// The event identifier.
        id: i32,
    },

    /// A task agent reported an unrecoverable failure while starting a task.
    #[error("Task {serial_id} failed to start: {description}")]
    UnknownTaskError {
        /// The serial id of the failed task.
        serial_id: u64,
        /// The task's human-readable description.
        description: String,
    },

    /// The framework configuration could not be read or is out of range.
    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = FrameworkError::NoHandlerNotAllowed { id: 7 };
        assert_eq!(
            err.to_string(),
            "Event '7' is not allowed to be dispatched without a handler"
        );

        let err = FrameworkError::UnknownTaskError {
            serial_id: 3,
            description: "load level".to_string(),
        };
        assert_eq!(err.to_string(), "Task 3 failed to start: load level");
    }
}
