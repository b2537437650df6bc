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

use keel_core::Reference;

use crate::args::{EventArgs, EventSender};

/// A queued event: the sender paired with its payload.
///
/// Envelopes are pooled like payloads and only live between `fire` and the
/// next `update`.
pub(crate) struct Event<E> {
    pub(crate) sender: EventSender,
    pub(crate) args: Option<Box<E>>,
}

impl<E> Default for Event<E> {
    fn default() -> Self {
        Self {
            sender: EventSender::none(),
            args: None,
        }
    }
}

impl<E: EventArgs> Reference for Event<E> {
    fn clear(&mut self) {
        self.sender = EventSender::none();
        self.args = None;
    }
}
