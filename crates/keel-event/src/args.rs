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

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use keel_core::Reference;

/// The capability every event payload provides.
///
/// Payloads are pooled: acquire them from the [`ReferencePool`](keel_core::ReferencePool),
/// fill them in, and hand them to the event pool, which releases them after dispatch.
pub trait EventArgs: Reference {
    /// The identifier used to route the payload to its handler chain.
    fn id(&self) -> i32;
}

/// An opaque reference to whoever fired an event.
#[derive(Clone, Default)]
pub struct EventSender(Option<Arc<dyn Any + Send + Sync>>);

impl EventSender {
    /// A sender that carries nothing.
    pub fn none() -> Self {
        Self(None)
    }

    /// Wraps a shared sender object.
    pub fn new<T: Any + Send + Sync>(sender: Arc<T>) -> Self {
        Self(Some(sender))
    }

    /// Returns `true` if no sender object is attached.
    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    /// Returns the sender as `T`, if it is one.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_deref().and_then(|s| s.downcast_ref::<T>())
    }
}

impl fmt::Debug for EventSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("EventSender(Some(..))"),
            None => f.write_str("EventSender(None)"),
        }
    }
}

/// A subscribed callback.
///
/// Handlers are compared by identity: the same `Arc` is the same handler.
pub type EventHandler<E> = Arc<dyn Fn(&EventSender, &E) + Send + Sync>;

/// Wraps a closure into an [`EventHandler`].
pub fn handler<E, F>(f: F) -> EventHandler<E>
where
    E: EventArgs,
    F: Fn(&EventSender, &E) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Identity wrapper so handlers can be stored in a multi-map.
pub(crate) struct HandlerSlot<E>(pub(crate) EventHandler<E>);

impl<E> PartialEq for HandlerSlot<E> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Player {
        name: &'static str,
    }

    #[test]
    fn sender_downcasts_to_its_concrete_type() {
        let sender = EventSender::new(Arc::new(Player { name: "p1" }));
        assert_eq!(sender.downcast_ref::<Player>().map(|p| p.name), Some("p1"));
        assert!(sender.downcast_ref::<u32>().is_none());
        assert!(EventSender::none().is_none());
    }
}
