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

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use keel_core::collections::{MultiMap, NodeId};
use keel_core::{EventPoolMode, FrameworkError, ReferencePool, Result};
use parking_lot::{Mutex, MutexGuard};

use crate::args::{EventArgs, EventHandler, EventSender, HandlerSlot};
use crate::event::Event;

/// Handler chains plus the bookkeeping of dispatches in flight.
struct HandlerState<E> {
    chains: MultiMap<i32, HandlerSlot<E>>,
    /// Next node to visit, per in-flight dispatch ticket.
    cached_nodes: HashMap<u64, NodeId>,
    next_ticket: u64,
    default_handler: Option<EventHandler<E>>,
}

/// A publish/subscribe bus over pooled payloads of type `E`.
///
/// [`fire`](Self::fire) may be called from any thread; the envelope waits in a
/// multi-producer queue until the tick driver calls [`update`](Self::update),
/// so handlers always run on the driver's thread. The handler lock is never
/// held while a handler runs, which lets handlers subscribe, unsubscribe or
/// fire from inside a dispatch.
pub struct EventPool<E: EventArgs> {
    references: Arc<ReferencePool>,
    mode: EventPoolMode,
    handlers: Mutex<HandlerState<E>>,
    sender: flume::Sender<Box<Event<E>>>,
    receiver: flume::Receiver<Box<Event<E>>>,
}

impl<E: EventArgs> EventPool<E> {
    /// Creates an event pool drawing envelopes from `references`.
    ///
    /// Both the payload type and the envelope type are registered, so the
    /// pool also works under strict reference checking.
    pub fn new(references: Arc<ReferencePool>, mode: EventPoolMode) -> Self {
        references.register::<E>();
        references.register::<Event<E>>();

        let (sender, receiver) = flume::unbounded();
        log::info!(
            "EventPool<{}> initialized with mode {:#05b}.",
            std::any::type_name::<E>(),
            mode.bits()
        );

        Self {
            references,
            mode,
            handlers: Mutex::new(HandlerState {
                chains: MultiMap::new(),
                cached_nodes: HashMap::new(),
                next_ticket: 0,
                default_handler: None,
            }),
            sender,
            receiver,
        }
    }

    /// Returns the handler policy.
    pub fn mode(&self) -> EventPoolMode {
        self.mode
    }

    /// Returns the number of event ids with at least one handler.
    pub fn event_handler_count(&self) -> usize {
        self.handlers.lock().chains.len()
    }

    /// Returns the number of fired events waiting for the next update.
    pub fn event_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the number of handlers subscribed to `id`.
    pub fn count(&self, id: i32) -> usize {
        self.handlers.lock().chains.count(&id)
    }

    /// Returns `true` if `handler` is subscribed to `id`.
    pub fn check(&self, id: i32, handler: &EventHandler<E>) -> bool {
        self.handlers
            .lock()
            .chains
            .find(&id, |slot| Arc::ptr_eq(&slot.0, handler))
            .is_some()
    }

    /// Appends `handler` to the chain of `id`.
    ///
    /// ## Arguments
    /// * `id` - The event id the handler listens to.
    /// * `handler` - The callback. Identity is the `Arc` allocation.
    ///
    /// # Errors
    ///
    /// [`FrameworkError::MultipleHandlersNotAllowed`] if `id` already has a
    /// handler and the mode forbids several, [`FrameworkError::DuplicateHandlerNotAllowed`]
    /// if this exact handler is already subscribed and the mode forbids duplicates.
    pub fn subscribe(&self, id: i32, handler: EventHandler<E>) -> Result<()> {
        let mut state = self.handlers.lock();
        if state.chains.contains_key(&id) {
            if !self.mode.contains(EventPoolMode::ALLOW_MULTI_HANDLER) {
                return Err(FrameworkError::MultipleHandlersNotAllowed { id });
            }
            let duplicate = state
                .chains
                .find(&id, |slot| Arc::ptr_eq(&slot.0, &handler))
                .is_some();
            if duplicate && !self.mode.contains(EventPoolMode::ALLOW_DUPLICATE_HANDLER) {
                return Err(FrameworkError::DuplicateHandlerNotAllowed { id });
            }
        }

        state.chains.add(id, HandlerSlot(handler));
        log::trace!("EventPool: subscribed a handler to event {id}.");
        Ok(())
    }

    /// Removes `handler` from the chain of `id`.
    ///
    /// Dispatches in flight that were about to visit the removed handler move
    /// on to its successor instead.
    pub fn unsubscribe(&self, id: i32, handler: &EventHandler<E>) -> Result<()> {
        let mut state = self.handlers.lock();
        let node = state
            .chains
            .find(&id, |slot| Arc::ptr_eq(&slot.0, handler))
            .ok_or(FrameworkError::HandlerNotFound { id })?;

        match state.chains.next(node) {
            Some(next) => state
                .cached_nodes
                .values_mut()
                .filter(|cached| **cached == node)
                .for_each(|cached| *cached = next),
            None => state.cached_nodes.retain(|_, cached| *cached != node),
        }

        state.chains.remove_node(&id, node);
        log::trace!("EventPool: unsubscribed a handler from event {id}.");
        Ok(())
    }

    /// Replaces the handler invoked for events that have no chain.
    pub fn set_default_handler(&self, handler: Option<EventHandler<E>>) {
        self.handlers.lock().default_handler = handler;
    }

    /// Queues `args` for dispatch on the next [`update`](Self::update).
    ///
    /// Safe to call from any thread.
    ///
    /// ## Arguments
    /// * `sender` - An opaque reference to whoever fired the event.
    /// * `args` - The pooled payload. It goes back to the reference pool after dispatch.
    pub fn fire(&self, sender: EventSender, args: Box<E>) -> Result<()> {
        let mut event = self.references.acquire::<Event<E>>()?;
        event.sender = sender;
        event.args = Some(args);

        if let Err(e) = self.sender.send(event) {
            log::error!("Failed to queue event: {e}. Receiver likely disconnected.");
        }
        Ok(())
    }

    /// Dispatches `args` immediately on the calling thread.
    ///
    /// Must not run concurrently with [`update`](Self::update) on the same pool.
    ///
    /// ## Arguments
    /// * `sender` - An opaque reference to whoever fired the event.
    /// * `args` - The pooled payload, released once every handler has run.
    pub fn fire_now(&self, sender: EventSender, args: Box<E>) -> Result<()> {
        let dispatched = self.dispatch(&sender, &args);
        let released = self.references.release(args);
        dispatched.and(released)
    }

    /// Dispatches every event queued before this call.
    ///
    /// Events fired by handlers during the drain are left for the next update.
    /// Stops at the first failed dispatch; later events stay queued.
    pub fn update(&self, _elapsed: Duration, _real_elapsed: Duration) -> Result<()> {
        let pending = self.receiver.len();
        for _ in 0..pending {
            let Ok(event) = self.receiver.try_recv() else {
                break;
            };
            if let Err(e) = self.handle(event) {
                log::error!("EventPool: dispatch failed: {e}");
                return Err(e);
            }
        }
        Ok(())
    }

    /// Drops every queued event without invoking any handler.
    pub fn clear(&self) {
        let dropped: Vec<_> = self.receiver.drain().collect();
        if !dropped.is_empty() {
            log::debug!("EventPool: dropping {} queued event(s).", dropped.len());
        }
        for mut event in dropped {
            if let Some(args) = event.args.take() {
                if let Err(e) = self.references.release(args) {
                    log::warn!("EventPool: failed to release a dropped payload: {e}");
                }
            }
            if let Err(e) = self.references.release(event) {
                log::warn!("EventPool: failed to release a dropped envelope: {e}");
            }
        }
    }

    /// Drops queued events, every handler chain and the default handler.
    pub fn shutdown(&self) {
        self.clear();
        let mut state = self.handlers.lock();
        state.chains.clear();
        state.cached_nodes.clear();
        state.default_handler = None;
        log::info!("EventPool<{}> shut down.", std::any::type_name::<E>());
    }

    fn handle(&self, mut event: Box<Event<E>>) -> Result<()> {
        let sender = std::mem::take(&mut event.sender);
        let dispatched = match event.args.take() {
            Some(args) => {
                let dispatched = self.dispatch(&sender, &args);
                dispatched.and(self.references.release(args))
            }
            None => Ok(()),
        };
        dispatched.and(self.references.release(event))
    }

    fn dispatch(&self, sender: &EventSender, args: &E) -> Result<()> {
        let id = args.id();
        let mut state = self.handlers.lock();

        if let Some(range) = state.chains.range(&id) {
            let ticket = state.next_ticket;
            state.next_ticket = state.next_ticket.wrapping_add(1);

            let terminal = range.terminal();
            let mut current = range.first();
            while current != terminal {
                let Some(handler) = state.chains.value(current).map(|slot| slot.0.clone()) else {
                    break;
                };
                let Some(next) = state.chains.next(current) else {
                    break;
                };
                state.cached_nodes.insert(ticket, next);

                MutexGuard::unlocked(&mut state, || handler(sender, args));

                match state.cached_nodes.get(&ticket) {
                    Some(next) => current = *next,
                    None => break,
                }
            }
            state.cached_nodes.remove(&ticket);
            return Ok(());
        }

        if let Some(default_handler) = state.default_handler.clone() {
            drop(state);
            default_handler(sender, args);
            return Ok(());
        }

        if self.mode.contains(EventPoolMode::ALLOW_NO_HANDLER) {
            Ok(())
        } else {
            Err(FrameworkError::NoHandlerNotAllowed { id })
        }
    }
}

impl<E: EventArgs> fmt::Debug for EventPool<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventPool")
            .field("mode", &self.mode)
            .field("event_handler_count", &self.event_handler_count())
            .field("event_count", &self.event_count())
            .finish()
    }
}
