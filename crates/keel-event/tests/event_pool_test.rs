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

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use keel_core::{EventPoolMode, Reference, ReferencePool};
use keel_event::{handler, EventArgs, EventPool, EventSender};

const SCORE_CHANGED: i32 = 100;
const PRODUCERS: usize = 4;
const EVENTS_PER_PRODUCER: usize = 250;

#[derive(Debug, Default)]
struct ScoreChanged {
    producer: usize,
    sequence: usize,
}

impl Reference for ScoreChanged {
    fn clear(&mut self) {
        self.producer = 0;
        self.sequence = 0;
    }
}

impl EventArgs for ScoreChanged {
    fn id(&self) -> i32 {
        SCORE_CHANGED
    }
}

#[test]
fn events_fired_from_many_threads_are_delivered_on_update() {
    // --- 1. ARRANGE ---
    let references = Arc::new(ReferencePool::new(true));
    let events = Arc::new(EventPool::<ScoreChanged>::new(
        references.clone(),
        EventPoolMode::DEFAULT,
    ));

    let delivered = Arc::new(AtomicUsize::new(0));
    let last_seen = Arc::new(parking_lot::Mutex::new(vec![None; PRODUCERS]));
    {
        let delivered = delivered.clone();
        let last_seen = last_seen.clone();
        events
            .subscribe(
                SCORE_CHANGED,
                handler(move |_, e: &ScoreChanged| {
                    delivered.fetch_add(1, Ordering::SeqCst);
                    let mut last_seen = last_seen.lock();
                    if let Some(previous) = last_seen[e.producer] {
                        assert!(e.sequence > previous, "per-producer order must hold");
                    }
                    last_seen[e.producer] = Some(e.sequence);
                }),
            )
            .expect("first handler should subscribe");
    }

    // --- 2. ACT ---
    let producers: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let events = events.clone();
            let references = references.clone();
            thread::spawn(move || {
                for sequence in 0..EVENTS_PER_PRODUCER {
                    let mut args = references
                        .acquire::<ScoreChanged>()
                        .expect("payload type is registered by the event pool");
                    args.producer = producer;
                    args.sequence = sequence;
                    events
                        .fire(EventSender::none(), args)
                        .expect("fire should succeed");
                }
            })
        })
        .collect();

    for producer in producers {
        producer.join().expect("producer thread panicked");
    }
    assert_eq!(delivered.load(Ordering::SeqCst), 0, "fire must not dispatch");

    events
        .update(Duration::from_millis(16), Duration::from_millis(16))
        .expect("update should dispatch every event");

    // --- 3. ASSERT ---
    assert_eq!(
        delivered.load(Ordering::SeqCst),
        PRODUCERS * EVENTS_PER_PRODUCER
    );
    let info = references
        .info::<ScoreChanged>()
        .expect("payload pool exists");
    assert_eq!(info.using_count, 0, "every payload goes back to the pool");
    assert_eq!(info.release_count, PRODUCERS * EVENTS_PER_PRODUCER);
}

#[test]
fn a_handler_can_subscribe_during_dispatch() {
    let references = Arc::new(ReferencePool::default());
    let events = Arc::new(EventPool::<ScoreChanged>::new(
        references.clone(),
        EventPoolMode::ALLOW_MULTI_HANDLER,
    ));
    let late_calls = Arc::new(AtomicUsize::new(0));

    {
        let weak = Arc::downgrade(&events);
        let late_calls = late_calls.clone();
        events
            .subscribe(
                SCORE_CHANGED,
                handler(move |_, _: &ScoreChanged| {
                    let Some(events) = weak.upgrade() else { return };
                    let late_calls = late_calls.clone();
                    events
                        .subscribe(
                            SCORE_CHANGED,
                            handler(move |_, _: &ScoreChanged| {
                                late_calls.fetch_add(1, Ordering::SeqCst);
                            }),
                        )
                        .expect("multi-handler mode allows more handlers");
                }),
            )
            .unwrap();
    }

    let args = references.acquire::<ScoreChanged>().unwrap();
    events.fire_now(EventSender::none(), args).unwrap();

    // The walk had already remembered the terminal as its next node.
    assert_eq!(late_calls.load(Ordering::SeqCst), 0);
    assert_eq!(events.count(SCORE_CHANGED), 2);

    let args = references.acquire::<ScoreChanged>().unwrap();
    events.fire_now(EventSender::none(), args).unwrap();

    // Both late handlers sit before the terminal: the old one and the one just appended.
    assert_eq!(late_calls.load(Ordering::SeqCst), 2);
    assert_eq!(events.count(SCORE_CHANGED), 3);
}
