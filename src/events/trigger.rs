/*
 *  events/trigger.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Named software triggers, queued by send() and run on the next tick
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use log::{debug, error};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::mem;

use super::{EventHandler, EventProducer, Registration, wrong_registration};

struct QueuedTrigger {
    handler: EventHandler,
    args: Vec<String>,
}

/// Named triggers in two namespaces, permanent and temporary.
///
/// `send()` never runs a handler, it only queues. `tick()` drains the queue
/// in FIFO order. Sends made while draining wait for the following tick.
#[derive(Default)]
pub struct TriggerEvents {
    permanent: RefCell<HashMap<String, EventHandler>>,
    temporary: RefCell<HashMap<String, EventHandler>>,
    queue: RefCell<VecDeque<QueuedTrigger>>,
    epoch: Cell<u64>,
}

impl TriggerEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queued(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.permanent.borrow().contains_key(name) || self.temporary.borrow().contains_key(name)
    }

    fn lookup(&self, name: &str) -> Option<EventHandler> {
        if let Some(handler) = self.permanent.borrow().get(name) {
            return Some(handler.clone());
        }
        self.temporary.borrow().get(name).cloned()
    }
}

impl EventProducer for TriggerEvents {
    fn name(&self) -> &'static str {
        "trigger"
    }

    fn register(&self, handler: EventHandler, registration: Registration) {
        let Registration::Trigger(name) = registration else {
            wrong_registration(self.name(), &registration);
            return;
        };
        let slot = if handler.is_permanent() { &self.permanent } else { &self.temporary };
        slot.borrow_mut().insert(name, handler);
    }

    /// First argument is the trigger name, the rest are handed to the handler
    fn send(&self, args: &[String]) {
        let Some((name, rest)) = args.split_first() else {
            error!("Trigger send() requires a trigger name.");
            return;
        };
        match self.lookup(name) {
            Some(handler) => {
                debug!("Queue trigger \"{}\".", name);
                self.queue.borrow_mut().push_back(QueuedTrigger {
                    handler,
                    args: rest.to_vec(),
                });
            }
            None => error!("Unknown trigger name \"{}\" sent.", name),
        }
    }

    fn tick(&self) {
        let epoch = self.epoch.get();
        let queued = mem::take(&mut *self.queue.borrow_mut());
        for event in queued {
            // a screen switch inside this drain cancels the old screen's triggers
            if !event.handler.is_permanent() && self.epoch.get() != epoch {
                continue;
            }
            event.handler.invoke(self.name(), &event.args);
        }
    }

    fn clear(&self) {
        self.temporary.borrow_mut().clear();
        self.queue
            .borrow_mut()
            .retain(|event| event.handler.is_permanent());
        self.epoch.set(self.epoch.get() + 1);
    }
}
