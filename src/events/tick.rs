/*
 *  events/tick.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Tick event producer, fires every loop iteration
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

use std::cell::{Cell, RefCell};
use std::mem;

use super::{EventHandler, EventProducer, Registration, wrong_registration};

/// Handlers fired unconditionally on every tick, temporary ones first.
#[derive(Default)]
pub struct TickEvents {
    permanent: RefCell<Vec<EventHandler>>,
    temporary: RefCell<Vec<EventHandler>>,
    epoch: Cell<u64>,
}

impl TickEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// (permanent, temporary) handler counts
    pub fn handler_counts(&self) -> (usize, usize) {
        (self.permanent.borrow().len(), self.temporary.borrow().len())
    }

    fn restore(slot: &RefCell<Vec<EventHandler>>, mut kept: Vec<EventHandler>) {
        let mut slot = slot.borrow_mut();
        kept.append(&mut slot);
        *slot = kept;
    }
}

impl EventProducer for TickEvents {
    fn name(&self) -> &'static str {
        "tick"
    }

    fn register(&self, handler: EventHandler, registration: Registration) {
        if registration != Registration::Tick {
            wrong_registration(self.name(), &registration);
            return;
        }
        let slot = if handler.is_permanent() { &self.permanent } else { &self.temporary };
        slot.borrow_mut().push(handler);
    }

    fn tick(&self) {
        let epoch = self.epoch.get();
        let temporary = mem::take(&mut *self.temporary.borrow_mut());
        let permanent = mem::take(&mut *self.permanent.borrow_mut());

        for handler in &temporary {
            if self.epoch.get() != epoch {
                break;
            }
            handler.invoke(self.name(), &[]);
        }
        for handler in &permanent {
            handler.invoke(self.name(), &[]);
        }

        Self::restore(&self.permanent, permanent);
        if self.epoch.get() == epoch {
            Self::restore(&self.temporary, temporary);
        }
    }

    fn clear(&self) {
        self.temporary.borrow_mut().clear();
        self.epoch.set(self.epoch.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_fires_every_tick() {
        let ticks = TickEvents::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        ticks.register(EventHandler::new(move || h.set(h.get() + 1)), Registration::Tick);
        ticks.tick();
        ticks.tick();
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_temporary_before_permanent() {
        let ticks = TickEvents::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        let o = order.clone();
        ticks.register(EventHandler::new(move || o.borrow_mut().push("perm")).permanent(), Registration::Tick);
        let o = order.clone();
        ticks.register(EventHandler::new(move || o.borrow_mut().push("temp")), Registration::Tick);
        ticks.tick();
        assert_eq!(*order.borrow(), vec!["temp", "perm"]);
    }

    #[test]
    fn test_clear_keeps_permanent() {
        let ticks = TickEvents::new();
        ticks.register(EventHandler::new(|| {}).permanent(), Registration::Tick);
        ticks.register(EventHandler::new(|| {}), Registration::Tick);
        ticks.clear();
        assert_eq!(ticks.handler_counts(), (1, 0));
    }

    #[test]
    fn test_panicking_handler_does_not_stop_others() {
        let ticks = TickEvents::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        ticks.register(EventHandler::new(|| panic!("bad panel")), Registration::Tick);
        ticks.register(EventHandler::new(move || h.set(h.get() + 1)), Registration::Tick);
        ticks.tick();
        ticks.tick();
        assert_eq!(hits.get(), 2);
        assert_eq!(ticks.handler_counts(), (0, 2));
    }
}
