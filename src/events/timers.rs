/*
 *  events/timers.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Timer event producer
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
use std::rc::Rc;

use super::{Clock, EventHandler, EventProducer, Registration, Timer, wrong_registration};

struct ScheduledTimer {
    timer: Timer,
    handler: EventHandler,
}

/// Permanent and temporary timer collections.
///
/// Exhausted timers are pruned after each tick.
pub struct TimerEvents {
    clock: Rc<dyn Clock>,
    permanent: RefCell<Vec<ScheduledTimer>>,
    temporary: RefCell<Vec<ScheduledTimer>>,
    // bumped by clear(), lets a running tick notice its temporaries are gone
    epoch: Cell<u64>,
}

impl TimerEvents {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            permanent: RefCell::new(Vec::new()),
            temporary: RefCell::new(Vec::new()),
            epoch: Cell::new(0),
        }
    }

    /// (permanent, temporary) active timer counts
    pub fn timer_counts(&self) -> (usize, usize) {
        (self.permanent.borrow().len(), self.temporary.borrow().len())
    }

    fn run(&self, timers: &mut [ScheduledTimer], epoch: u64) {
        let now = self.clock.now();
        for scheduled in timers.iter_mut() {
            if !scheduled.handler.is_permanent() && self.epoch.get() != epoch {
                break;
            }
            if scheduled.timer.check(now) {
                scheduled.handler.invoke(self.name(), &[]);
            }
        }
    }

    // put surviving timers back ahead of anything registered mid-tick
    fn restore(slot: &RefCell<Vec<ScheduledTimer>>, mut kept: Vec<ScheduledTimer>) {
        kept.retain(|s| s.timer.is_active());
        let mut slot = slot.borrow_mut();
        kept.append(&mut slot);
        *slot = kept;
    }
}

impl EventProducer for TimerEvents {
    fn name(&self) -> &'static str {
        "timer"
    }

    fn register(&self, handler: EventHandler, registration: Registration) {
        let Registration::Timer { interval, max_count } = registration else {
            wrong_registration(self.name(), &registration);
            return;
        };
        let timer = Timer::new(interval, max_count, self.clock.now());
        let slot = if handler.is_permanent() { &self.permanent } else { &self.temporary };
        slot.borrow_mut().push(ScheduledTimer { timer, handler });
    }

    fn tick(&self) {
        let epoch = self.epoch.get();
        let mut permanent = mem::take(&mut *self.permanent.borrow_mut());
        let mut temporary = mem::take(&mut *self.temporary.borrow_mut());

        self.run(&mut permanent, epoch);
        self.run(&mut temporary, epoch);

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
    use crate::events::ManualClock;

    fn setup() -> (Rc<ManualClock>, Rc<TimerEvents>) {
        let clock = Rc::new(ManualClock::new());
        let timers = Rc::new(TimerEvents::new(clock.clone()));
        (clock, timers)
    }

    fn counter() -> (Rc<Cell<u32>>, EventHandler) {
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        (hits, EventHandler::new(move || h.set(h.get() + 1)))
    }

    #[test]
    fn test_repeating_cadence() {
        let (clock, timers) = setup();
        let (hits, handler) = counter();
        timers.register(handler, Registration::timer(1.0));
        for _ in 0..10 {
            clock.advance_secs(0.5);
            timers.tick();
        }
        assert_eq!(hits.get(), 5);
    }

    #[test]
    fn test_one_shot_pruned() {
        let (clock, timers) = setup();
        let (hits, handler) = counter();
        timers.register(handler, Registration::timer_once(2.0));
        assert_eq!(timers.timer_counts(), (0, 1));
        clock.advance_secs(2.0);
        timers.tick();
        assert_eq!(hits.get(), 1);
        assert_eq!(timers.timer_counts(), (0, 0));
        clock.advance_secs(5.0);
        timers.tick();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_clear_drops_only_temporary() {
        let (clock, timers) = setup();
        let (perm_hits, perm) = counter();
        let (temp_hits, temp) = counter();
        timers.register(perm.permanent(), Registration::timer(1.0));
        timers.register(temp, Registration::timer(1.0));
        timers.clear();
        clock.advance_secs(1.0);
        timers.tick();
        assert_eq!(perm_hits.get(), 1);
        assert_eq!(temp_hits.get(), 0);
        assert_eq!(timers.timer_counts(), (1, 0));
    }

    #[test]
    fn test_register_during_tick() {
        let (clock, timers) = setup();
        let (hits, inner) = counter();
        let weak = Rc::downgrade(&timers);
        let outer = EventHandler::new(move || {
            if let Some(t) = weak.upgrade() {
                t.register(inner.clone(), Registration::timer_once(1.0));
            }
        });
        timers.register(outer, Registration::timer_once(1.0));
        clock.advance_secs(1.0);
        timers.tick();
        assert_eq!(timers.timer_counts(), (0, 1));
        clock.advance_secs(1.0);
        timers.tick();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_clear_during_tick_drops_survivors() {
        let (clock, timers) = setup();
        let weak = Rc::downgrade(&timers);
        let clearing = EventHandler::new(move || {
            if let Some(t) = weak.upgrade() {
                t.clear();
            }
        });
        let (later_hits, later) = counter();
        timers.register(clearing.permanent(), Registration::timer(1.0));
        timers.register(later, Registration::timer(1.0));
        clock.advance_secs(1.0);
        timers.tick();
        assert_eq!(later_hits.get(), 0);
        assert_eq!(timers.timer_counts(), (1, 0));
    }

    #[test]
    fn test_wrong_registration_ignored() {
        let (_, timers) = setup();
        let (_, handler) = counter();
        timers.register(handler, Registration::Button(1));
        assert_eq!(timers.timer_counts(), (0, 0));
    }
}
