/*
 *  events/dispatcher.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Named producer registry: register, send, tick and clear facade
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

use log::{debug, error, warn};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::Instant;

use super::handler::panic_message;
use super::{
    ButtonDevice, ButtonEvents, Clock, EventHandler, EventProducer, Registration, TickEvents,
    TimerEvents, TriggerEvents,
};
use crate::constants::{
    PRODUCER_BUTTON, PRODUCER_TICK, PRODUCER_TIMER, PRODUCER_TRIGGER, SLOW_TICK_THRESHOLD,
};

/// Producers keyed by name, ticked in the order they were added.
///
/// Built mutably at startup then shared behind an `Rc`; there is no removal.
#[derive(Default)]
pub struct EventDispatcher {
    producers: Vec<(String, Box<dyn EventProducer>)>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatcher with the button, timer, tick and trigger producers
    pub fn with_standard_producers(buttons: Box<dyn ButtonDevice>, clock: Rc<dyn Clock>) -> Self {
        let mut dispatcher = Self::new();
        dispatcher.add_producer(PRODUCER_BUTTON, ButtonEvents::new(buttons));
        dispatcher.add_producer(PRODUCER_TIMER, TimerEvents::new(clock));
        dispatcher.add_producer(PRODUCER_TICK, TickEvents::new());
        dispatcher.add_producer(PRODUCER_TRIGGER, TriggerEvents::new());
        dispatcher
    }

    pub fn add_producer(&mut self, name: impl Into<String>, producer: impl EventProducer + 'static) {
        let name = name.into();
        if self.producer(&name).is_some() {
            error!("Event producer \"{}\" is already registered.", name);
            return;
        }
        debug!("Add event producer \"{}\".", name);
        self.producers.push((name, Box::new(producer)));
    }

    pub fn producer_names(&self) -> Vec<&str> {
        self.producers.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn producer(&self, name: &str) -> Option<&dyn EventProducer> {
        self.producers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p.as_ref())
    }

    /// Forward a registration to the named producer
    pub fn register(&self, producer: &str, handler: EventHandler, registration: Registration) {
        match self.producer(producer) {
            Some(p) => p.register(handler, registration),
            None => error!(
                "Unable to register event for unknown producer \"{}\".",
                producer
            ),
        }
    }

    /// Shorthand wrapping a closure, scoped by `permanent`
    pub fn register_fn<F>(&self, producer: &str, registration: Registration, permanent: bool, function: F)
    where
        F: Fn() + 'static,
    {
        let mut handler = EventHandler::new(function);
        handler.set_permanent(permanent);
        self.register(producer, handler, registration);
    }

    pub fn send(&self, producer: &str, args: &[&str]) {
        match self.producer(producer) {
            Some(p) => {
                let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
                p.send(&args);
            }
            None => error!("Unable to send event to unknown producer \"{}\".", producer),
        }
    }

    /// Tick every producer. A failing producer is logged and the rest still run.
    pub fn tick(&self) {
        for (name, producer) in &self.producers {
            let start = Instant::now();
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| producer.tick())) {
                error!(
                    "Event producer \"{}\" tick failed: {}",
                    name,
                    panic_message(payload.as_ref())
                );
            }
            let elapsed = start.elapsed();
            if elapsed > SLOW_TICK_THRESHOLD {
                warn!(
                    "Event producer \"{}\" tick took {:.3} seconds.",
                    name,
                    elapsed.as_secs_f64()
                );
            }
        }
    }

    /// Drop non-permanent handlers everywhere, used at screen switches
    pub fn clear(&self) {
        for (_, producer) in &self.producers {
            producer.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ManualClock, NoButtons};
    use std::cell::Cell;

    fn dispatcher() -> (Rc<ManualClock>, EventDispatcher) {
        let clock = Rc::new(ManualClock::new());
        let d = EventDispatcher::with_standard_producers(Box::new(NoButtons), clock.clone());
        (clock, d)
    }

    fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        (hits, move || h.set(h.get() + 1))
    }

    #[test]
    fn test_standard_producer_order() {
        let (_, d) = dispatcher();
        assert_eq!(d.producer_names(), vec!["button", "timer", "tick", "trigger"]);
    }

    #[test]
    fn test_unknown_producer_is_noop() {
        let (_, d) = dispatcher();
        let (hits, f) = counter();
        d.register_fn("nope", Registration::Tick, false, f);
        d.send("nope", &["x"]);
        d.tick();
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_clear_keeps_permanent_handlers() {
        let (_, d) = dispatcher();
        let (perm, fp) = counter();
        let (temp, ft) = counter();
        d.register_fn(PRODUCER_TICK, Registration::Tick, true, fp);
        d.register_fn(PRODUCER_TICK, Registration::Tick, false, ft);
        d.clear();
        d.tick();
        assert_eq!(perm.get(), 1);
        assert_eq!(temp.get(), 0);
    }

    #[test]
    fn test_trigger_runs_next_tick() {
        let (_, d) = dispatcher();
        let (hits, f) = counter();
        d.register_fn(PRODUCER_TRIGGER, Registration::trigger("trigger-x"), false, f);
        d.send(PRODUCER_TRIGGER, &["trigger-x"]);
        assert_eq!(hits.get(), 0);
        d.tick();
        assert_eq!(hits.get(), 1);
        d.tick();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_timer_through_dispatcher() {
        let (clock, d) = dispatcher();
        let (hits, f) = counter();
        d.register_fn(PRODUCER_TIMER, Registration::timer(1.0), false, f);
        clock.advance_secs(1.0);
        d.tick();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_send_to_unsupported_producer() {
        let (_, d) = dispatcher();
        d.send(PRODUCER_TICK, &["anything"]);
        d.tick();
    }

    #[test]
    fn test_duplicate_producer_rejected() {
        let (_, mut d) = dispatcher();
        d.add_producer(PRODUCER_TICK, TickEvents::new());
        assert_eq!(d.producer_names().len(), 4);
    }

    #[test]
    fn test_huge_intervals_never_fire() {
        let (clock, d) = dispatcher();
        let (hits, f) = counter();
        d.register_fn(PRODUCER_TIMER, Registration::timer(1e20), false, f);
        let (more, g) = counter();
        d.register_fn(PRODUCER_TIMER, Registration::timer(1e19), false, g);
        d.tick();
        d.tick();
        clock.advance_secs(3600.0);
        d.tick();
        assert_eq!(hits.get(), 0);
        assert_eq!(more.get(), 0);
    }

    struct FailingProducer;

    impl EventProducer for FailingProducer {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn register(&self, _handler: EventHandler, _registration: Registration) {}

        fn tick(&self) {
            panic!("producer broke");
        }

        fn clear(&self) {}
    }

    #[test]
    fn test_failing_producer_does_not_stop_tick() {
        let mut d = EventDispatcher::new();
        d.add_producer("failing", FailingProducer);
        d.add_producer(PRODUCER_TICK, TickEvents::new());
        let (hits, f) = counter();
        d.register_fn(PRODUCER_TICK, Registration::Tick, false, f);
        d.tick();
        d.tick();
        assert_eq!(hits.get(), 2);
    }
}
