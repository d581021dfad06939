/*
 *  events/mod.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Cooperative event producers and the dispatcher that ticks them
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

pub mod clock;
pub mod timer;
pub mod handler;
pub mod button;
pub mod timers;
pub mod tick;
pub mod trigger;
pub mod dispatcher;

use log::error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use timer::Timer;
pub use handler::{EventHandler, Registration, seconds};
pub use button::{ButtonDevice, ButtonEvents, NoButtons};
pub use timers::TimerEvents;
pub use tick::TickEvents;
pub use trigger::TriggerEvents;
pub use dispatcher::EventDispatcher;

/// A source of events polled once per loop iteration.
///
/// Producers use interior mutability: handlers run while the producer is
/// being ticked and may register, send or clear on the same producer.
pub trait EventProducer {
    /// Name used in log messages
    fn name(&self) -> &'static str;

    /// Attach a handler. Each producer accepts only its own `Registration`
    /// variant.
    fn register(&self, handler: EventHandler, registration: Registration);

    /// Invoke whatever handlers are now due, synchronously
    fn tick(&self);

    /// Drop all non-permanent handlers
    fn clear(&self);

    /// Inject a programmatic event
    fn send(&self, args: &[String]) {
        let _ = args;
        error!("Event producer \"{}\" does not support send().", self.name());
    }
}

pub(crate) fn wrong_registration(producer: &str, registration: &Registration) {
    error!(
        "Event producer \"{}\" cannot accept a {} registration.",
        producer,
        registration.kind()
    );
}
