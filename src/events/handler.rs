/*
 *  events/handler.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Event handlers and producer registration keys
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

use log::error;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::Duration;

type HandlerFn = Rc<dyn Fn(&[String])>;

/// A callable plus its lifetime scope.
///
/// Permanent handlers survive screen switches. Everything else is dropped by
/// the next `clear()`.
#[derive(Clone)]
pub struct EventHandler {
    function: HandlerFn,
    permanent: bool,
}

impl EventHandler {
    /// Handler that ignores any event arguments
    pub fn new<F>(function: F) -> Self
    where
        F: Fn() + 'static,
    {
        Self::with_args(move |_| function())
    }

    /// Handler receiving the arguments carried by the event (trigger sends)
    pub fn with_args<F>(function: F) -> Self
    where
        F: Fn(&[String]) + 'static,
    {
        Self { function: Rc::new(function), permanent: false }
    }

    pub fn permanent(mut self) -> Self {
        self.permanent = true;
        self
    }

    pub fn set_permanent(&mut self, permanent: bool) {
        self.permanent = permanent;
    }

    pub fn is_permanent(&self) -> bool {
        self.permanent
    }

    /// Run the handler. A panic inside it is logged and swallowed so one bad
    /// handler cannot take down the loop. Returns false if it panicked.
    pub fn invoke(&self, producer: &str, args: &[String]) -> bool {
        let function = &self.function;
        match panic::catch_unwind(AssertUnwindSafe(|| function(args))) {
            Ok(()) => true,
            Err(payload) => {
                error!(
                    "Event handler for producer \"{}\" failed: {}",
                    producer,
                    panic_message(payload.as_ref())
                );
                false
            }
        }
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandler")
            .field("permanent", &self.permanent)
            .finish_non_exhaustive()
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Producer specific registration arguments.
///
/// Each producer only accepts its own variant; a mismatch is logged and
/// ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    /// 1-based button index
    Button(usize),
    /// Fire every `interval`, at most `max_count` times
    Timer { interval: Duration, max_count: Option<u32> },
    /// Fire on every tick
    Tick,
    /// Fire when the named trigger is sent
    Trigger(String),
}

impl Registration {
    /// Repeating timer, interval in seconds
    pub fn timer(secs: f64) -> Self {
        Registration::Timer { interval: seconds(secs), max_count: None }
    }

    /// Timer that fires `count` times
    pub fn timer_counted(secs: f64, count: u32) -> Self {
        Registration::Timer { interval: seconds(secs), max_count: Some(count) }
    }

    pub fn timer_once(secs: f64) -> Self {
        Self::timer_counted(secs, 1)
    }

    pub fn trigger(name: impl Into<String>) -> Self {
        Registration::Trigger(name.into())
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Registration::Button(_) => "button",
            Registration::Timer { .. } => "timer",
            Registration::Tick => "tick",
            Registration::Trigger(_) => "trigger",
        }
    }
}

/// Seconds to a Duration, negative and NaN collapse to zero, values too large
/// for a Duration saturate
pub fn seconds(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
}
