/*
 *  events/button.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Button event producer
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
use std::cell::RefCell;

use super::{EventHandler, EventProducer, Registration, wrong_registration};

/// Hardware capability reporting which buttons are held down
pub trait ButtonDevice {
    fn button_count(&self) -> usize;

    /// 0-based indexes of the buttons currently pressed
    fn pressed_buttons(&self) -> Vec<usize>;
}

/// Device without buttons
#[derive(Debug, Default, Clone, Copy)]
pub struct NoButtons;

impl ButtonDevice for NoButtons {
    fn button_count(&self) -> usize {
        0
    }

    fn pressed_buttons(&self) -> Vec<usize> {
        Vec::new()
    }
}

/// One handler slot per button, last registration wins.
///
/// Every tick re-fires the handler of each held button, there is no edge
/// detection.
pub struct ButtonEvents {
    device: Box<dyn ButtonDevice>,
    handlers: RefCell<Vec<Option<EventHandler>>>,
}

impl ButtonEvents {
    pub fn new(device: Box<dyn ButtonDevice>) -> Self {
        let count = device.button_count();
        Self {
            device,
            handlers: RefCell::new(vec![None; count]),
        }
    }

    pub fn button_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// True if the 1-based button index has a handler
    pub fn is_bound(&self, index: usize) -> bool {
        index >= 1 && matches!(self.handlers.borrow().get(index - 1), Some(Some(_)))
    }
}

impl EventProducer for ButtonEvents {
    fn name(&self) -> &'static str {
        "button"
    }

    fn register(&self, handler: EventHandler, registration: Registration) {
        let Registration::Button(index) = registration else {
            wrong_registration(self.name(), &registration);
            return;
        };
        let mut handlers = self.handlers.borrow_mut();
        if index < 1 || index > handlers.len() {
            error!(
                "Bad button index {} (expect 1-{}).",
                index,
                handlers.len()
            );
            return;
        }
        handlers[index - 1] = Some(handler);
    }

    fn tick(&self) {
        for pressed in self.device.pressed_buttons() {
            // clone out of the borrow, the handler may re-register buttons
            let handler = self.handlers.borrow().get(pressed).cloned().flatten();
            if let Some(handler) = handler {
                handler.invoke(self.name(), &[]);
            }
        }
    }

    fn clear(&self) {
        for slot in self.handlers.borrow_mut().iter_mut() {
            if slot.as_ref().is_some_and(|h| !h.is_permanent()) {
                *slot = None;
            }
        }
    }
}
