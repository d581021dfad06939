/*
 *  panels/message.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Operator message panel
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

use std::rc::Rc;

use super::{MessageSink, Panel};
use crate::display::{DrawOptions, Viewport};
use crate::events::EventDispatcher;

/// Shows whatever was last handed to `set_message`.
///
/// Every `set_message` counts as a change, so repeating the same text after
/// it auto-cleared shows it again.
#[derive(Debug, Default)]
pub struct MessagePanel {
    text: Option<String>,
    duration: Option<f64>,
    dirty: bool,
}

impl MessagePanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

impl MessageSink for MessagePanel {
    fn set_message(&mut self, text: &str, duration: Option<f64>) {
        self.text = Some(text.to_string());
        self.duration = duration;
        self.dirty = true;
    }
}

impl Panel for MessagePanel {
    fn on_initialize(&mut self, _dispatcher: &Rc<EventDispatcher>, _viewport: &Viewport) {}

    fn on_display(&mut self, viewport: &Viewport) {
        if let Some(text) = &self.text {
            let options = DrawOptions { duration: self.duration, ..Default::default() };
            viewport.text_with(text, &options);
        }
        self.dirty = false;
    }

    fn on_check(&mut self) -> bool {
        self.dirty && self.text.is_some()
    }

    fn as_message_sink(&mut self) -> Option<&mut dyn MessageSink> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::mock::RecordingDisplay;
    use crate::display::Rect;
    use crate::events::{ManualClock, NoButtons};
    use std::cell::RefCell;

    fn setup() -> (Rc<RefCell<RecordingDisplay>>, Rc<ManualClock>, Rc<EventDispatcher>, Viewport) {
        let clock = Rc::new(ManualClock::new());
        let dispatcher = Rc::new(EventDispatcher::with_standard_producers(Box::new(NoButtons), clock.clone()));
        let display = Rc::new(RefCell::new(RecordingDisplay::new(200, 20)));
        let viewport = Viewport::new(display.clone(), &dispatcher, Some(Rect::new(0, 0, 200, 20)));
        (display, clock, dispatcher, viewport)
    }

    #[test]
    fn test_empty_panel_is_clean() {
        let (display, _clock, _dispatcher, viewport) = setup();
        let mut panel = MessagePanel::new();
        assert!(!panel.on_check());
        panel.on_display(&viewport);
        assert!(display.borrow().ops().is_empty());
    }

    #[test]
    fn test_dirty_once_per_message() {
        let (display, _clock, _dispatcher, viewport) = setup();
        let mut panel = MessagePanel::new();
        panel.set_message("Exiting...", None);
        assert!(panel.on_check());
        panel.on_display(&viewport);
        assert!(!panel.on_check());
        assert_eq!(display.borrow().rendered_texts()[0].0, "Exiting...");

        panel.set_message("Exiting...", None);
        assert!(panel.on_check());
    }

    #[test]
    fn test_duration_clears_later() {
        let (display, clock, dispatcher, viewport) = setup();
        let mut panel = MessagePanel::new();
        panel.set_message("hello", Some(2.0));
        panel.on_display(&viewport);
        let fills = display.borrow().fills().len();

        clock.advance_secs(1.0);
        dispatcher.tick();
        assert_eq!(display.borrow().fills().len(), fills);

        clock.advance_secs(1.5);
        dispatcher.tick();
        assert_eq!(display.borrow().fills().len(), fills + 1);
    }
}
