/*
 *  panels/text.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Static text panel
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

use serde::Deserialize;
use std::rc::Rc;

use super::Panel;
use crate::display::Viewport;
use crate::events::EventDispatcher;

#[derive(Debug, Clone, Deserialize)]
pub struct TextParams {
    pub text: String,
}

/// Fixed label, drawn once per forced update
#[derive(Debug)]
pub struct TextPanel {
    text: String,
    shown: bool,
}

impl TextPanel {
    pub fn new(text: String) -> Self {
        Self { text, shown: false }
    }
}

impl Panel for TextPanel {
    fn on_initialize(&mut self, _dispatcher: &Rc<EventDispatcher>, _viewport: &Viewport) {}

    fn on_display(&mut self, viewport: &Viewport) {
        viewport.text(&self.text);
        self.shown = true;
    }

    fn on_check(&mut self) -> bool {
        !self.shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::mock::RecordingDisplay;
    use crate::display::Rect;
    use crate::events::{ManualClock, NoButtons};
    use std::cell::RefCell;

    #[test]
    fn test_dirty_until_shown() {
        let dispatcher = Rc::new(EventDispatcher::with_standard_producers(
            Box::new(NoButtons),
            Rc::new(ManualClock::new()),
        ));
        let display = Rc::new(RefCell::new(RecordingDisplay::new(100, 20)));
        let viewport = Viewport::new(display.clone(), &dispatcher, Some(Rect::new(0, 0, 100, 20)));
        let mut panel = TextPanel::new("Weather".into());
        assert!(panel.on_check());
        panel.on_display(&viewport);
        assert!(!panel.on_check());
        assert_eq!(display.borrow().rendered_texts().len(), 1);
    }
}
