/*
 *  panels/time.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Time and date panel with optional ghost LCD segments
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

use chrono::{Local, NaiveDateTime};
use log::error;
use serde::Deserialize;
use std::fmt::Write;
use std::rc::Rc;

use super::Panel;
use crate::constants::UNRENDERABLE_TEXT;
use crate::display::{Color, DrawOptions, Viewport, ViewportConfig};
use crate::events::EventDispatcher;

#[derive(Debug, Clone, Deserialize)]
pub struct TimeParams {
    /// strftime format
    pub format: String,
    /// Draw unlit "8" segments behind the digits, LCD fonts only
    #[serde(default)]
    pub ghost_lcd: bool,
}

/// Local wall-clock source
pub type LocalTime = Rc<dyn Fn() -> NaiveDateTime>;

pub struct TimePanel {
    format: String,
    ghost_text: Option<&'static str>,
    now: LocalTime,
    displayed: Option<String>,
}

impl TimePanel {
    pub fn new(format: &str, ghost_lcd: bool) -> Self {
        Self::with_clock(format, ghost_lcd, Rc::new(|| Local::now().naive_local()))
    }

    pub fn from_params(params: TimeParams) -> Self {
        Self::new(&params.format, params.ghost_lcd)
    }

    pub fn with_clock(format: &str, ghost_lcd: bool, now: LocalTime) -> Self {
        let ghost_text = if ghost_lcd { ghost_for(format) } else { None };
        Self {
            format: format.to_string(),
            ghost_text,
            now,
            displayed: None,
        }
    }

    pub fn ghost_text(&self) -> Option<&'static str> {
        self.ghost_text
    }

    fn formatted(&self) -> String {
        let mut text = String::new();
        // an invalid format surfaces as fmt::Error instead of a panic
        if write!(text, "{}", (self.now)().format(&self.format)).is_err() {
            error!("Bad time format \"{}\".", self.format);
            return UNRENDERABLE_TEXT.to_string();
        }
        text
    }
}

fn ghost_for(format: &str) -> Option<&'static str> {
    match format {
        "%H:%M" => Some("88:88"),
        "%S" => Some("88"),
        _ => {
            error!("Unsupported time format {} for LCD ghost effect.", format);
            None
        }
    }
}

impl Panel for TimePanel {
    fn on_initialize(&mut self, _dispatcher: &Rc<EventDispatcher>, _viewport: &Viewport) {}

    fn on_display(&mut self, viewport: &Viewport) {
        let text = self.formatted();
        match self.ghost_text {
            Some(ghost) => {
                viewport.overlay(&ViewportConfig::new().color(Color::GHOST)).text(ghost);
                viewport.text_with(&text, &DrawOptions::default().overwrite());
            }
            None => viewport.text(&text),
        }
        self.displayed = Some(text);
    }

    fn on_check(&mut self) -> bool {
        let text = self.formatted();
        self.displayed.as_deref() != Some(text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::mock::RecordingDisplay;
    use crate::display::Rect;
    use crate::events::{ManualClock, NoButtons};
    use chrono::NaiveDate;
    use std::cell::{Cell, RefCell};

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    fn clock(start: NaiveDateTime) -> (Rc<Cell<NaiveDateTime>>, LocalTime) {
        let cell = Rc::new(Cell::new(start));
        let c = cell.clone();
        (cell, Rc::new(move || c.get()))
    }

    fn setup() -> (Rc<RefCell<RecordingDisplay>>, Rc<EventDispatcher>, Viewport) {
        let dispatcher = Rc::new(EventDispatcher::with_standard_producers(
            Box::new(NoButtons),
            Rc::new(ManualClock::new()),
        ));
        let display = Rc::new(RefCell::new(RecordingDisplay::new(200, 40)));
        let viewport = Viewport::new(display.clone(), &dispatcher, Some(Rect::new(0, 0, 200, 40)));
        (display, dispatcher, viewport)
    }

    #[test]
    fn test_dirty_only_when_text_changes() {
        let (_display, _dispatcher, viewport) = setup();
        let (now, source) = clock(at(12, 0, 5));
        let mut panel = TimePanel::with_clock("%H:%M", false, source);
        assert!(panel.on_check());
        panel.on_display(&viewport);
        assert!(!panel.on_check());

        now.set(at(12, 0, 59));
        assert!(!panel.on_check());
        now.set(at(12, 1, 0));
        assert!(panel.on_check());
        assert!(panel.on_check());
        panel.on_display(&viewport);
        assert!(!panel.on_check());
    }

    #[test]
    fn test_renders_formatted_time() {
        let (display, _dispatcher, viewport) = setup();
        let (_now, source) = clock(at(9, 5, 0));
        let mut panel = TimePanel::with_clock("%H:%M", false, source);
        panel.on_check();
        panel.on_display(&viewport);
        let texts: Vec<String> = display.borrow().rendered_texts().into_iter().map(|(t, _)| t).collect();
        assert_eq!(texts, vec!["09:05"]);
    }

    #[test]
    fn test_forced_render_uses_current_time() {
        let (display, _dispatcher, viewport) = setup();
        let (now, source) = clock(at(9, 5, 0));
        let mut panel = TimePanel::with_clock("%H:%M", false, source);
        assert!(panel.on_check());
        panel.on_display(&viewport);

        // checked at 09:05, then redrawn without a check after the minute rolled
        assert!(!panel.on_check());
        now.set(at(9, 6, 0));
        panel.on_display(&viewport);
        let texts: Vec<String> = display.borrow().rendered_texts().into_iter().map(|(t, _)| t).collect();
        assert_eq!(texts, vec!["09:05", "09:06"]);
        assert!(!panel.on_check());
    }

    #[test]
    fn test_ghost_drawn_under_time() {
        let (display, _dispatcher, viewport) = setup();
        let (_now, source) = clock(at(23, 59, 0));
        let mut panel = TimePanel::with_clock("%H:%M", true, source);
        panel.on_display(&viewport);

        let display = display.borrow();
        let texts = display.rendered_texts();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0].0, "88:88");
        assert_eq!(texts[1].0, "23:59");
        // only the ghost pass clears
        assert_eq!(display.fills().len(), 1);
        let colors: Vec<Color> = display
            .ops()
            .iter()
            .filter_map(|op| match op {
                crate::display::drivers::mock::DrawOp::Text { color, .. } => Some(*color),
                _ => None,
            })
            .collect();
        assert_eq!(colors, vec![Color::GHOST, Color::WHITE]);
    }

    #[test]
    fn test_ghost_formats() {
        assert_eq!(TimePanel::new("%H:%M", true).ghost_text(), Some("88:88"));
        assert_eq!(TimePanel::new("%S", true).ghost_text(), Some("88"));
        assert_eq!(TimePanel::new("%a %d", true).ghost_text(), None);
        assert_eq!(TimePanel::new("%S", false).ghost_text(), None);
    }

    #[test]
    fn test_bad_format_placeholder() {
        let (_now, source) = clock(at(1, 2, 3));
        let panel = TimePanel::with_clock("%Q", false, source);
        assert_eq!(panel.formatted(), UNRENDERABLE_TEXT);
    }
}
