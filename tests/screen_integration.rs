/*
 *  tests/screen_integration.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  End to end screen rendering through the public API
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
use std::rc::Rc;

use lyclock::display::{Rect, RecordingDisplay, Viewport, ViewportConfig};
use lyclock::events::{EventDispatcher, EventHandler, ManualClock, NoButtons, Registration};
use lyclock::panels::TextPanel;
use lyclock::screen::{Screen, ScreenBlocks, ScreenLayout, ScreenManager};

struct Clock12 {
    label: &'static str,
}

impl ScreenLayout for Clock12 {
    fn on_initialize_viewports(&mut self, outer: &Viewport, blocks: &mut ScreenBlocks) {
        let mut parts = outer.vsplit(&[200.0]);
        let mut top = parts.remove(0);
        top.configure(&ViewportConfig::new().fx(0.5).fy(0.5).font_size(40));
        blocks.add("time", top, Box::new(TextPanel::new(self.label.to_string())));
    }
}

fn setup() -> (Rc<RefCell<RecordingDisplay>>, Rc<EventDispatcher>, Viewport) {
    let dispatcher = Rc::new(EventDispatcher::with_standard_producers(
        Box::new(NoButtons),
        Rc::new(ManualClock::new()),
    ));
    let display = Rc::new(RefCell::new(RecordingDisplay::new(320, 240)));
    let outer = Viewport::outer(display.clone(), &dispatcher);
    (display, dispatcher, outer)
}

#[test]
fn test_single_centered_render() {
    let (display, dispatcher, outer) = setup();
    let screen = Rc::new(RefCell::new(Screen::new("main", Box::new(Clock12 { label: "12:00" }))));
    Screen::initialize(&screen, &dispatcher, &outer);

    // 5 chars at size 40 measure 100x40, centered in 320x200
    let texts = display.borrow().rendered_texts();
    assert_eq!(texts, vec![("12:00".to_string(), Rect::new(110, 80, 100, 40))]);

    // nothing changed, ticks draw nothing more
    dispatcher.tick();
    dispatcher.tick();
    assert_eq!(display.borrow().rendered_texts().len(), 1);
}

#[test]
fn test_switch_through_trigger() {
    let (display, dispatcher, outer) = setup();
    let manager = Rc::new(RefCell::new(ScreenManager::new(dispatcher.clone(), outer)));
    manager.borrow_mut().add_screen("a", || Box::new(Clock12 { label: "A" }));
    manager.borrow_mut().add_screen("b", || Box::new(Clock12 { label: "B" }));

    let m = manager.clone();
    dispatcher.register(
        "trigger",
        EventHandler::with_args(move |args| m.borrow_mut().show_screen(&args[0])).permanent(),
        Registration::trigger("screen"),
    );
    manager.borrow_mut().show_screen("a");

    dispatcher.send("trigger", &["screen", "b"]);
    assert_eq!(manager.borrow().current(), Some("a"));
    dispatcher.tick();
    assert_eq!(manager.borrow().current(), Some("b"));

    let texts: Vec<String> = display.borrow().rendered_texts().into_iter().map(|(t, _)| t).collect();
    assert_eq!(texts, vec!["A", "B"]);

    // the switch handler is permanent and keeps working
    dispatcher.send("trigger", &["screen", "a"]);
    dispatcher.tick();
    assert_eq!(manager.borrow().current(), Some("a"));
}

#[test]
fn test_clear_keeps_permanent_handlers() {
    let (_display, dispatcher, _outer) = setup();
    let temporary = Rc::new(Cell::new(0));
    let permanent = Rc::new(Cell::new(0));

    let t = temporary.clone();
    dispatcher.register_fn("timer", Registration::timer(0.0), false, move || t.set(t.get() + 1));
    let p = permanent.clone();
    dispatcher.register_fn("tick", Registration::Tick, true, move || p.set(p.get() + 1));
    let t = temporary.clone();
    dispatcher.register_fn("tick", Registration::Tick, false, move || t.set(t.get() + 1));

    dispatcher.clear();
    dispatcher.tick();
    dispatcher.tick();
    assert_eq!(temporary.get(), 0);
    assert_eq!(permanent.get(), 2);
}

#[test]
fn test_null_viewport_draws_nothing() {
    let (display, dispatcher, outer) = setup();
    let parts = outer.vsplit(&[200.0, 100.0]);
    assert!(parts[1].is_null());
    parts[1].text("hidden");
    parts[1].clear();
    assert!(display.borrow().ops().is_empty());
    let _ = dispatcher;
}
