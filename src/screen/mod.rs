/*
 *  screen/mod.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Screens: named viewport/panel blocks and their lifecycle
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

pub mod configured;
pub mod manager;

use log::{debug, info, warn};
use std::cell::RefCell;
use std::rc::Rc;

use crate::constants::PRODUCER_TICK;
use crate::display::Viewport;
use crate::events::{EventDispatcher, EventHandler, Registration};
use crate::panels::Panel;

pub use configured::ConfiguredScreen;
pub use manager::ScreenManager;

/// One viewport bound to one panel
pub struct ScreenBlock {
    pub name: String,
    pub viewport: Viewport,
    pub panel: Box<dyn Panel>,
}

/// Blocks of a screen, names unique, kept in insertion order so renders are
/// deterministic.
#[derive(Default)]
pub struct ScreenBlocks {
    blocks: Vec<ScreenBlock>,
}

impl ScreenBlocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `panel` to `viewport` under `name`, replacing a block of the same
    /// name
    pub fn add(&mut self, name: &str, viewport: Viewport, panel: Box<dyn Panel>) {
        let block = ScreenBlock { name: name.to_string(), viewport, panel };
        match self.blocks.iter_mut().find(|b| b.name == name) {
            Some(existing) => {
                warn!("Replacing duplicate screen block \"{}\".", name);
                *existing = block;
            }
            None => self.blocks.push(block),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ScreenBlock> {
        self.blocks.iter().find(|b| b.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ScreenBlock> {
        self.blocks.iter_mut().find(|b| b.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.blocks.iter().map(|b| b.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ScreenBlock> {
        self.blocks.iter_mut()
    }
}

/// Screen-specific hooks called by `Screen`
pub trait ScreenLayout {
    /// Register screen-wide handlers
    fn on_initialize_events(&mut self, _dispatcher: &Rc<EventDispatcher>) {}

    /// Divide the outer viewport into named blocks
    fn on_initialize_viewports(&mut self, outer: &Viewport, blocks: &mut ScreenBlocks);

    /// Adjust panels once all blocks exist
    fn on_initialize_panels(&mut self, _blocks: &mut ScreenBlocks) {}

    /// Re-apply viewport attributes after a configuration change
    fn on_configure_viewports(&mut self, _blocks: &mut ScreenBlocks) {}
}

/// A full-display page.
///
/// Uninitialized until `initialize`, then active until the next screen
/// switch clears its handlers.
pub struct Screen {
    name: String,
    layout: Box<dyn ScreenLayout>,
    blocks: ScreenBlocks,
}

impl Screen {
    pub fn new(name: &str, layout: Box<dyn ScreenLayout>) -> Self {
        Self { name: name.to_string(), layout, blocks: ScreenBlocks::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn blocks(&self) -> &ScreenBlocks {
        &self.blocks
    }

    /// Build blocks, initialize panels and draw everything once. The screen
    /// redraws changed panels on every tick until the dispatcher is cleared.
    pub fn initialize(screen: &Rc<RefCell<Screen>>, dispatcher: &Rc<EventDispatcher>, outer: &Viewport) {
        let mut this = screen.borrow_mut();
        info!("Initialize screen \"{}\".", this.name);
        this.layout.on_initialize_events(dispatcher);

        let weak = Rc::downgrade(screen);
        dispatcher.register(
            PRODUCER_TICK,
            EventHandler::new(move || {
                let Some(screen) = weak.upgrade() else {
                    return;
                };
                // a render already in progress covers this tick
                if let Ok(mut screen) = screen.try_borrow_mut() {
                    screen.update(true);
                }
            }),
            Registration::Tick,
        );

        let Screen { layout, blocks, .. } = &mut *this;
        *blocks = ScreenBlocks::new();
        layout.on_initialize_viewports(outer, blocks);
        layout.on_initialize_panels(blocks);
        for block in blocks.iter_mut() {
            block.panel.on_initialize(dispatcher, &block.viewport);
        }
        this.update(false);
    }

    /// Re-apply viewport configuration and redraw everything
    pub fn refresh(&mut self) {
        info!("Refresh screen \"{}\".", self.name);
        let Screen { layout, blocks, .. } = &mut *self;
        layout.on_configure_viewports(blocks);
        self.update(false);
    }

    /// Draw panels, only the changed ones when `check` is set
    pub fn update(&mut self, check: bool) {
        for block in self.blocks.iter_mut() {
            if !check || block.panel.on_check() {
                block.panel.on_display(&block.viewport);
            }
        }
    }

    /// Hand a message to the first panel that accepts messages and show it
    /// right away
    pub fn message(&mut self, text: &str, duration: Option<f64>) {
        info!("Message: {}", text);
        let sink = self.blocks.iter_mut().find_map(|block| {
            let shown = block.panel.as_message_sink().map(|sink| sink.set_message(text, duration));
            shown.map(|_| block)
        });
        match sink {
            Some(block) => {
                if block.panel.on_check() {
                    block.panel.on_display(&block.viewport);
                }
            }
            None => debug!("Screen \"{}\" has no message panel.", self.name),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::display::drivers::mock::RecordingDisplay;
    use crate::display::ViewportConfig;
    use crate::events::{ManualClock, NoButtons};
    use crate::panels::{MessagePanel, TextPanel};
    use std::cell::Cell;

    /// Panel counting calls, dirty while `changed` is set
    pub(crate) struct ProbePanel {
        pub displays: Rc<Cell<u32>>,
        pub changed: Rc<Cell<bool>>,
    }

    impl Panel for ProbePanel {
        fn on_initialize(&mut self, _dispatcher: &Rc<EventDispatcher>, _viewport: &Viewport) {}
        fn on_display(&mut self, viewport: &Viewport) {
            self.displays.set(self.displays.get() + 1);
            self.changed.set(false);
            viewport.text("probe");
        }
        fn on_check(&mut self) -> bool {
            self.changed.get()
        }
    }

    struct TwoRows {
        displays: Rc<Cell<u32>>,
        changed: Rc<Cell<bool>>,
        configured: Rc<Cell<u32>>,
    }

    impl ScreenLayout for TwoRows {
        fn on_initialize_viewports(&mut self, outer: &Viewport, blocks: &mut ScreenBlocks) {
            let rows = outer.vsplit(&[200.0, 40.0]);
            let probe = ProbePanel { displays: self.displays.clone(), changed: self.changed.clone() };
            blocks.add("probe", rows[0].clone(), Box::new(probe));
            blocks.add("message", rows[1].clone(), Box::new(MessagePanel::new()));
        }

        fn on_configure_viewports(&mut self, blocks: &mut ScreenBlocks) {
            self.configured.set(self.configured.get() + 1);
            if let Some(block) = blocks.get_mut("probe") {
                block.viewport.configure(&ViewportConfig::new().fx(1.0));
            }
        }
    }

    pub(crate) struct Fixture {
        pub display: Rc<RefCell<RecordingDisplay>>,
        pub dispatcher: Rc<EventDispatcher>,
        pub outer: Viewport,
    }

    impl Fixture {
        pub fn new() -> Self {
            let dispatcher = Rc::new(EventDispatcher::with_standard_producers(
                Box::new(NoButtons),
                Rc::new(ManualClock::new()),
            ));
            let display = Rc::new(RefCell::new(RecordingDisplay::new(320, 240)));
            let outer = Viewport::outer(display.clone(), &dispatcher);
            Self { display, dispatcher, outer }
        }
    }

    fn two_rows() -> (Rc<RefCell<Screen>>, Rc<Cell<u32>>, Rc<Cell<bool>>, Rc<Cell<u32>>) {
        let displays = Rc::new(Cell::new(0));
        let changed = Rc::new(Cell::new(false));
        let configured = Rc::new(Cell::new(0));
        let layout = TwoRows { displays: displays.clone(), changed: changed.clone(), configured: configured.clone() };
        (Rc::new(RefCell::new(Screen::new("main", Box::new(layout)))), displays, changed, configured)
    }

    #[test]
    fn test_initialize_forces_one_render() {
        let fx = Fixture::new();
        let (screen, displays, _changed, _) = two_rows();
        Screen::initialize(&screen, &fx.dispatcher, &fx.outer);
        assert_eq!(displays.get(), 1);
        assert_eq!(screen.borrow().blocks().names(), vec!["probe", "message"]);
    }

    #[test]
    fn test_tick_redraws_only_changed() {
        let fx = Fixture::new();
        let (screen, displays, changed, _) = two_rows();
        Screen::initialize(&screen, &fx.dispatcher, &fx.outer);
        fx.dispatcher.tick();
        assert_eq!(displays.get(), 1);
        changed.set(true);
        fx.dispatcher.tick();
        assert_eq!(displays.get(), 2);
        fx.dispatcher.tick();
        assert_eq!(displays.get(), 2);
    }

    #[test]
    fn test_clear_stops_updates() {
        let fx = Fixture::new();
        let (screen, displays, changed, _) = two_rows();
        Screen::initialize(&screen, &fx.dispatcher, &fx.outer);
        fx.dispatcher.clear();
        changed.set(true);
        fx.dispatcher.tick();
        assert_eq!(displays.get(), 1);
    }

    #[test]
    fn test_dropped_screen_is_ignored_by_tick() {
        let fx = Fixture::new();
        let (screen, displays, changed, _) = two_rows();
        Screen::initialize(&screen, &fx.dispatcher, &fx.outer);
        drop(screen);
        changed.set(true);
        fx.dispatcher.tick();
        assert_eq!(displays.get(), 1);
    }

    #[test]
    fn test_refresh_reconfigures_and_redraws() {
        let fx = Fixture::new();
        let (screen, displays, _changed, configured) = two_rows();
        Screen::initialize(&screen, &fx.dispatcher, &fx.outer);
        screen.borrow_mut().refresh();
        assert_eq!(configured.get(), 1);
        assert_eq!(displays.get(), 2);
        let fx_anchor = screen.borrow().blocks().get("probe").unwrap().viewport.fx();
        assert_eq!(fx_anchor, 1.0);
    }

    #[test]
    fn test_message_goes_to_message_panel() {
        let fx = Fixture::new();
        let (screen, _displays, _changed, _) = two_rows();
        Screen::initialize(&screen, &fx.dispatcher, &fx.outer);
        screen.borrow_mut().message("Exiting...", None);
        let texts = fx.display.borrow().rendered_texts();
        let (text, rect) = texts.last().unwrap();
        assert_eq!(text, "Exiting...");
        assert_eq!(rect.top, 200);
    }

    #[test]
    fn test_duplicate_block_replaced() {
        let fx = Fixture::new();
        let mut blocks = ScreenBlocks::new();
        blocks.add("a", fx.outer.clone(), Box::new(TextPanel::new("one".into())));
        blocks.add("a", fx.outer.clone(), Box::new(TextPanel::new("two".into())));
        assert_eq!(blocks.len(), 1);
        assert!(blocks.get("a").is_some());
    }
}
