/*
 *  screen/manager.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Named screen factories and screen switching
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

use log::{debug, error, info};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::display::Viewport;
use crate::events::EventDispatcher;
use super::{Screen, ScreenLayout};

/// Builds a fresh layout each time its screen is shown
pub type ScreenFactory = Box<dyn Fn() -> Box<dyn ScreenLayout>>;

/// Owns the screen factories and the single active screen.
///
/// Switching always goes through `dispatcher.clear()`, so handlers
/// registered by the previous screen and its panels never outlive it.
pub struct ScreenManager {
    dispatcher: Rc<EventDispatcher>,
    outer: Viewport,
    factories: HashMap<String, ScreenFactory>,
    current: Option<(String, Rc<RefCell<Screen>>)>,
}

impl ScreenManager {
    pub fn new(dispatcher: Rc<EventDispatcher>, outer: Viewport) -> Self {
        Self { dispatcher, outer, factories: HashMap::new(), current: None }
    }

    pub fn add_screen<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn ScreenLayout> + 'static,
    {
        debug!("Add screen \"{}\".", name);
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    pub fn has_screen(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn screen_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Name of the active screen
    pub fn current(&self) -> Option<&str> {
        self.current.as_ref().map(|(name, _)| name.as_str())
    }

    pub fn current_screen(&self) -> Option<Rc<RefCell<Screen>>> {
        self.current.as_ref().map(|(_, screen)| screen.clone())
    }

    /// Switch to `name`. Showing the active screen again does nothing; an
    /// unknown name leaves no screen active.
    pub fn show_screen(&mut self, name: &str) {
        if self.current() == Some(name) {
            debug!("Screen \"{}\" already shown.", name);
            return;
        }
        self.dispatcher.clear();
        self.current = None;

        let Some(factory) = self.factories.get(name) else {
            error!("Unknown screen \"{}\".", name);
            return;
        };
        info!("Show screen \"{}\".", name);
        self.outer.clear();
        let screen = Rc::new(RefCell::new(Screen::new(name, factory())));
        Screen::initialize(&screen, &self.dispatcher, &self.outer);
        self.current = Some((name.to_string(), screen));
    }

    /// Re-apply configuration to the active screen and redraw it
    pub fn force_refresh(&self) {
        if let Some((_, screen)) = &self.current {
            match screen.try_borrow_mut() {
                Ok(mut screen) => screen.refresh(),
                Err(_) => error!("Screen busy, refresh skipped."),
            }
        }
    }

    /// Show `text` on the active screen's message panel
    pub fn message(&self, text: &str, duration: Option<f64>) {
        match &self.current {
            Some((_, screen)) => match screen.try_borrow_mut() {
                Ok(mut screen) => screen.message(text, duration),
                Err(_) => error!("Screen busy, message \"{}\" dropped.", text),
            },
            None => info!("Message: {}", text),
        }
    }
}

impl fmt::Debug for ScreenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScreenManager")
            .field("screens", &self.screen_names())
            .field("current", &self.current())
            .finish()
    }
}
