/*
 *  controller.rs
 *
 *  LyClock - time and weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Producer wiring, permanent bindings and the poll loop
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

use log::{error, info};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tokio::signal::unix::{signal, SignalKind};

use crate::config::{ConfigWatcher, SharedConfig};
use crate::constants::{
    EXIT_MESSAGE_PAUSE, PRODUCER_BUTTON, PRODUCER_TIMER, PRODUCER_TRIGGER, TRIGGER_SCREEN,
};
use crate::display::{SharedDisplay, Viewport};
use crate::events::{seconds, ButtonDevice, Clock, EventDispatcher, EventHandler, Registration};
use crate::panels::PanelRegistry;
use crate::screen::{ConfiguredScreen, ScreenManager};

/// Why the main loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitRequest {
    Quit,
    PowerOff,
}

/// Owns the dispatcher and screens, binds buttons, triggers and the config
/// reload timer, and runs the poll loop.
pub struct MainController {
    dispatcher: Rc<EventDispatcher>,
    screens: Rc<RefCell<ScreenManager>>,
    config: SharedConfig,
    exit: Rc<Cell<Option<ExitRequest>>>,
}

impl MainController {
    pub fn new(
        watcher: ConfigWatcher,
        display: SharedDisplay,
        buttons: Box<dyn ButtonDevice>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let dispatcher = Rc::new(EventDispatcher::with_standard_producers(buttons, clock));
        let outer = Viewport::outer(display, &dispatcher);
        let config = watcher.config();
        let screens = Rc::new(RefCell::new(ScreenManager::new(dispatcher.clone(), outer)));
        let controller = Self {
            dispatcher,
            screens,
            config,
            exit: Rc::new(Cell::new(None)),
        };
        let registry = Rc::new(PanelRegistry::with_defaults());
        add_configured_screens(&controller.screens, &controller.config, &registry);
        controller.bind_config_updates(watcher, registry);
        controller.bind_screen_trigger();
        controller.bind_buttons();
        controller
    }

    pub fn dispatcher(&self) -> &Rc<EventDispatcher> {
        &self.dispatcher
    }

    pub fn screens(&self) -> &Rc<RefCell<ScreenManager>> {
        &self.screens
    }

    /// Name of the active screen
    pub fn current_screen(&self) -> Option<String> {
        self.screens.borrow().current().map(str::to_string)
    }

    pub fn exit_request(&self) -> Option<ExitRequest> {
        self.exit.get()
    }

    fn bind_config_updates(&self, watcher: ConfigWatcher, registry: Rc<PanelRegistry>) {
        let interval = self.config.borrow().update_interval();
        let watcher = RefCell::new(watcher);
        let (screens, config) = (self.screens.clone(), self.config.clone());
        self.dispatcher.register(
            PRODUCER_TIMER,
            EventHandler::new(move || {
                if watcher.borrow_mut().update() {
                    add_configured_screens(&screens, &config, &registry);
                    screens.borrow().force_refresh();
                }
            })
            .permanent(),
            Registration::timer(interval),
        );
    }

    fn bind_screen_trigger(&self) {
        let screens = self.screens.clone();
        self.dispatcher.register(
            PRODUCER_TRIGGER,
            EventHandler::with_args(move |args| match args.first() {
                Some(name) => screens.borrow_mut().show_screen(name),
                None => error!("Trigger \"{}\" needs a screen name.", TRIGGER_SCREEN),
            })
            .permanent(),
            Registration::trigger(TRIGGER_SCREEN),
        );
    }

    fn bind_buttons(&self) {
        let buttons = self.config.borrow().buttons();
        if let Some(index) = buttons.quit {
            self.bind_exit(index, ExitRequest::Quit, "Exiting...");
        }
        if let Some(index) = buttons.poweroff {
            self.bind_exit(index, ExitRequest::PowerOff, "Powering off...");
        }
        for (index, name) in buttons.screens {
            let dispatcher = Rc::downgrade(&self.dispatcher);
            self.dispatcher.register(
                PRODUCER_BUTTON,
                EventHandler::new(move || {
                    if let Some(dispatcher) = dispatcher.upgrade() {
                        dispatcher.send(PRODUCER_TRIGGER, &[TRIGGER_SCREEN, name.as_str()]);
                    }
                })
                .permanent(),
                Registration::Button(index),
            );
        }
    }

    fn bind_exit(&self, index: usize, request: ExitRequest, message: &'static str) {
        let (screens, exit) = (self.screens.clone(), self.exit.clone());
        self.dispatcher.register(
            PRODUCER_BUTTON,
            EventHandler::new(move || {
                if exit.get().is_none() {
                    screens.borrow().message(message, None);
                    exit.set(Some(request));
                }
            })
            .permanent(),
            Registration::Button(index),
        );
    }

    /// Show `screen`, else the configured initial screen
    pub fn start(&self, screen: Option<&str>) {
        let name = match screen {
            Some(name) => Some(name.to_string()),
            None => self.config.borrow().initial_screen().map(str::to_string),
        };
        match name {
            Some(name) => self.screens.borrow_mut().show_screen(&name),
            None => error!("No screen to show."),
        }
    }

    /// One pass over every producer
    pub fn tick(&self) -> Option<ExitRequest> {
        self.dispatcher.tick();
        self.exit.get()
    }

    /// Poll until a button asks to stop or a termination signal arrives
    pub async fn run(&self, screen: Option<&str>) -> ExitRequest {
        self.start(screen);
        let poll = seconds(self.config.borrow().poll_interval());
        tokio::select! {
            request = async {
                loop {
                    if let Some(request) = self.tick() {
                        break request;
                    }
                    tokio::time::sleep(poll).await;
                }
            } => {
                // leave the exit message up for a moment
                tokio::time::sleep(EXIT_MESSAGE_PAUSE).await;
                request
            }
            result = signal_handler() => {
                if let Err(e) = result {
                    error!("Signal handler failed: {}", e);
                }
                ExitRequest::Quit
            }
        }
    }
}

/// Register a factory for each configured screen not yet known
fn add_configured_screens(screens: &Rc<RefCell<ScreenManager>>, config: &SharedConfig, registry: &Rc<PanelRegistry>) {
    let names: Vec<String> = config.borrow().screens.iter().map(|s| s.name.clone()).collect();
    let mut screens = screens.borrow_mut();
    for name in names {
        if screens.has_screen(&name) {
            continue;
        }
        let (config, registry, screen) = (config.clone(), registry.clone(), name.clone());
        screens.add_screen(&name, move || {
            Box::new(ConfiguredScreen::new(&screen, config.clone(), registry.clone()))
        });
    }
}

/// Waits for SIGINT, SIGTERM or SIGHUP
async fn signal_handler() -> Result<(), std::io::Error> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

/// Ask the system to power off
pub async fn power_off() -> Result<(), std::io::Error> {
    info!("Powering off.");
    let status = tokio::process::Command::new("sudo").arg("poweroff").status().await?;
    if !status.success() {
        error!("poweroff exited with {}.", status);
    }
    Ok(())
}
